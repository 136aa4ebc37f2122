//! HTML helpers for Telegram messages (parse mode HTML everywhere).

use crate::domain::{RuleKind, Section, UserId};

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Human label for the request category shown to admins.
pub fn request_label(section: Section, kind: RuleKind) -> &'static str {
    match (section, kind) {
        (Section::Group, RuleKind::Call) => "ادمین کال گروه",
        (Section::Group, _) => "ادمین چت گروه",
        (Section::Bots, _) => "ربات‌ها",
        (Section::Vserv, _) => "خدمات مجازی",
    }
}

/// `@username` when known, otherwise a fallback marker.
pub fn mention(username: Option<&str>) -> String {
    match username {
        Some(u) if !u.trim().is_empty() => format!("@{}", escape_html(u.trim())),
        _ => "No Username".to_string(),
    }
}

/// Card that precedes a user's request when it is relayed to admins.
///
/// `text` is the user's message (escaped here); `None` for media-only requests.
pub fn format_request(
    section: Section,
    kind: RuleKind,
    user_id: UserId,
    username: Option<&str>,
    text: Option<&str>,
) -> String {
    let mut out = format!(
        "📥 درخواست ({})\n👤 از طرف: {}\n🆔 ID: <code>{}</code>",
        request_label(section, kind),
        mention(username),
        user_id.0
    );
    if let Some(t) = text {
        out.push_str("\n\n📝 پیام:\n");
        out.push_str(&escape_html(t));
    }
    out.push_str(&format!("\n\n↩️ پاسخ: /reply {}", user_id.0));
    out
}

/// One bullet line per group (escaped name, id) for `/listgroups`.
pub fn format_group_list(groups: &[(i64, String)]) -> String {
    groups
        .iter()
        .map(|(id, name)| format!("• {} — <code>{id}</code>", escape_html(name)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn request_card_escapes_user_text_and_carries_reply_hint() {
        let card = format_request(
            Section::Group,
            RuleKind::Call,
            UserId(77),
            Some("alice"),
            Some("<b>hi</b>"),
        );
        assert!(card.contains("ادمین کال گروه"));
        assert!(card.contains("@alice"));
        assert!(card.contains("<code>77</code>"));
        assert!(card.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(card.ends_with("/reply 77"));
    }

    #[test]
    fn media_only_request_has_no_message_block() {
        let card = format_request(Section::Bots, RuleKind::General, UserId(1), None, None);
        assert!(card.contains("No Username"));
        assert!(!card.contains("📝"));
    }

    #[test]
    fn group_list_lines() {
        let out = format_group_list(&[(-100, "A&B".to_string()), (-200, "c".to_string())]);
        assert_eq!(out, "• A&amp;B — <code>-100</code>\n• c — <code>-200</code>");
    }
}
