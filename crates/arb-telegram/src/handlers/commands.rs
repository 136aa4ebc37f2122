use std::sync::Arc;

use teloxide::prelude::*;

use arb_core::{
    dialogue::DialogueState,
    domain::{ChatId, RuleKind, Section, UserId},
    formatting::format_group_list,
    menu,
    texts,
};

use crate::router::AppState;

use super::{profile_of, user_id_of};

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Single numeric id argument (negative ids are group chats, never users).
fn parse_user_id(arg: &str) -> Option<UserId> {
    let arg = arg.trim();
    if arg.is_empty() || !arg.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    arg.parse::<i64>().ok().map(UserId)
}

fn parse_rules_target(arg: &str) -> Option<(Section, RuleKind)> {
    let parts: Vec<&str> = arg.split_whitespace().collect();
    let [section, kind] = parts.as_slice() else {
        return None;
    };
    Some((Section::parse(section).ok()?, RuleKind::parse(kind).ok()?))
}

const ADMIN_COMMANDS: &[&str] = &[
    "broadcast",
    "groupsend",
    "listgroups",
    "stats",
    "addadmin",
    "deladmin",
    "block",
    "unblock",
    "reply",
    "setrules",
    "setchat",
    "setcall",
    "setvserv",
];

async fn require_admin(state: &AppState, user: UserId) -> bool {
    match state.store().is_admin(user).await {
        Ok(true) => true,
        Ok(false) => {
            state.relay.notify(user.into(), texts::ADMIN_ONLY).await;
            false
        }
        Err(e) => {
            tracing::warn!(user_id = user.0, error = %e, "admin lookup failed");
            state.relay.notify(user.into(), texts::STORE_ERROR).await;
            false
        }
    }
}

async fn show_main_menu(state: &AppState, chat: ChatId, html: &str) {
    if let Err(e) = state
        .relay
        .messenger
        .send_inline_keyboard(chat, html, menu::main_menu_kb())
        .await
    {
        tracing::warn!(chat_id = chat.0, error = %e, "failed to send main menu");
    }
}

async fn enter(state: &AppState, user: UserId, next: DialogueState, prompt: &str) {
    state.dialogues.set(user, next).await;
    state.relay.notify(user.into(), prompt).await;
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let user = user_id_of(from);
    let chat = ChatId::from(user);
    let (cmd, arg) = parse_command(text);

    if ADMIN_COMMANDS.contains(&cmd.as_str()) && !require_admin(&state, user).await {
        return Ok(());
    }

    match cmd.as_str() {
        "start" => {
            if let Err(e) = state.store().upsert_user(profile_of(from)).await {
                tracing::warn!(user_id = user.0, error = %e, "failed to store user");
            }
            if matches!(state.store().is_blocked(user).await, Ok(true)) {
                state.relay.notify(chat, texts::BLOCKED).await;
                return Ok(());
            }
            state.dialogues.clear(user).await;
            show_main_menu(&state, chat, texts::WELCOME).await;
        }

        "menu" => {
            state.dialogues.clear(user).await;
            show_main_menu(&state, chat, texts::MAIN_MENU).await;
        }

        "help" => state.relay.notify(chat, texts::HELP).await,

        "cancel" => {
            state.dialogues.clear(user).await;
            state.relay.notify(chat, texts::CANCELLED).await;
        }

        "broadcast" => {
            enter(
                &state,
                user,
                DialogueState::BroadcastUsers,
                texts::ASK_BROADCAST_USERS,
            )
            .await
        }

        "groupsend" => {
            enter(
                &state,
                user,
                DialogueState::BroadcastGroups,
                texts::ASK_BROADCAST_GROUPS,
            )
            .await
        }

        "listgroups" => {
            let limit = state.cfg.list_groups_limit;
            let body = match state.store().list_groups(limit).await {
                Ok(rows) if rows.is_empty() => texts::NO_GROUPS.to_string(),
                Ok(rows) => format!(
                    "{}\n{}",
                    texts::groups_header(limit),
                    format_group_list(&rows)
                ),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to list groups");
                    texts::STORE_ERROR.to_string()
                }
            };
            state.relay.notify(chat, &body).await;
        }

        "stats" => {
            let body = match state.store().stats().await {
                Ok(s) => texts::stats(s.users, s.active_groups),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stats");
                    texts::STORE_ERROR.to_string()
                }
            };
            state.relay.notify(chat, &body).await;
        }

        "addadmin" | "deladmin" | "block" | "unblock" => {
            let Some(target) = parse_user_id(&arg) else {
                let usage = texts::usage(&cmd, "&lt;user_id&gt;");
                state.relay.notify(chat, &usage).await;
                return Ok(());
            };

            let store = state.store();
            let (result, done) = match cmd.as_str() {
                "addadmin" => (
                    store.set_admin(target, true).await,
                    texts::admin_added(target.0),
                ),
                "deladmin" => (
                    store.set_admin(target, false).await,
                    texts::admin_removed(target.0),
                ),
                "block" => (
                    store.set_blocked(target, true).await,
                    texts::user_blocked(target.0),
                ),
                _ => (
                    store.set_blocked(target, false).await,
                    texts::user_unblocked(target.0),
                ),
            };
            let body = match result {
                Ok(()) => {
                    tracing::info!(
                        admin = user.0,
                        target_user = target.0,
                        command = %cmd,
                        "user updated"
                    );
                    done
                }
                Err(e) => {
                    tracing::warn!(error = %e, command = %cmd, "user update failed");
                    texts::STORE_ERROR.to_string()
                }
            };
            state.relay.notify(chat, &body).await;
        }

        "reply" => {
            let Some(target) = parse_user_id(&arg) else {
                let usage = texts::usage("reply", "&lt;user_id&gt;");
                state.relay.notify(chat, &usage).await;
                return Ok(());
            };
            let prompt = texts::ask_reply(target.0);
            enter(&state, user, DialogueState::AdminReply { target }, &prompt).await;
        }

        "setrules" => {
            let Some((section, kind)) = parse_rules_target(&arg) else {
                let usage = texts::usage(
                    "setrules",
                    "&lt;group|bots|vserv&gt; &lt;chat|call|general&gt;",
                );
                state.relay.notify(chat, &usage).await;
                return Ok(());
            };
            let prompt = texts::ask_rules(section.as_str(), kind.as_str());
            enter(&state, user, DialogueState::SetRules { section, kind }, &prompt).await;
        }

        "setchat" | "setcall" | "setvserv" => {
            let (section, kind) = match cmd.as_str() {
                "setchat" => (Section::Group, RuleKind::Chat),
                "setcall" => (Section::Group, RuleKind::Call),
                _ => (Section::Vserv, RuleKind::General),
            };
            let prompt = texts::ask_rules(section.as_str(), kind.as_str());
            enter(&state, user, DialogueState::SetRules { section, kind }, &prompt).await;
        }

        _ => {
            tracing::debug!(user_id = user.0, command = %cmd, "ignoring unknown command");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_mention_and_splits_args() {
        assert_eq!(
            parse_command("/Reply@relay_bot  42 "),
            ("reply".to_string(), "42".to_string())
        );
        assert_eq!(parse_command("/menu"), ("menu".to_string(), String::new()));
    }

    #[test]
    fn user_id_must_be_plain_digits() {
        assert_eq!(parse_user_id(" 123 "), Some(UserId(123)));
        assert_eq!(parse_user_id(""), None);
        assert_eq!(parse_user_id("-5"), None);
        assert_eq!(parse_user_id("12 34"), None);
        assert_eq!(parse_user_id("abc"), None);
    }

    #[test]
    fn rules_target_needs_exactly_two_known_words() {
        assert_eq!(
            parse_rules_target("group call"),
            Some((Section::Group, RuleKind::Call))
        );
        assert_eq!(
            parse_rules_target("VSERV general"),
            Some((Section::Vserv, RuleKind::General))
        );
        assert_eq!(parse_rules_target("group"), None);
        assert_eq!(parse_rules_target("admins chat"), None);
        assert_eq!(parse_rules_target("group chat extra"), None);
    }

    #[test]
    fn every_admin_command_is_listed_in_help() {
        for cmd in ADMIN_COMMANDS {
            assert!(texts::HELP.contains(&format!("/{cmd}")), "{cmd} missing from help");
        }
    }
}
