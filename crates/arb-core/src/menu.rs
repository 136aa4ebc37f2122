//! Menu tree and its callback-data codec.
//!
//! Callback data is `|`-separated: `main|menu`, `sec|<section>`, `gsub|<kind>`,
//! `gact|send|<section>|<kind>`, `gact|cancel|<section>|<kind>`, `again|start`.

use crate::{
    domain::{RuleKind, Section},
    messaging::types::{InlineButton, InlineKeyboard},
    texts,
};

const CB_MAIN: &str = "main";
const CB_SECTION: &str = "sec";
const CB_GSUB: &str = "gsub";
const CB_GACTION: &str = "gact";
const CB_SEND_AGAIN: &str = "again";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    MainMenu,
    Section(Section),
    GroupSub(RuleKind),
    Send(Section, RuleKind),
    Cancel(Section, RuleKind),
    SendAgain,
}

impl MenuAction {
    /// `None` for data this bot never produced (stale keyboards, other bots).
    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split('|').collect();
        match parts.as_slice() {
            [CB_MAIN, "menu"] => Some(MenuAction::MainMenu),
            [CB_SECTION, section] => Section::parse(section).ok().map(MenuAction::Section),
            [CB_GSUB, kind] => match RuleKind::parse(kind).ok()? {
                RuleKind::General => None,
                k => Some(MenuAction::GroupSub(k)),
            },
            [CB_GACTION, action, section, kind] => {
                let section = Section::parse(section).ok()?;
                let kind = RuleKind::parse(kind).ok()?;
                match *action {
                    "send" => Some(MenuAction::Send(section, kind)),
                    "cancel" => Some(MenuAction::Cancel(section, kind)),
                    _ => None,
                }
            }
            [CB_SEND_AGAIN, "start"] => Some(MenuAction::SendAgain),
            _ => None,
        }
    }

    pub fn encode(self) -> String {
        match self {
            MenuAction::MainMenu => format!("{CB_MAIN}|menu"),
            MenuAction::Section(s) => format!("{CB_SECTION}|{}", s.as_str()),
            MenuAction::GroupSub(k) => format!("{CB_GSUB}|{}", k.as_str()),
            MenuAction::Send(s, k) => format!("{CB_GACTION}|send|{}|{}", s.as_str(), k.as_str()),
            MenuAction::Cancel(s, k) => {
                format!("{CB_GACTION}|cancel|{}|{}", s.as_str(), k.as_str())
            }
            MenuAction::SendAgain => format!("{CB_SEND_AGAIN}|start"),
        }
    }
}

/// Which rules a section shows directly (group asks for chat/call first).
pub fn section_rules_kind(section: Section) -> Option<RuleKind> {
    match section {
        Section::Group => None,
        Section::Bots | Section::Vserv => Some(RuleKind::General),
    }
}

fn button(label: &str, action: MenuAction) -> InlineButton {
    InlineButton::callback(label, action.encode())
}

pub fn main_menu_kb() -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![
        button(texts::BTN_SECTION_GROUP, MenuAction::Section(Section::Group)),
        button(texts::BTN_SECTION_BOTS, MenuAction::Section(Section::Bots)),
        button(texts::BTN_SECTION_VSERV, MenuAction::Section(Section::Vserv)),
    ])
}

pub fn group_submenu_kb() -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![
        button(texts::BTN_GROUP_ADMIN_CHAT, MenuAction::GroupSub(RuleKind::Chat)),
        button(texts::BTN_GROUP_ADMIN_CALL, MenuAction::GroupSub(RuleKind::Call)),
        button(texts::BTN_BACK, MenuAction::MainMenu),
    ])
}

pub fn after_rules_kb(section: Section, kind: RuleKind) -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![
        button(texts::BTN_SEND_REQUEST, MenuAction::Send(section, kind)),
        button(texts::BTN_CANCEL, MenuAction::Cancel(section, kind)),
    ])
}

pub fn send_again_kb() -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![button(texts::BTN_SEND_AGAIN, MenuAction::SendAgain)])
}

/// Deep link into the bot's private chat, shown in groups.
pub fn open_private_kb(bot_username: &str) -> InlineKeyboard {
    InlineKeyboard::one_per_row(vec![InlineButton::url(
        texts::BTN_OPEN_PRIVATE,
        format!("https://t.me/{bot_username}?start=start"),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::messaging::types::ButtonAction;

    #[test]
    fn parses_every_button_the_menus_emit() {
        let kbs = [
            main_menu_kb(),
            group_submenu_kb(),
            after_rules_kb(Section::Group, RuleKind::Call),
            after_rules_kb(Section::Vserv, RuleKind::General),
            send_again_kb(),
        ];
        for kb in kbs {
            for b in kb.rows.iter().flatten() {
                let ButtonAction::Callback(data) = &b.action else {
                    panic!("menu buttons are callbacks");
                };
                let parsed = MenuAction::parse(data).expect("parsable");
                assert_eq!(&parsed.encode(), data);
            }
        }
    }

    #[test]
    fn send_action_carries_section_and_kind() {
        assert_eq!(
            MenuAction::parse("gact|send|group|chat"),
            Some(MenuAction::Send(Section::Group, RuleKind::Chat))
        );
        assert_eq!(
            MenuAction::parse("gact|cancel|bots|general"),
            Some(MenuAction::Cancel(Section::Bots, RuleKind::General))
        );
    }

    #[test]
    fn rejects_unknown_data() {
        assert_eq!(MenuAction::parse(""), None);
        assert_eq!(MenuAction::parse("askuser:1:2"), None);
        assert_eq!(MenuAction::parse("sec|admins"), None);
        assert_eq!(MenuAction::parse("gsub|general"), None);
        assert_eq!(MenuAction::parse("gact|drop|group|chat"), None);
    }

    #[test]
    fn private_link_uses_bot_username() {
        let kb = open_private_kb("relay_bot");
        assert_eq!(
            kb.rows[0][0].action,
            ButtonAction::Url("https://t.me/relay_bot?start=start".to_string())
        );
    }
}
