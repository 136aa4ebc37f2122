use serde::{Deserialize, Serialize};

use crate::{errors::Error, Result};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl From<UserId> for ChatId {
    /// Private chats share the id of the user on the other side.
    fn from(u: UserId) -> Self {
        ChatId(u.0)
    }
}

/// Attachment kinds that can be re-sent as part of an album.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    Animation,
    Audio,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Animation => "animation",
            MediaKind::Audio => "audio",
        }
    }
}

/// One album part: what it is plus the Telegram file handle to resend it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub file_id: String,
}

impl MediaItem {
    pub fn new(kind: MediaKind, file_id: impl Into<String>) -> Self {
        Self {
            kind,
            file_id: file_id.into(),
        }
    }
}

/// Top-level menu sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Group,
    Bots,
    Vserv,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Group => "group",
            Section::Bots => "bots",
            Section::Vserv => "vserv",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "group" => Ok(Section::Group),
            "bots" => Ok(Section::Bots),
            "vserv" => Ok(Section::Vserv),
            other => Err(Error::InvalidInput(format!("unknown section: {other}"))),
        }
    }
}

/// Rule flavours inside a section (`general` for sections without sub-kinds).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Chat,
    Call,
    General,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Chat => "chat",
            RuleKind::Call => "call",
            RuleKind::General => "general",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(RuleKind::Chat),
            "call" => Ok(RuleKind::Call),
            "general" => Ok(RuleKind::General),
            other => Err(Error::InvalidInput(format!("unknown rule kind: {other}"))),
        }
    }
}

/// Which way a relayed message travelled (recorded in the message log).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    UserToAdmin,
    AdminToUser,
    Broadcast,
    GroupBroadcast,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_and_kind_parse_case_insensitively() {
        assert_eq!(Section::parse(" Group ").unwrap(), Section::Group);
        assert_eq!(RuleKind::parse("CALL").unwrap(), RuleKind::Call);
        assert!(Section::parse("admins").is_err());
        assert!(RuleKind::parse("").is_err());
    }

    #[test]
    fn direction_serializes_snake_case() {
        let s = serde_json::to_string(&Direction::GroupBroadcast).unwrap();
        assert_eq!(s, "\"group_broadcast\"");
    }
}
