//! Persistence port for users, rules and registered groups.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatId, RuleKind, Section, UserId},
    Result,
};

pub mod defaults;
pub mod file;

pub use file::FileStore;

/// Shown when a section/kind pair has no stored rules.
pub const NO_RULES_TEXT: &str = "هنوز قانونی ثبت نشده است.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub is_admin: bool,
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Name fields refreshed every time a user talks to the bot.
#[derive(Clone, Debug, Default)]
pub struct UserProfile {
    pub user_id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub chat_id: ChatId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub is_active: bool,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupRecord {
    /// Title, else username, else the numeric id.
    pub fn display_name(&self) -> String {
        self.title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.username.clone().filter(|u| !u.trim().is_empty()))
            .unwrap_or_else(|| self.chat_id.0.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stats {
    pub users: usize,
    pub active_groups: usize,
}

#[async_trait]
pub trait RelayStore: Send + Sync {
    /// Insert as a regular, unblocked user or refresh the name fields.
    async fn upsert_user(&self, profile: UserProfile) -> Result<()>;
    async fn user(&self, user_id: UserId) -> Result<Option<UserRecord>>;
    async fn set_admin(&self, user_id: UserId, is_admin: bool) -> Result<()>;
    async fn set_blocked(&self, user_id: UserId, blocked: bool) -> Result<()>;
    async fn admin_ids(&self) -> Result<Vec<UserId>>;
    /// Every user that is not blocked (broadcast audience).
    async fn recipient_ids(&self) -> Result<Vec<UserId>>;

    /// Stored rules text, or [`NO_RULES_TEXT`].
    async fn rules(&self, section: Section, kind: RuleKind) -> Result<String>;
    async fn set_rules(&self, section: Section, kind: RuleKind, text: &str) -> Result<()>;

    async fn upsert_group(
        &self,
        chat_id: ChatId,
        title: Option<String>,
        username: Option<String>,
        active: bool,
    ) -> Result<()>;
    async fn group_ids(&self, active_only: bool) -> Result<Vec<ChatId>>;
    /// Active groups, most recently seen first, as `(chat id, display name)`.
    async fn list_groups(&self, limit: usize) -> Result<Vec<(i64, String)>>;

    async fn stats(&self) -> Result<Stats>;

    async fn is_admin(&self, user_id: UserId) -> Result<bool> {
        Ok(self.user(user_id).await?.map(|u| u.is_admin).unwrap_or(false))
    }

    async fn is_blocked(&self, user_id: UserId) -> Result<bool> {
        Ok(self.user(user_id).await?.map(|u| u.blocked).unwrap_or(false))
    }
}
