use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, RuleKind, Section, UserId},
    errors::Error,
    store::{GroupRecord, RelayStore, Stats, UserProfile, UserRecord, NO_RULES_TEXT},
    Result,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RuleRecord {
    section: String,
    kind: String,
    text: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    users: BTreeMap<i64, UserRecord>,
    #[serde(default)]
    rules: Vec<RuleRecord>,
    #[serde(default)]
    groups: BTreeMap<i64, GroupRecord>,
}

impl StoreData {
    fn user_entry(&mut self, user_id: UserId) -> &mut UserRecord {
        self.users.entry(user_id.0).or_insert_with(|| UserRecord {
            user_id,
            is_admin: false,
            blocked: false,
            first_name: None,
            last_name: None,
            username: None,
            created_at: Utc::now(),
        })
    }

    fn rule_mut(&mut self, section: Section, kind: RuleKind) -> Option<&mut RuleRecord> {
        self.rules
            .iter_mut()
            .find(|r| r.section == section.as_str() && r.kind == kind.as_str())
    }
}

/// JSON-file backed [`RelayStore`].
///
/// The whole data set lives in memory; every mutation rewrites the file
/// (temp file + rename so a crash never leaves half a document behind).
pub struct FileStore {
    path: Option<PathBuf>,
    data: Mutex<StoreData>,
}

impl FileStore {
    /// Open (or start) the store at `path`. A missing or empty file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = load_store_file(&path).await?.unwrap_or_default();
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    /// Store without a backing file (tests, dry runs).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(StoreData::default()),
        }
    }

    /// Insert default rules that are still missing and promote the seed ids to admin.
    pub async fn seed(
        &self,
        default_rules: &[(Section, RuleKind, &str)],
        admin_ids: &[UserId],
    ) -> Result<()> {
        self.update(|data| {
            for (section, kind, text) in default_rules {
                if data.rule_mut(*section, *kind).is_none() {
                    data.rules.push(RuleRecord {
                        section: section.as_str().to_string(),
                        kind: kind.as_str().to_string(),
                        text: text.to_string(),
                    });
                }
            }
            for id in admin_ids {
                data.user_entry(*id).is_admin = true;
            }
        })
        .await
    }

    /// Apply `change` to a copy of the data and swap it in only once the file
    /// write succeeded, so a failed save leaves memory as it was.
    async fn update(&self, change: impl FnOnce(&mut StoreData)) -> Result<()> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        change(&mut next);
        self.persist(&next).await?;
        *data = next;
        Ok(())
    }

    async fn persist(&self, data: &StoreData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        save_store_file(path, data).await
    }
}

async fn load_store_file(path: &Path) -> Result<Option<StoreData>> {
    let txt = match tokio::fs::read_to_string(path).await {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };
    if txt.trim().is_empty() {
        return Ok(None);
    }
    let data: StoreData = serde_json::from_str(&txt)
        .map_err(|e| Error::Store(format!("{}: {e}", path.display())))?;
    Ok(Some(data))
}

async fn save_store_file(path: &Path, data: &StoreData) -> Result<()> {
    let txt = serde_json::to_string_pretty(data)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, txt).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl RelayStore for FileStore {
    async fn upsert_user(&self, profile: UserProfile) -> Result<()> {
        self.update(|data| {
            let user = data.user_entry(profile.user_id);
            user.first_name = profile.first_name;
            user.last_name = profile.last_name;
            user.username = profile.username;
        })
        .await
    }

    async fn user(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.data.lock().await.users.get(&user_id.0).cloned())
    }

    async fn set_admin(&self, user_id: UserId, is_admin: bool) -> Result<()> {
        self.update(|data| data.user_entry(user_id).is_admin = is_admin)
            .await
    }

    async fn set_blocked(&self, user_id: UserId, blocked: bool) -> Result<()> {
        self.update(|data| data.user_entry(user_id).blocked = blocked)
            .await
    }

    async fn admin_ids(&self) -> Result<Vec<UserId>> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .values()
            .filter(|u| u.is_admin)
            .map(|u| u.user_id)
            .collect())
    }

    async fn recipient_ids(&self) -> Result<Vec<UserId>> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .values()
            .filter(|u| !u.blocked)
            .map(|u| u.user_id)
            .collect())
    }

    async fn rules(&self, section: Section, kind: RuleKind) -> Result<String> {
        let mut data = self.data.lock().await;
        Ok(data
            .rule_mut(section, kind)
            .map(|r| r.text.clone())
            .unwrap_or_else(|| NO_RULES_TEXT.to_string()))
    }

    async fn set_rules(&self, section: Section, kind: RuleKind, text: &str) -> Result<()> {
        self.update(|data| match data.rule_mut(section, kind) {
            Some(r) => r.text = text.to_string(),
            None => data.rules.push(RuleRecord {
                section: section.as_str().to_string(),
                kind: kind.as_str().to_string(),
                text: text.to_string(),
            }),
        })
        .await
    }

    async fn upsert_group(
        &self,
        chat_id: ChatId,
        title: Option<String>,
        username: Option<String>,
        active: bool,
    ) -> Result<()> {
        let now = Utc::now();
        self.update(|data| {
            let group = data.groups.entry(chat_id.0).or_insert_with(|| GroupRecord {
                chat_id,
                title: None,
                username: None,
                is_active: active,
                added_at: now,
                updated_at: now,
            });
            group.title = title;
            group.username = username;
            group.is_active = active;
            group.updated_at = now;
        })
        .await
    }

    async fn group_ids(&self, active_only: bool) -> Result<Vec<ChatId>> {
        let data = self.data.lock().await;
        Ok(data
            .groups
            .values()
            .filter(|g| !active_only || g.is_active)
            .map(|g| g.chat_id)
            .collect())
    }

    async fn list_groups(&self, limit: usize) -> Result<Vec<(i64, String)>> {
        let data = self.data.lock().await;
        let mut active: Vec<&GroupRecord> = data.groups.values().filter(|g| g.is_active).collect();
        active.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(active
            .into_iter()
            .take(limit)
            .map(|g| (g.chat_id.0, g.display_name()))
            .collect())
    }

    async fn stats(&self) -> Result<Stats> {
        let data = self.data.lock().await;
        Ok(Stats {
            users: data.users.len(),
            active_groups: data.groups.values().filter(|g| g.is_active).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::store::defaults::DEFAULT_RULES;

    fn tmp(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}.json"))
    }

    fn profile(id: i64, username: &str) -> UserProfile {
        UserProfile {
            user_id: UserId(id),
            username: Some(username.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn upsert_refreshes_names_but_keeps_flags() {
        let store = FileStore::in_memory();
        store.set_admin(UserId(1), true).await.unwrap();
        store.upsert_user(profile(1, "old")).await.unwrap();
        store.upsert_user(profile(1, "new")).await.unwrap();

        let u = store.user(UserId(1)).await.unwrap().unwrap();
        assert!(u.is_admin);
        assert!(!u.blocked);
        assert_eq!(u.username.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn blocked_users_are_not_recipients() {
        let store = FileStore::in_memory();
        for id in 1..=3 {
            store.upsert_user(profile(id, "u")).await.unwrap();
        }
        store.set_blocked(UserId(2), true).await.unwrap();
        // Blocking an unknown id creates the record.
        store.set_blocked(UserId(9), true).await.unwrap();

        assert_eq!(
            store.recipient_ids().await.unwrap(),
            vec![UserId(1), UserId(3)]
        );
        assert!(store.is_blocked(UserId(9)).await.unwrap());
        assert!(!store.is_admin(UserId(9)).await.unwrap());
    }

    #[tokio::test]
    async fn seed_does_not_overwrite_edited_rules() {
        let store = FileStore::in_memory();
        store.seed(DEFAULT_RULES, &[UserId(5)]).await.unwrap();
        store
            .set_rules(Section::Group, RuleKind::Chat, "custom")
            .await
            .unwrap();
        store.seed(DEFAULT_RULES, &[UserId(5)]).await.unwrap();

        assert_eq!(
            store.rules(Section::Group, RuleKind::Chat).await.unwrap(),
            "custom"
        );
        assert!(store
            .rules(Section::Bots, RuleKind::General)
            .await
            .unwrap()
            .contains("ربات"));
        assert_eq!(
            store.rules(Section::Bots, RuleKind::Call).await.unwrap(),
            NO_RULES_TEXT
        );
        assert_eq!(store.admin_ids().await.unwrap(), vec![UserId(5)]);
    }

    #[tokio::test]
    async fn list_groups_prefers_recent_and_falls_back_on_names() {
        let store = FileStore::in_memory();
        store
            .upsert_group(ChatId(-1), Some("First".into()), None, true)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .upsert_group(ChatId(-2), None, Some("second_grp".into()), true)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.upsert_group(ChatId(-3), None, None, true).await.unwrap();
        store
            .upsert_group(ChatId(-4), Some("gone".into()), None, false)
            .await
            .unwrap();

        let listed = store.list_groups(2).await.unwrap();
        assert_eq!(
            listed,
            vec![(-3, "-3".to_string()), (-2, "second_grp".to_string())]
        );
        assert_eq!(store.group_ids(true).await.unwrap().len(), 3);
        assert_eq!(store.group_ids(false).await.unwrap().len(), 4);
        assert_eq!(store.stats().await.unwrap().active_groups, 3);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let path = tmp("arb-store");
        {
            let store = FileStore::open(&path).await.unwrap();
            store.upsert_user(profile(7, "seven")).await.unwrap();
            store.set_admin(UserId(7), true).await.unwrap();
            store
                .set_rules(Section::Vserv, RuleKind::General, "vserv rules")
                .await
                .unwrap();
            store
                .upsert_group(ChatId(-100), Some("g".into()), None, true)
                .await
                .unwrap();
        }

        let store = FileStore::open(&path).await.unwrap();
        assert!(store.is_admin(UserId(7)).await.unwrap());
        assert_eq!(
            store.rules(Section::Vserv, RuleKind::General).await.unwrap(),
            "vserv rules"
        );
        assert_eq!(store.group_ids(true).await.unwrap(), vec![ChatId(-100)]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn failed_save_leaves_memory_unchanged() {
        let dir = tmp("arb-store-missing-dir");
        let store = FileStore::open(dir.join("store.json")).await.unwrap();

        assert!(store.set_admin(UserId(42), true).await.is_err());
        assert!(store.admin_ids().await.unwrap().is_empty());
        assert!(store.user(UserId(42)).await.unwrap().is_none());

        assert!(store
            .set_rules(Section::Group, RuleKind::Chat, "new")
            .await
            .is_err());
        assert_eq!(
            store.rules(Section::Group, RuleKind::Chat).await.unwrap(),
            NO_RULES_TEXT
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_a_store_error() {
        let path = tmp("arb-store-bad");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileStore::open(&path).await.err().unwrap();
        assert!(matches!(err, Error::Store(_)));
        let _ = std::fs::remove_file(&path);
    }
}
