use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::UserId, errors::Error, Result};

/// Typed configuration for the relay bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    /// Seeded as admins on every startup (admins added later live in the store).
    pub admin_seed_ids: Vec<UserId>,

    // Persistence
    pub store_path: PathBuf,
    pub message_log_path: PathBuf,

    // Albums
    pub album_quiet_interval: Duration,

    // Presentation
    pub list_groups_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("BOT_TOKEN")
            .or_else(|| env_str("TELEGRAM_BOT_TOKEN"))
            .unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let admin_seed_ids = parse_id_list(
            env_str("ADMIN_ID")
                .and_then(non_empty)
                .or_else(|| env_str("ADMIN_SEED_IDS")),
        );

        let store_path =
            PathBuf::from(env_str("STORE_PATH").unwrap_or("relay-store.json".to_string()));
        let message_log_path = PathBuf::from(
            env_str("MESSAGE_LOG_PATH").unwrap_or("relay-messages.log".to_string()),
        );

        let album_quiet_interval =
            Duration::from_millis(env_u64("ALBUM_QUIET_MS").unwrap_or(2000));
        let list_groups_limit = env_usize("LIST_GROUPS_LIMIT").unwrap_or(50).max(1);

        Ok(Self {
            telegram_bot_token,
            admin_seed_ids,
            store_path,
            message_log_path,
            album_quiet_interval,
            list_groups_limit,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

/// Ids may be separated by commas, whitespace, or both; non-numeric tokens are skipped.
fn parse_id_list(v: Option<String>) -> Vec<UserId> {
    let mut out: Vec<UserId> = Vec::new();
    for id in v
        .unwrap_or_default()
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .map(UserId)
    {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
