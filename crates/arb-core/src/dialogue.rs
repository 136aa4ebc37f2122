use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{RuleKind, Section, UserId};

/// What the bot expects next from a user in their private chat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialogueState {
    #[default]
    Idle,
    /// User picked a category and accepted its rules; next message goes to admins.
    AwaitingRequest { section: Section, kind: RuleKind },
    /// Admin: next message (or album) goes to every non-blocked user.
    BroadcastUsers,
    /// Admin: next message (or album) goes to every active group.
    BroadcastGroups,
    /// Admin: next message goes to one user.
    AdminReply { target: UserId },
    /// Admin: next text replaces the rules of `section`/`kind`.
    SetRules { section: Section, kind: RuleKind },
}

/// Per-user dialogue states. Absent means [`DialogueState::Idle`].
#[derive(Default)]
pub struct Dialogues {
    inner: Mutex<HashMap<UserId, DialogueState>>,
}

impl Dialogues {
    pub async fn get(&self, user_id: UserId) -> DialogueState {
        self.inner
            .lock()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set(&self, user_id: UserId, state: DialogueState) {
        let mut map = self.inner.lock().await;
        if state == DialogueState::Idle {
            map.remove(&user_id);
        } else {
            map.insert(user_id, state);
        }
    }

    pub async fn clear(&self, user_id: UserId) {
        self.inner.lock().await.remove(&user_id);
    }

    /// Clear only if the user is still in `expected` (a newer command wins).
    pub async fn clear_if(&self, user_id: UserId, expected: DialogueState) -> bool {
        let mut map = self.inner.lock().await;
        if map.get(&user_id).copied().unwrap_or_default() != expected {
            return false;
        }
        map.remove(&user_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_idle_and_clears() {
        let d = Dialogues::default();
        let u = UserId(1);
        assert_eq!(d.get(u).await, DialogueState::Idle);

        d.set(u, DialogueState::BroadcastUsers).await;
        assert_eq!(d.get(u).await, DialogueState::BroadcastUsers);

        d.clear(u).await;
        assert_eq!(d.get(u).await, DialogueState::Idle);
    }

    #[tokio::test]
    async fn clear_if_leaves_newer_state_alone() {
        let d = Dialogues::default();
        let u = UserId(1);
        d.set(u, DialogueState::AdminReply { target: UserId(2) }).await;

        assert!(!d.clear_if(u, DialogueState::BroadcastGroups).await);
        assert_eq!(d.get(u).await, DialogueState::AdminReply { target: UserId(2) });

        assert!(d.clear_if(u, DialogueState::AdminReply { target: UserId(2) }).await);
        assert_eq!(d.get(u).await, DialogueState::Idle);
    }
}
