//! Message routing between users, admins and groups.
//!
//! Transport-independent: everything goes through [`MessagingPort`] and
//! [`RelayStore`]. The Telegram adapter only decides *which* of these to call.

use std::{future::Future, sync::Arc};

use crate::{
    domain::{ChatId, Direction, MessageId, RuleKind, Section, UserId},
    formatting::format_request,
    menu,
    messaging::port::MessagingPort,
    store::RelayStore,
    texts,
    utils::MessageLog,
    Result,
};

/// Who receives a broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Audience {
    /// Every user that is not blocked.
    Users,
    /// Every active registered group.
    Groups,
}

impl Audience {
    pub fn direction(self) -> Direction {
        match self {
            Audience::Users => Direction::Broadcast,
            Audience::Groups => Direction::GroupBroadcast,
        }
    }
}

/// Run `send` for every chat, skipping failures; returns how many succeeded.
pub async fn fan_out<F, Fut>(chats: &[ChatId], mut send: F) -> usize
where
    F: FnMut(ChatId) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut sent = 0usize;
    for &chat in chats {
        match send(chat).await {
            Ok(()) => sent += 1,
            Err(e) => tracing::warn!(chat_id = chat.0, error = %e, "delivery failed, skipping"),
        }
    }
    sent
}

pub struct Relay {
    pub messenger: Arc<dyn MessagingPort>,
    pub store: Arc<dyn RelayStore>,
    pub log: Arc<MessageLog>,
}

impl Relay {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        store: Arc<dyn RelayStore>,
        log: Arc<MessageLog>,
    ) -> Self {
        Self {
            messenger,
            store,
            log,
        }
    }

    pub async fn audience_chats(&self, audience: Audience) -> Result<Vec<ChatId>> {
        match audience {
            Audience::Users => Ok(self
                .store
                .recipient_ids()
                .await?
                .into_iter()
                .map(ChatId::from)
                .collect()),
            Audience::Groups => self.store.group_ids(true).await,
        }
    }

    pub async fn admin_chats(&self) -> Result<Vec<ChatId>> {
        Ok(self
            .store
            .admin_ids()
            .await?
            .into_iter()
            .map(ChatId::from)
            .collect())
    }

    /// Copy one admin message to the whole audience. Returns the number of deliveries.
    pub async fn broadcast_copy(
        &self,
        admin: UserId,
        from_chat: ChatId,
        message_id: MessageId,
        audience: Audience,
        summary: &str,
    ) -> Result<usize> {
        let chats = self.audience_chats(audience).await?;
        let sent = fan_out(&chats, |chat| async move {
            self.messenger
                .copy_message(chat, from_chat, message_id)
                .await?;
            self.log
                .record(admin.0, Some(chat.0), audience.direction(), summary);
            Ok(())
        })
        .await;
        tracing::info!(
            admin = admin.0,
            ?audience,
            sent,
            total = chats.len(),
            "broadcast done"
        );
        Ok(sent)
    }

    /// Deliver a user's request to every admin: the request card, then the
    /// original message when it is not plain text.
    pub async fn relay_request(
        &self,
        user: UserId,
        username: Option<&str>,
        section: Section,
        kind: RuleKind,
        text: Option<&str>,
        original: Option<(ChatId, MessageId)>,
    ) -> Result<usize> {
        let card = format_request(section, kind, user, username, text);
        let admins = self.admin_chats().await?;
        let summary = text.unwrap_or("[media]");

        let card = card.as_str();
        let sent = fan_out(&admins, |admin| async move {
            self.messenger.send_html(admin, card).await?;
            if let Some((from_chat, message_id)) = original {
                self.messenger
                    .copy_message(admin, from_chat, message_id)
                    .await?;
            }
            self.log
                .record(user.0, Some(admin.0), Direction::UserToAdmin, summary);
            Ok(())
        })
        .await;
        Ok(sent)
    }

    /// Card sent to admins ahead of an album request.
    pub async fn request_card(
        &self,
        user: UserId,
        section: Section,
        kind: RuleKind,
        caption: Option<&str>,
    ) -> Result<String> {
        let username = self.store.user(user).await?.and_then(|u| u.username);
        Ok(format_request(
            section,
            kind,
            user,
            username.as_deref(),
            caption,
        ))
    }

    /// Admin text reply, with the "send again" button underneath.
    ///
    /// `html` is the admin's message already rendered with its formatting;
    /// `summary` is the plain text that goes to the message log.
    pub async fn reply_html(
        &self,
        admin: UserId,
        target: UserId,
        html: &str,
        summary: &str,
    ) -> Result<()> {
        let body = format!("{}\n\n{html}", texts::ADMIN_REPLY_PREFIX);
        self.messenger
            .send_inline_keyboard(target.into(), &body, menu::send_again_kb())
            .await?;
        self.log
            .record(admin.0, Some(target.0), Direction::AdminToUser, summary);
        Ok(())
    }

    /// Admin reply that is not plain text: header with the button, then a copy.
    pub async fn reply_copy(
        &self,
        admin: UserId,
        target: UserId,
        from_chat: ChatId,
        message_id: MessageId,
        summary: &str,
    ) -> Result<()> {
        self.reply_header(target).await?;
        self.messenger
            .copy_message(target.into(), from_chat, message_id)
            .await?;
        self.log
            .record(admin.0, Some(target.0), Direction::AdminToUser, summary);
        Ok(())
    }

    pub async fn reply_header(&self, target: UserId) -> Result<()> {
        self.messenger
            .send_inline_keyboard(
                target.into(),
                texts::ADMIN_REPLY_PREFIX,
                menu::send_again_kb(),
            )
            .await?;
        Ok(())
    }

    /// Tell a user how their request went; the "send again" button only follows success.
    pub async fn confirm_request(&self, user: UserId, delivered: usize) {
        if delivered == 0 {
            self.notify(user.into(), texts::REQUEST_FAILED).await;
            return;
        }
        if let Err(e) = self
            .messenger
            .send_inline_keyboard(user.into(), texts::REQUEST_SENT, menu::send_again_kb())
            .await
        {
            tracing::warn!(user_id = user.0, error = %e, "request confirmation not delivered");
        }
    }

    pub async fn confirm_reply(&self, admin: UserId, delivered: bool) {
        let html = if delivered {
            texts::REPLY_SENT
        } else {
            texts::REPLY_FAILED
        };
        self.notify(admin.into(), html).await;
    }

    /// Best-effort notice to a chat; failures are logged, never surfaced.
    pub async fn notify(&self, chat: ChatId, html: &str) {
        if let Err(e) = self.messenger.send_html(chat, html).await {
            tracing::warn!(chat_id = chat.0, error = %e, "notice not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        errors::Error,
        store::{FileStore, UserProfile},
        testing::FakeMessenger,
    };

    async fn relay_with(
        fake: Arc<FakeMessenger>,
        users: &[i64],
        admins: &[i64],
    ) -> (Relay, Arc<FileStore>) {
        let store = Arc::new(FileStore::in_memory());
        for &id in users {
            store
                .upsert_user(UserProfile {
                    user_id: UserId(id),
                    username: Some(format!("user{id}")),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        for &id in admins {
            store.set_admin(UserId(id), true).await.unwrap();
        }
        let relay = Relay::new(fake, store.clone(), Arc::new(MessageLog::disabled()));
        (relay, store)
    }

    #[tokio::test]
    async fn fan_out_counts_successes_only() {
        let chats = [ChatId(1), ChatId(2), ChatId(3)];
        let sent = fan_out(&chats, |c| async move {
            if c.0 == 2 {
                Err(Error::External("nope".into()))
            } else {
                Ok(())
            }
        })
        .await;
        assert_eq!(sent, 2);
    }

    #[tokio::test]
    async fn broadcast_skips_blocked_and_unreachable_users() {
        let fake = Arc::new(FakeMessenger::unreachable(&[3]));
        let (relay, store) = relay_with(fake.clone(), &[1, 2, 3, 4], &[1]).await;
        store.set_blocked(UserId(4), true).await.unwrap();

        let sent = relay
            .broadcast_copy(UserId(1), ChatId(1), MessageId(50), Audience::Users, "hello")
            .await
            .unwrap();

        assert_eq!(sent, 2);
        let copies = fake.copies.lock().unwrap().clone();
        assert_eq!(
            copies,
            vec![
                (ChatId(1), ChatId(1), MessageId(50)),
                (ChatId(2), ChatId(1), MessageId(50)),
            ]
        );
    }

    #[tokio::test]
    async fn group_broadcast_targets_active_groups() {
        let fake = Arc::new(FakeMessenger::default());
        let (relay, store) = relay_with(fake.clone(), &[1], &[1]).await;
        store
            .upsert_group(ChatId(-10), Some("a".into()), None, true)
            .await
            .unwrap();
        store
            .upsert_group(ChatId(-20), Some("b".into()), None, false)
            .await
            .unwrap();

        let sent = relay
            .broadcast_copy(UserId(1), ChatId(1), MessageId(9), Audience::Groups, "x")
            .await
            .unwrap();
        assert_eq!(sent, 1);
        assert_eq!(fake.copies.lock().unwrap()[0].0, ChatId(-10));
    }

    #[tokio::test]
    async fn text_request_reaches_every_admin_without_copy() {
        let fake = Arc::new(FakeMessenger::default());
        let (relay, _) = relay_with(fake.clone(), &[5], &[100, 200]).await;

        let sent = relay
            .relay_request(
                UserId(5),
                Some("user5"),
                Section::Group,
                RuleKind::Chat,
                Some("please"),
                None,
            )
            .await
            .unwrap();

        assert_eq!(sent, 2);
        assert!(fake.sent_to(100)[0].contains("please"));
        assert!(fake.sent_to(200)[0].contains("@user5"));
        assert!(fake.copies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn media_request_is_copied_after_the_card() {
        let fake = Arc::new(FakeMessenger::default());
        let (relay, _) = relay_with(fake.clone(), &[5], &[100]).await;

        relay
            .relay_request(
                UserId(5),
                None,
                Section::Vserv,
                RuleKind::General,
                None,
                Some((ChatId(5), MessageId(77))),
            )
            .await
            .unwrap();

        assert_eq!(fake.sent_to(100).len(), 1);
        assert_eq!(
            fake.copies.lock().unwrap().clone(),
            vec![(ChatId(100), ChatId(5), MessageId(77))]
        );
    }

    #[tokio::test]
    async fn reply_keeps_formatting_and_carries_send_again() {
        let fake = Arc::new(FakeMessenger::default());
        let (relay, _) = relay_with(fake.clone(), &[5], &[1]).await;

        relay
            .reply_html(UserId(1), UserId(5), "<b>bold</b> a &lt; b", "bold a < b")
            .await
            .unwrap();

        let kbs = fake.keyboards.lock().unwrap().clone();
        assert_eq!(kbs.len(), 1);
        assert_eq!(kbs[0].0, ChatId(5));
        assert!(kbs[0].1.starts_with(texts::ADMIN_REPLY_PREFIX));
        assert!(kbs[0].1.ends_with("<b>bold</b> a &lt; b"));
        assert_eq!(kbs[0].2, menu::send_again_kb());
    }

    #[tokio::test]
    async fn reply_to_unreachable_user_is_an_error() {
        let fake = Arc::new(FakeMessenger::unreachable(&[5]));
        let (relay, _) = relay_with(fake, &[5], &[1]).await;
        assert!(relay
            .reply_html(UserId(1), UserId(5), "hi", "hi")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn failed_request_gets_no_send_again_button() {
        let fake = Arc::new(FakeMessenger::default());
        let (relay, _) = relay_with(fake.clone(), &[5], &[]).await;

        relay.confirm_request(UserId(5), 0).await;
        assert_eq!(fake.sent_to(5), vec![texts::REQUEST_FAILED.to_string()]);
        assert!(fake.keyboards.lock().unwrap().is_empty());

        relay.confirm_request(UserId(5), 2).await;
        let kbs = fake.keyboards.lock().unwrap().clone();
        assert_eq!(kbs[0].1, texts::REQUEST_SENT);
        assert_eq!(kbs[0].2, menu::send_again_kb());
    }

    #[tokio::test]
    async fn request_card_uses_stored_username() {
        let fake = Arc::new(FakeMessenger::default());
        let (relay, _) = relay_with(fake, &[5], &[1]).await;
        let card = relay
            .request_card(UserId(5), Section::Group, RuleKind::Call, Some("cap"))
            .await
            .unwrap();
        assert!(card.contains("@user5"));
        assert!(card.contains("cap"));
    }
}
