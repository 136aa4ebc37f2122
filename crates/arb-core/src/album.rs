//! Delivery of collected albums.
//!
//! Album parts are fed to a [`BatchCollector`] keyed by [`AlbumKey`]; once a
//! key goes quiet, [`AlbumDelivery`] resends the whole album to wherever the
//! sender's dialogue pointed when the first part arrived.

use std::{sync::Arc, time::Duration};

use crate::{
    batch::{Batch, BatchCollector, BoxFuture, FlushFn},
    dialogue::{DialogueState, Dialogues},
    domain::{ChatId, Direction, MediaItem, RuleKind, Section, UserId},
    messaging::port::AlbumPort,
    relay::{fan_out, Audience, Relay},
    texts, Result,
};

/// Where a collected album goes once it is complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlbumTarget {
    Broadcast(Audience),
    /// A user's request, delivered to every admin.
    Admins { section: Section, kind: RuleKind },
    /// An admin's reply to one user.
    User(UserId),
}

impl AlbumTarget {
    /// The dialogue state that routes album parts here.
    pub fn dialogue(self) -> DialogueState {
        match self {
            AlbumTarget::Broadcast(Audience::Users) => DialogueState::BroadcastUsers,
            AlbumTarget::Broadcast(Audience::Groups) => DialogueState::BroadcastGroups,
            AlbumTarget::Admins { section, kind } => {
                DialogueState::AwaitingRequest { section, kind }
            }
            AlbumTarget::User(target) => DialogueState::AdminReply { target },
        }
    }
}

/// Identity of one album in flight: who sent it, where it goes, and Telegram's group id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AlbumKey {
    pub origin: UserId,
    pub target: AlbumTarget,
    pub media_group_id: String,
}

pub type AlbumCollector<E> = BatchCollector<AlbumKey, MediaItem, E>;

fn album_summary<E>(batch: &Batch<MediaItem, E>) -> String {
    match &batch.caption {
        Some(c) => c.text.clone(),
        None => format!("[album: {} items]", batch.items.len()),
    }
}

pub struct AlbumDelivery<E> {
    relay: Arc<Relay>,
    dialogues: Arc<Dialogues>,
    albums: Arc<dyn AlbumPort<E>>,
}

impl<E> AlbumDelivery<E>
where
    E: Send + Sync + 'static,
{
    pub fn new(
        relay: Arc<Relay>,
        dialogues: Arc<Dialogues>,
        albums: Arc<dyn AlbumPort<E>>,
    ) -> Self {
        Self {
            relay,
            dialogues,
            albums,
        }
    }

    /// Collector whose flushes are delivered by `self`.
    pub fn into_collector(self, quiet: Duration) -> AlbumCollector<E> {
        let delivery = Arc::new(self);
        let on_flush: FlushFn<AlbumKey, MediaItem, E> =
            Arc::new(move |key: AlbumKey, batch: Batch<MediaItem, E>| {
                let delivery = delivery.clone();
                let fut: BoxFuture = Box::pin(async move { delivery.deliver(key, batch).await });
                fut
            });
        BatchCollector::new(quiet, on_flush)
    }

    pub async fn deliver(&self, key: AlbumKey, batch: Batch<MediaItem, E>) {
        let origin = key.origin;
        // A command issued while the album was still arriving wins.
        self.dialogues.clear_if(origin, key.target.dialogue()).await;

        if batch.items.is_empty() {
            self.relay.notify(origin.into(), texts::EMPTY_ALBUM).await;
            return;
        }

        let result = match key.target {
            AlbumTarget::Broadcast(audience) => self.broadcast(origin, audience, &batch).await,
            AlbumTarget::Admins { section, kind } => {
                self.request(origin, section, kind, &batch).await
            }
            AlbumTarget::User(target) => {
                self.reply(origin, target, &batch).await;
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::warn!(user_id = origin.0, error = %e, "album delivery failed");
            self.relay.notify(origin.into(), texts::STORE_ERROR).await;
        }
    }

    async fn send(&self, chat: ChatId, batch: &Batch<MediaItem, E>) -> Result<()> {
        self.albums
            .send_album(chat, &batch.items, batch.caption.as_ref())
            .await
    }

    async fn broadcast(
        &self,
        admin: UserId,
        audience: Audience,
        batch: &Batch<MediaItem, E>,
    ) -> Result<()> {
        let chats = self.relay.audience_chats(audience).await?;
        let summary = album_summary(batch);
        let summary = summary.as_str();

        let sent = fan_out(&chats, |chat| async move {
            self.send(chat, batch).await?;
            self.relay
                .log
                .record(admin.0, Some(chat.0), audience.direction(), summary);
            Ok(())
        })
        .await;

        tracing::info!(
            admin = admin.0,
            ?audience,
            sent,
            total = chats.len(),
            "album broadcast done"
        );
        let done = texts::broadcast_done(sent, audience == Audience::Groups, true);
        self.relay.notify(admin.into(), &done).await;
        Ok(())
    }

    async fn request(
        &self,
        user: UserId,
        section: Section,
        kind: RuleKind,
        batch: &Batch<MediaItem, E>,
    ) -> Result<()> {
        let caption = batch.caption.as_ref().map(|c| c.text.as_str());
        let card = self
            .relay
            .request_card(user, section, kind, caption)
            .await?;
        let admins = self.relay.admin_chats().await?;
        let summary = album_summary(batch);

        let (card, summary) = (card.as_str(), summary.as_str());
        let sent = fan_out(&admins, |admin| async move {
            self.relay.messenger.send_html(admin, card).await?;
            self.send(admin, batch).await?;
            self.relay
                .log
                .record(user.0, Some(admin.0), Direction::UserToAdmin, summary);
            Ok(())
        })
        .await;

        self.relay.confirm_request(user, sent).await;
        Ok(())
    }

    async fn reply(&self, admin: UserId, target: UserId, batch: &Batch<MediaItem, E>) {
        let result: Result<()> = async {
            self.relay.reply_header(target).await?;
            self.send(target.into(), batch).await
        }
        .await;

        match &result {
            Ok(()) => self.relay.log.record(
                admin.0,
                Some(target.0),
                Direction::AdminToUser,
                &album_summary(batch),
            ),
            Err(e) => tracing::warn!(target_user = target.0, error = %e, "album reply failed"),
        }
        self.relay.confirm_reply(admin, result.is_ok()).await;
    }
}
