use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    batch::Caption,
    domain::{ChatId, MediaItem, MessageId, MessageRef},
    messaging::{
        port::{AlbumPort, MessagingPort},
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per chat (Telegram 1 msg/sec style limits).
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that rate-limits outbound calls.
///
/// Broadcasts fan one admin message out to every user or group, which is exactly
/// the pattern Telegram answers with 429s. Best-effort: the adapter still retries
/// once on `RetryAfter`.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        map.entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    /// Waits for both the global slot and the destination chat's slot.
    pub async fn throttle_chat(&self, chat_id: i64) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let lim = self.limiter_for_chat(chat_id).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(chat_wait);
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_html(chat_id, html).await
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_inline_keyboard(chat_id, html, keyboard).await
    }

    async fn edit_inline_keyboard(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<()> {
        self.throttle_chat(msg.chat_id.0).await;
        self.inner.edit_inline_keyboard(msg, html, keyboard).await
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef> {
        self.throttle_chat(to.0).await;
        self.inner.copy_message(to, from, message_id).await
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        // No chat_id available here; apply global throttling only.
        self.throttle_global().await;
        self.inner.answer_callback_query(callback_id, text).await
    }
}

/// Album sends share the chat slots of the messenger they sit next to.
pub struct ThrottledAlbums<E> {
    inner: Arc<dyn AlbumPort<E>>,
    throttle: Arc<ThrottledMessenger>,
}

impl<E> ThrottledAlbums<E> {
    pub fn new(inner: Arc<dyn AlbumPort<E>>, throttle: Arc<ThrottledMessenger>) -> Self {
        Self { inner, throttle }
    }
}

#[async_trait::async_trait]
impl<E: Send + Sync> AlbumPort<E> for ThrottledAlbums<E> {
    async fn send_album(
        &self,
        chat_id: ChatId,
        items: &[MediaItem],
        caption: Option<&Caption<E>>,
    ) -> Result<()> {
        self.throttle.throttle_chat(chat_id.0).await;
        self.inner.send_album(chat_id, items, caption).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        domain::MediaKind,
        testing::{FakeAlbums, FakeMessenger},
    };

    #[tokio::test(start_paused = true)]
    async fn same_chat_calls_are_spaced_other_chats_are_not() {
        let fake = Arc::new(FakeMessenger::default());
        let throttled = ThrottledMessenger::new(
            fake.clone(),
            ThrottleConfig {
                global_min_interval: Duration::ZERO,
                per_chat_min_interval: Duration::from_secs(1),
            },
        );

        let start = Instant::now();
        throttled.send_html(ChatId(1), "a").await.unwrap();
        throttled.send_html(ChatId(2), "b").await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(10));

        throttled.send_html(ChatId(1), "c").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(1));

        assert_eq!(fake.sent_html(), vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn album_waits_for_the_chat_slot_used_by_messages() {
        let fake = Arc::new(FakeMessenger::default());
        let throttle = Arc::new(ThrottledMessenger::new(
            fake.clone(),
            ThrottleConfig {
                global_min_interval: Duration::ZERO,
                per_chat_min_interval: Duration::from_secs(1),
            },
        ));
        let albums_fake = Arc::new(FakeAlbums::default());
        let albums = ThrottledAlbums::<()>::new(albums_fake.clone(), throttle.clone());

        let start = Instant::now();
        throttle.send_html(ChatId(7), "card").await.unwrap();
        albums
            .send_album(ChatId(7), &[MediaItem::new(MediaKind::Photo, "p")], None)
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(albums_fake.sent.lock().unwrap().len(), 1);
    }
}
