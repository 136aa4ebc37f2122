use async_trait::async_trait;

use crate::{
    batch::Caption,
    domain::{ChatId, MediaItem, MessageId, MessageRef},
    messaging::types::{InlineKeyboard, MessagingCapabilities},
    Result,
};

/// Outbound messaging port used by the relay handlers.
///
/// Telegram is the only implementation; tests use an in-memory fake.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    /// Replace text and keyboard of an existing message (menu navigation).
    async fn edit_inline_keyboard(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<()>;

    /// Re-post any message (text, media, sticker...) without a "forwarded from" header.
    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

/// Sends a collected album as a single grouped message.
///
/// `E` is the transport's caption entity type; the caption belongs on the first item.
#[async_trait]
pub trait AlbumPort<E>: Send + Sync {
    async fn send_album(
        &self,
        chat_id: ChatId,
        items: &[MediaItem],
        caption: Option<&Caption<E>>,
    ) -> Result<()>;
}
