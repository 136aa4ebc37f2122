//! Telegram adapter (teloxide).
//!
//! This crate implements the `arb-core` MessagingPort over the Telegram Bot API
//! and hosts the update handlers.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{
        InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia, InputMediaAnimation,
        InputMediaAudio, InputMediaDocument, InputMediaPhoto, InputMediaVideo, MessageEntity,
        ParseMode,
    },
    utils::render::Renderer,
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use arb_core::{
    batch::Caption,
    domain::{ChatId, MediaItem, MediaKind, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::{AlbumPort, MessagingPort},
        types::{ButtonAction, InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

/// Telegram accepts at most this many items per `sendMediaGroup`.
const MEDIA_GROUP_MAX: usize = 10;

/// Album caption as Telegram sent it: text plus its formatting entities.
pub type AlbumCaption = Caption<MessageEntity>;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    pub(crate) fn markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .filter_map(|b| match b.action {
                        ButtonAction::Callback(data) => {
                            Some(InlineKeyboardButton::callback(b.label, data))
                        }
                        ButtonAction::Url(url) => match reqwest::Url::parse(&url) {
                            Ok(u) => Some(InlineKeyboardButton::url(b.label, u)),
                            Err(e) => {
                                tracing::warn!(
                                    %url,
                                    error = %e,
                                    "dropping button with invalid url"
                                );
                                None
                            }
                        },
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();
        InlineKeyboardMarkup::new(rows)
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

/// Build the `sendMediaGroup` payload, attaching the caption to the first item only.
pub fn album_media(items: &[MediaItem], caption: Option<&AlbumCaption>) -> Vec<InputMedia> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let cap = if idx == 0 { caption } else { None };
            input_media(item, cap)
        })
        .collect()
}

macro_rules! with_caption {
    ($media:expr, $cap:expr) => {{
        let media = $media;
        match $cap {
            Some(c) => media
                .caption(c.text.clone())
                .caption_entities(c.entities.clone()),
            None => media,
        }
    }};
}

fn input_media(item: &MediaItem, caption: Option<&AlbumCaption>) -> InputMedia {
    let file = InputFile::file_id(item.file_id.clone());
    match item.kind {
        MediaKind::Photo => InputMedia::Photo(with_caption!(InputMediaPhoto::new(file), caption)),
        MediaKind::Video => InputMedia::Video(with_caption!(InputMediaVideo::new(file), caption)),
        MediaKind::Document => {
            InputMedia::Document(with_caption!(InputMediaDocument::new(file), caption))
        }
        MediaKind::Animation => {
            InputMedia::Animation(with_caption!(InputMediaAnimation::new(file), caption))
        }
        MediaKind::Audio => InputMedia::Audio(with_caption!(InputMediaAudio::new(file), caption)),
    }
}

/// The resendable attachment of a message, if it has one (largest photo size).
pub fn media_item(msg: &Message) -> Option<MediaItem> {
    if let Some(photos) = msg.photo() {
        return photos
            .last()
            .map(|p| MediaItem::new(MediaKind::Photo, p.file.id.clone()));
    }
    if let Some(v) = msg.video() {
        return Some(MediaItem::new(MediaKind::Video, v.file.id.clone()));
    }
    if let Some(d) = msg.document() {
        return Some(MediaItem::new(MediaKind::Document, d.file.id.clone()));
    }
    if let Some(a) = msg.animation() {
        return Some(MediaItem::new(MediaKind::Animation, a.file.id.clone()));
    }
    if let Some(a) = msg.audio() {
        return Some(MediaItem::new(MediaKind::Audio, a.file.id.clone()));
    }
    None
}

/// Caption of one album part; blank captions are treated as absent.
pub fn album_caption(msg: &Message) -> Option<AlbumCaption> {
    let text = msg.caption()?;
    let entities = msg.caption_entities().map(|e| e.to_vec()).unwrap_or_default();
    Caption::new(text, entities)
}

/// HTML for `text` with its formatting entities applied; plain parts are escaped.
pub fn render_html(text: &str, entities: &[MessageEntity]) -> String {
    Renderer::new(text, entities).as_html()
}

/// The text of `msg` as HTML, keeping bold, links, spoilers and the rest.
pub fn message_html(msg: &Message) -> Option<String> {
    let text = msg.text()?;
    Some(render_html(text, msg.entities().unwrap_or_default()))
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_html: true,
            supports_edit: true,
            supports_inline_keyboards: true,
            max_message_len: 4096,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = Self::markup(keyboard);

        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(markup.clone())
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_inline_keyboard(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<()> {
        let markup = Self::markup(keyboard);
        self.with_retry(|| {
            self.bot
                .edit_message_text(
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                    html.to_string(),
                )
                .parse_mode(ParseMode::Html)
                .reply_markup(markup.clone())
        })
        .await?;
        Ok(())
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef> {
        let id = self
            .with_retry(|| {
                self.bot.copy_message(
                    Self::tg_chat(to),
                    Self::tg_chat(from),
                    Self::tg_msg_id(message_id),
                )
            })
            .await?;
        Ok(MessageRef {
            chat_id: to,
            message_id: MessageId(id.0),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AlbumPort<MessageEntity> for TelegramMessenger {
    async fn send_album(
        &self,
        chat_id: ChatId,
        items: &[MediaItem],
        caption: Option<&AlbumCaption>,
    ) -> Result<()> {
        if items.is_empty() {
            return Err(Error::InvalidInput("album has no items".to_string()));
        }
        let media = album_media(items, caption);
        for chunk in media.chunks(MEDIA_GROUP_MAX) {
            self.with_retry(|| {
                self.bot
                    .send_media_group(Self::tg_chat(chat_id), chunk.to_vec())
            })
            .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use arb_core::messaging::types::InlineButton;
    use teloxide::types::MessageEntityKind;

    fn items() -> Vec<MediaItem> {
        vec![
            MediaItem::new(MediaKind::Photo, "p1"),
            MediaItem::new(MediaKind::Video, "v1"),
            MediaItem::new(MediaKind::Document, "d1"),
        ]
    }

    #[test]
    fn caption_only_on_first_album_item() {
        let cap = Caption::new(
            "hello",
            vec![MessageEntity::new(MessageEntityKind::Bold, 0, 5)],
        )
        .unwrap();
        let media = album_media(&items(), Some(&cap));

        assert_eq!(media.len(), 3);
        match &media[0] {
            InputMedia::Photo(p) => {
                assert_eq!(p.caption.as_deref(), Some("hello"));
                assert_eq!(p.caption_entities.as_ref().map(|e| e.len()), Some(1));
            }
            other => panic!("expected photo, got {other:?}"),
        }
        match &media[1] {
            InputMedia::Video(v) => assert!(v.caption.is_none()),
            other => panic!("expected video, got {other:?}"),
        }
        assert!(matches!(media[2], InputMedia::Document(_)));
    }

    #[test]
    fn formatting_entities_survive_as_html() {
        let entities = vec![
            MessageEntity::new(MessageEntityKind::Bold, 0, 4),
            MessageEntity::new(MessageEntityKind::Italic, 5, 3),
        ];
        let html = render_html("rule one < two", &entities);
        assert!(html.starts_with("<b>rule</b> <i>one</i>"), "{html}");
        assert!(html.contains("&lt; two"), "{html}");

        assert_eq!(render_html("a & b", &[]), "a &amp; b");
    }

    #[test]
    fn invalid_url_buttons_are_dropped() {
        let kb = InlineKeyboard::new(vec![
            vec![InlineButton::url("bad", "not a url")],
            vec![InlineButton::callback("ok", "main|menu")],
        ]);
        let markup = TelegramMessenger::markup(kb);
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0][0].text, "ok");
    }
}
