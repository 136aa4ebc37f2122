use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI32, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    batch::Caption,
    domain::{ChatId, MediaItem, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::{AlbumPort, MessagingPort},
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

/// In-memory messenger recording every outbound call.
#[derive(Default)]
pub struct FakeMessenger {
    next_id: AtomicI32,
    pub sends: Mutex<Vec<(ChatId, String)>>,
    pub keyboards: Mutex<Vec<(ChatId, String, InlineKeyboard)>>,
    pub edits: Mutex<Vec<(MessageRef, String)>>,
    pub copies: Mutex<Vec<(ChatId, ChatId, MessageId)>>,
    pub answers: Mutex<Vec<(String, Option<String>)>>,
    /// Chats that reject everything (e.g. users who blocked the bot).
    pub unreachable: Mutex<HashSet<i64>>,
}

impl FakeMessenger {
    pub fn unreachable(chats: &[i64]) -> Self {
        let fake = Self::default();
        fake.unreachable.lock().unwrap().extend(chats.iter().copied());
        fake
    }

    pub fn sent_html(&self) -> Vec<String> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c.0 == chat_id)
            .map(|(_, s)| s.clone())
            .collect()
    }

    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        MessageRef {
            chat_id,
            message_id: MessageId(id),
        }
    }

    fn check(&self, chat_id: ChatId) -> Result<()> {
        if self.unreachable.lock().unwrap().contains(&chat_id.0) {
            return Err(Error::External(format!(
                "telegram error: chat {} not reachable",
                chat_id.0
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_html: true,
            supports_edit: true,
            supports_inline_keyboards: true,
            max_message_len: 4096,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.check(chat_id)?;
        self.sends.lock().unwrap().push((chat_id, html.to_string()));
        Ok(self.alloc(chat_id))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.check(chat_id)?;
        self.keyboards
            .lock()
            .unwrap()
            .push((chat_id, html.to_string(), keyboard));
        Ok(self.alloc(chat_id))
    }

    async fn edit_inline_keyboard(
        &self,
        msg: MessageRef,
        html: &str,
        _keyboard: InlineKeyboard,
    ) -> Result<()> {
        self.check(msg.chat_id)?;
        self.edits.lock().unwrap().push((msg, html.to_string()));
        Ok(())
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef> {
        self.check(to)?;
        self.copies.lock().unwrap().push((to, from, message_id));
        Ok(self.alloc(to))
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.answers
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.map(|s| s.to_string())));
        Ok(())
    }
}

/// Records albums as (chat, items, caption text).
#[derive(Default)]
pub struct FakeAlbums {
    pub sent: Mutex<Vec<(ChatId, Vec<MediaItem>, Option<String>)>>,
    pub unreachable: Mutex<HashSet<i64>>,
}

impl FakeAlbums {
    pub fn unreachable(chats: &[i64]) -> Self {
        let fake = Self::default();
        fake.unreachable.lock().unwrap().extend(chats.iter().copied());
        fake
    }

    pub fn chats(&self) -> Vec<ChatId> {
        self.sent.lock().unwrap().iter().map(|(c, _, _)| *c).collect()
    }
}

#[async_trait]
impl<E: Send + Sync> AlbumPort<E> for FakeAlbums {
    async fn send_album(
        &self,
        chat_id: ChatId,
        items: &[MediaItem],
        caption: Option<&Caption<E>>,
    ) -> Result<()> {
        if self.unreachable.lock().unwrap().contains(&chat_id.0) {
            return Err(Error::External(format!(
                "telegram error: chat {} not reachable",
                chat_id.0
            )));
        }
        self.sent.lock().unwrap().push((
            chat_id,
            items.to_vec(),
            caption.map(|c| c.text.clone()),
        ));
        Ok(())
    }
}
