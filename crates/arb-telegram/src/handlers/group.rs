use std::sync::Arc;

use teloxide::prelude::*;

use arb_core::{domain::ChatId, menu, texts};

use crate::router::AppState;
use crate::TelegramMessenger;

fn mentions_owner(msg: &Message) -> bool {
    msg.text()
        .or_else(|| msg.caption())
        .is_some_and(|t| t.contains(texts::GROUP_OWNER_TRIGGER))
}

/// Any message registers (or refreshes) the group; asking for the owner gets a deep link.
pub async fn handle_group_message(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);
    if let Err(e) = state
        .store()
        .upsert_group(
            chat,
            msg.chat.title().map(str::to_string),
            msg.chat.username().map(str::to_string),
            true,
        )
        .await
    {
        tracing::warn!(chat_id = chat.0, error = %e, "failed to register group");
    }

    if !mentions_owner(&msg) {
        return Ok(());
    }

    // Replies go through the bot directly: the messaging port has no reply-to.
    let mut req = bot
        .send_message(msg.chat.id, texts::GROUP_OWNER_HINT)
        .reply_to_message_id(msg.id);
    if let Some(username) = state.bot_username.as_deref() {
        req = req.reply_markup(TelegramMessenger::markup(menu::open_private_kb(username)));
    }
    if let Err(e) = req.await {
        tracing::warn!(chat_id = chat.0, error = %e, "owner hint not delivered");
    }

    Ok(())
}
