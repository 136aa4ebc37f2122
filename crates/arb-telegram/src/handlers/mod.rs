//! Telegram update handlers.
//!
//! Group messages only register the group. Private messages are routed by
//! command first, then by the sender's dialogue state.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, User},
};

use arb_core::{
    dialogue::DialogueState,
    domain::{ChatId, MessageId, UserId},
    relay::Audience,
    store::UserProfile,
    texts,
};

use crate::router::AppState;
mod callback;
mod commands;
mod group;
mod states;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle_callback(q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.chat.is_group() || msg.chat.is_supergroup() {
        return group::handle_group_message(bot, msg, state).await;
    }
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let user_id = user_id_of(from);

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
    }

    match state.dialogues.get(user_id).await {
        DialogueState::Idle => {
            state
                .relay
                .notify(ChatId::from(user_id), texts::START_HINT)
                .await;
        }
        DialogueState::AwaitingRequest { section, kind } => {
            states::handle_request(&msg, &state, user_id, section, kind).await;
        }
        DialogueState::BroadcastUsers => {
            states::handle_broadcast(&msg, &state, user_id, Audience::Users).await;
        }
        DialogueState::BroadcastGroups => {
            states::handle_broadcast(&msg, &state, user_id, Audience::Groups).await;
        }
        DialogueState::AdminReply { target } => {
            states::handle_admin_reply(&msg, &state, user_id, target).await;
        }
        DialogueState::SetRules { section, kind } => {
            states::handle_set_rules(&msg, &state, user_id, section, kind).await;
        }
    }

    Ok(())
}

pub(crate) fn user_id_of(user: &User) -> UserId {
    UserId(user.id.0 as i64)
}

pub(crate) fn profile_of(user: &User) -> UserProfile {
    UserProfile {
        user_id: user_id_of(user),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

pub(crate) fn message_ids(msg: &Message) -> (ChatId, MessageId) {
    (ChatId(msg.chat.id.0), MessageId(msg.id.0))
}

/// Short description of a message for the message log.
pub(crate) fn summary_of(msg: &Message) -> String {
    if let Some(text) = msg.text().or_else(|| msg.caption()) {
        return text.to_string();
    }
    match crate::media_item(msg) {
        Some(item) => format!("[{}]", item.kind.as_str()),
        None => "[message]".to_string(),
    }
}
