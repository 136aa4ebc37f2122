use std::sync::Arc;

use teloxide::prelude::*;

use arb_core::{
    dialogue::DialogueState,
    domain::{ChatId, MessageId, MessageRef, RuleKind, Section},
    menu::{self, MenuAction},
    messaging::types::InlineKeyboard,
    texts,
};

use crate::router::AppState;

use super::user_id_of;

/// Navigate in place; if the menu message can no longer be edited, post a new one.
async fn show(state: &AppState, at: MessageRef, html: &str, keyboard: InlineKeyboard) {
    let messenger = &state.relay.messenger;
    if let Err(e) = messenger
        .edit_inline_keyboard(at, html, keyboard.clone())
        .await
    {
        tracing::debug!(
            chat_id = at.chat_id.0,
            error = %e,
            "menu edit failed, sending new message"
        );
        if let Err(e) = messenger
            .send_inline_keyboard(at.chat_id, html, keyboard)
            .await
        {
            tracing::warn!(chat_id = at.chat_id.0, error = %e, "failed to show menu");
        }
    }
}

async fn show_rules(state: &AppState, at: MessageRef, section: Section, kind: RuleKind) {
    let rules = match state.store().rules(section, kind).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                section = section.as_str(),
                kind = kind.as_str(),
                error = %e,
                "failed to load rules"
            );
            state.relay.notify(at.chat_id, texts::STORE_ERROR).await;
            return;
        }
    };
    show(state, at, &rules, menu::after_rules_kb(section, kind)).await;
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    // Always answer, even for data we do not understand, so the client stops spinning.
    if let Err(e) = state.relay.messenger.answer_callback_query(&q.id, None).await {
        tracing::debug!(error = %e, "callback answer failed");
    }

    let Some(msg) = q.message.as_ref() else {
        return Ok(());
    };
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(action) = q.data.as_deref().and_then(MenuAction::parse) else {
        tracing::debug!(data = ?q.data, "ignoring unknown callback data");
        return Ok(());
    };

    let user = user_id_of(&q.from);
    let at = MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    };

    match action {
        MenuAction::MainMenu => {
            show(&state, at, texts::MAIN_MENU, menu::main_menu_kb()).await;
        }
        MenuAction::Section(section) => match menu::section_rules_kind(section) {
            Some(kind) => show_rules(&state, at, section, kind).await,
            None => show(&state, at, texts::GROUP_MENU, menu::group_submenu_kb()).await,
        },
        MenuAction::GroupSub(kind) => {
            show_rules(&state, at, Section::Group, kind).await;
        }
        MenuAction::Send(section, kind) => {
            if matches!(state.store().is_blocked(user).await, Ok(true)) {
                state.relay.notify(at.chat_id, texts::BLOCKED).await;
                return Ok(());
            }
            state
                .dialogues
                .set(user, DialogueState::AwaitingRequest { section, kind })
                .await;
            state.relay.notify(at.chat_id, texts::ASK_REQUEST).await;
        }
        MenuAction::Cancel(_, _) => {
            state.dialogues.clear(user).await;
            show(&state, at, texts::MAIN_MENU, menu::main_menu_kb()).await;
        }
        MenuAction::SendAgain => {
            state.dialogues.clear(user).await;
            if let Err(e) = state
                .relay
                .messenger
                .send_inline_keyboard(at.chat_id, texts::MAIN_MENU, menu::main_menu_kb())
                .await
            {
                tracing::warn!(chat_id = at.chat_id.0, error = %e, "failed to send main menu");
            }
        }
    }

    Ok(())
}
