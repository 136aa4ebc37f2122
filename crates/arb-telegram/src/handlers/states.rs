use teloxide::types::Message;

use arb_core::{
    album::{AlbumKey, AlbumTarget},
    dialogue::DialogueState,
    domain::{ChatId, RuleKind, Section, UserId},
    relay::Audience,
    texts,
};

use crate::router::AppState;
use crate::{album_caption, media_item, message_html};

use super::{message_ids, profile_of, summary_of};

/// Feed one album part to the collector; delivery happens when the album goes quiet.
fn observe_album(
    state: &AppState,
    origin: UserId,
    target: AlbumTarget,
    media_group_id: &str,
    msg: &Message,
) {
    state.albums.observe(
        AlbumKey {
            origin,
            target,
            media_group_id: media_group_id.to_string(),
        },
        media_item(msg),
        album_caption(msg),
    );
}

/// Admin states end as soon as the sender is no longer an admin.
async fn still_admin(state: &AppState, user: UserId) -> bool {
    match state.store().is_admin(user).await {
        Ok(true) => true,
        Ok(false) => {
            state.dialogues.clear(user).await;
            state.relay.notify(user.into(), texts::ADMIN_ONLY).await;
            false
        }
        Err(e) => {
            tracing::warn!(user_id = user.0, error = %e, "admin lookup failed");
            state.relay.notify(user.into(), texts::STORE_ERROR).await;
            false
        }
    }
}

pub(super) async fn handle_request(
    msg: &Message,
    state: &AppState,
    user: UserId,
    section: Section,
    kind: RuleKind,
) {
    let chat = ChatId::from(user);
    match state.store().is_blocked(user).await {
        Ok(false) => {}
        Ok(true) => {
            state.dialogues.clear(user).await;
            state.relay.notify(chat, texts::BLOCKED).await;
            return;
        }
        Err(e) => {
            tracing::warn!(user_id = user.0, error = %e, "block lookup failed");
            state.relay.notify(chat, texts::STORE_ERROR).await;
            return;
        }
    }

    let username = msg.from().and_then(|u| u.username.clone());
    if let Some(from) = msg.from() {
        if let Err(e) = state.store().upsert_user(profile_of(from)).await {
            tracing::warn!(user_id = user.0, error = %e, "failed to refresh user profile");
        }
    }

    if let Some(media_group_id) = msg.media_group_id() {
        observe_album(
            state,
            user,
            AlbumTarget::Admins { section, kind },
            media_group_id,
            msg,
        );
        return;
    }

    // Text goes inside the card; anything else is copied right after it.
    let text = msg.text();
    let original = text.is_none().then(|| message_ids(msg));
    let delivered = match state
        .relay
        .relay_request(user, username.as_deref(), section, kind, text, original)
        .await
    {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(user_id = user.0, error = %e, "request relay failed");
            0
        }
    };

    state
        .dialogues
        .clear_if(user, DialogueState::AwaitingRequest { section, kind })
        .await;
    state.relay.confirm_request(user, delivered).await;
}

pub(super) async fn handle_broadcast(
    msg: &Message,
    state: &AppState,
    admin: UserId,
    audience: Audience,
) {
    if !still_admin(state, admin).await {
        return;
    }
    let target = AlbumTarget::Broadcast(audience);

    if let Some(media_group_id) = msg.media_group_id() {
        observe_album(state, admin, target, media_group_id, msg);
        return;
    }

    let (chat, message_id) = message_ids(msg);
    match state
        .relay
        .broadcast_copy(admin, chat, message_id, audience, &summary_of(msg))
        .await
    {
        Ok(sent) => {
            state.dialogues.clear_if(admin, target.dialogue()).await;
            let done = texts::broadcast_done(sent, audience == Audience::Groups, false);
            state.relay.notify(admin.into(), &done).await;
        }
        Err(e) => {
            tracing::warn!(admin = admin.0, error = %e, "broadcast failed");
            state.relay.notify(admin.into(), texts::STORE_ERROR).await;
        }
    }
}

pub(super) async fn handle_admin_reply(
    msg: &Message,
    state: &AppState,
    admin: UserId,
    target: UserId,
) {
    if !still_admin(state, admin).await {
        return;
    }

    if let Some(media_group_id) = msg.media_group_id() {
        observe_album(state, admin, AlbumTarget::User(target), media_group_id, msg);
        return;
    }

    let result = match msg.text().zip(message_html(msg)) {
        Some((text, html)) => state.relay.reply_html(admin, target, &html, text).await,
        None => {
            let (chat, message_id) = message_ids(msg);
            state
                .relay
                .reply_copy(admin, target, chat, message_id, &summary_of(msg))
                .await
        }
    };
    if let Err(e) = &result {
        tracing::warn!(
            admin = admin.0,
            target_user = target.0,
            error = %e,
            "reply not delivered"
        );
    }

    state
        .dialogues
        .clear_if(admin, DialogueState::AdminReply { target })
        .await;
    state.relay.confirm_reply(admin, result.is_ok()).await;
}

pub(super) async fn handle_set_rules(
    msg: &Message,
    state: &AppState,
    admin: UserId,
    section: Section,
    kind: RuleKind,
) {
    if !still_admin(state, admin).await {
        return;
    }
    // Rules are shown with HTML parse mode, so they are stored rendered.
    let Some(html) = message_html(msg) else {
        state.relay.notify(admin.into(), texts::RULES_NEED_TEXT).await;
        return;
    };

    match state.store().set_rules(section, kind, &html).await {
        Ok(()) => {
            state
                .dialogues
                .clear_if(admin, DialogueState::SetRules { section, kind })
                .await;
            state.relay.notify(admin.into(), texts::RULES_SAVED).await;
        }
        Err(e) => {
            tracing::warn!(admin = admin.0, error = %e, "failed to store rules");
            state.relay.notify(admin.into(), texts::STORE_ERROR).await;
        }
    }
}
