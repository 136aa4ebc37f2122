use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::MessageEntity};

use arb_core::messaging::throttled::{ThrottleConfig, ThrottledAlbums, ThrottledMessenger};
use arb_core::{
    album::{AlbumCollector, AlbumDelivery},
    config::Config,
    dialogue::Dialogues,
    messaging::port::{AlbumPort, MessagingPort},
    relay::Relay,
    store::{defaults::DEFAULT_RULES, FileStore, RelayStore},
    utils::MessageLog,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub relay: Arc<Relay>,
    pub dialogues: Arc<Dialogues>,
    pub albums: AlbumCollector<MessageEntity>,
    /// Used for the "open private chat" deep link in groups.
    pub bot_username: Option<String>,
}

impl AppState {
    pub fn store(&self) -> &dyn RelayStore {
        self.relay.store.as_ref()
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let bot_username = match bot.get_me().await {
        Ok(me) => {
            let username = me.user.username.clone();
            tracing::info!(bot = ?username, "arb started");
            username
        }
        Err(e) => {
            tracing::warn!(error = %e, "getMe failed; group deep links disabled");
            None
        }
    };

    let store = Arc::new(FileStore::open(cfg.store_path.clone()).await?);
    store.seed(DEFAULT_RULES, &cfg.admin_seed_ids).await?;
    let stats = store.stats().await?;
    tracing::info!(
        store = %cfg.store_path.display(),
        users = stats.users,
        active_groups = stats.active_groups,
        admins_seeded = cfg.admin_seed_ids.len(),
        "store ready"
    );

    // Broadcasts fan out to every user or group, so all outbound traffic
    // (albums included) shares one throttle. 429s are still retried once in
    // the adapter.
    let tg = Arc::new(TelegramMessenger::new(bot.clone()));
    let throttled = Arc::new(ThrottledMessenger::new(
        tg.clone(),
        ThrottleConfig::default(),
    ));
    let messenger: Arc<dyn MessagingPort> = throttled.clone();
    let albums: Arc<dyn AlbumPort<MessageEntity>> =
        Arc::new(ThrottledAlbums::<MessageEntity>::new(tg, throttled));

    let relay = Arc::new(Relay::new(
        messenger,
        store,
        Arc::new(MessageLog::new(cfg.message_log_path.clone())),
    ));
    let dialogues = Arc::new(Dialogues::default());
    let albums = AlbumDelivery::new(relay.clone(), dialogues.clone(), albums)
        .into_collector(cfg.album_quiet_interval);

    let state = Arc::new(AppState {
        cfg,
        relay,
        dialogues,
        albums,
        bot_username,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
