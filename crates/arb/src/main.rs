use std::sync::Arc;

use arb_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), arb_core::Error> {
    arb_core::logging::init("arb")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        store = %cfg.store_path.display(),
        message_log = %cfg.message_log_path.display(),
        album_quiet_ms = cfg.album_quiet_interval.as_millis() as u64,
        "configuration loaded"
    );

    arb_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| arb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
