use std::sync::Arc;

use tlr_core::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), tlr_core::Error> {
    tlr_core::logging::init("tlr")?;

    let cfg = Arc::new(Config::load()?);
    info!(
        post_deletion_notices = cfg.post_deletion_notices,
        max_delete_delay_secs = cfg.max_delete_delay.as_secs(),
        "configuration loaded"
    );

    tlr_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| tlr_core::Error::Transport(format!("telegram bot failed: {e}")))?;

    Ok(())
}
