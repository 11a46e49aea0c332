use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{debug, info, warn};

use tlr_core::{
    config::Config, dialog::DialogStore, domain::UserId, intake,
    messaging::port::MessagingPort, policy::PolicyStore, scheduler::DeferredScheduler,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<intake::Dispatcher>,
    pub messenger: Arc<dyn MessagingPort>,
    pub bot_id: UserId,
}

/// Connect to Telegram and process updates until Ctrl-C.
///
/// Only failing to reach Telegram at startup is an error; everything after
/// that is logged and survived.
pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("failed to reach Telegram: {e}"))?;
    let bot_id = UserId(me.user.id.0 as i64);
    let username = me.user.username.clone();
    info!(
        username = username.as_deref().unwrap_or("<none>"),
        "bot started"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone(), bot_id));
    let scheduler = DeferredScheduler::spawn();
    let policies = Arc::new(PolicyStore::new());
    let dialogs = Arc::new(DialogStore::new());
    let dispatcher = Arc::new(
        intake::Dispatcher::new(
            cfg.clone(),
            messenger.clone(),
            scheduler.clone(),
            policies.clone(),
            dialogs,
        )
        .with_bot_username(username),
    );

    if let Err(e) = dispatcher.register_commands().await {
        warn!("failed to register bot commands: {e}");
    }

    let state = Arc::new(AppState {
        dispatcher,
        messenger,
        bot_id,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!(id = ?upd.id, "ignoring unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!(
        policies = policies.len(),
        pending_deletions = scheduler.pending(),
        "shutting down"
    );
    scheduler.shutdown().await;

    Ok(())
}
