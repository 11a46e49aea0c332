//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - converts the teloxide update into a core `IncomingUpdate`
//! - hands it to the core dispatcher
//! - logs (and drops) any failure so one bad update never stops polling

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};
use tracing::error;

use tlr_core::messaging::types::IncomingUpdate;

use crate::router::AppState;

mod callback;
mod message;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = callback::to_update(&q) else {
        // Button on an inaccessible message: nothing to route, just stop the spinner.
        if let Err(e) = state.messenger.answer_callback_query(&q.id, None).await {
            error!("failed to answer callback {}: {e}", q.id);
        }
        return Ok(());
    };
    dispatch(update, &state).await;
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(update) = message::to_update(&msg, state.bot_id) {
        dispatch(update, &state).await;
    }
    Ok(())
}

async fn dispatch(update: IncomingUpdate, state: &AppState) {
    let kind = update.kind_name();
    let chat_id = update.chat_id();
    if let Err(e) = state.dispatcher.handle(update).await {
        error!(kind, chat_id = chat_id.0, "failed to handle update: {e}");
    }
}
