use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatPermissions, CommandSpec, InlineKeyboard},
    Result,
};

/// Outbound side of the chat transport.
///
/// Every call is a network round-trip that may fail; callers decide whether a
/// failure is user-visible or just logged.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Send `text` as a reply threaded to `to`.
    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<MessageRef>;

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
        reply_to: Option<MessageRef>,
    ) -> Result<MessageRef>;

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    /// The bot's own rights in `chat_id`.
    async fn self_permissions(&self, chat_id: ChatId) -> Result<ChatPermissions>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    async fn register_commands(&self, commands: &[CommandSpec]) -> Result<()>;
}
