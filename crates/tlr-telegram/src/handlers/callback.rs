use teloxide::types::CallbackQuery;

use tlr_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{self, IncomingUpdate},
};

use super::message::chat_kind;

/// `None` when the button's message is no longer available.
pub(super) fn to_update(q: &CallbackQuery) -> Option<IncomingUpdate> {
    let msg = q.message.as_ref()?;
    let chat_id = ChatId(msg.chat.id.0);

    Some(IncomingUpdate::Callback(types::CallbackQuery {
        chat_id,
        chat_kind: chat_kind(&msg.chat),
        user_id: UserId(q.from.id.0 as i64),
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
        message: Some(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }),
    }))
}
