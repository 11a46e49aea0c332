use teloxide::types::{Chat, Message, MessageEntityKind};

use tlr_core::{
    domain::{ChatId, ChatKind, MessageId, MessageRef, UserId},
    intake::parse_command,
    messaging::types::{Command, IncomingUpdate, MembersJoined, TextMessage},
};

pub(super) fn chat_kind(chat: &Chat) -> ChatKind {
    if chat.is_private() {
        ChatKind::Private
    } else {
        ChatKind::Group
    }
}

/// A command is a message that opens with a `bot_command` entity;
/// a bare leading `/` is ordinary text.
fn starts_with_command(msg: &Message) -> bool {
    msg.entities().is_some_and(|entities| {
        entities
            .iter()
            .any(|e| e.offset == 0 && matches!(e.kind, MessageEntityKind::BotCommand))
    })
}

/// Map a Telegram message to a core update; `None` for message types the bot
/// does not act on (media, service messages other than joins, ...).
pub(super) fn to_update(msg: &Message, bot_id: UserId) -> Option<IncomingUpdate> {
    let chat_id = ChatId(msg.chat.id.0);
    let chat_kind = chat_kind(&msg.chat);
    let message = MessageRef {
        chat_id,
        message_id: MessageId(msg.id.0),
    };

    if let Some(members) = msg.new_chat_members() {
        let new_members: Vec<UserId> = members.iter().map(|u| UserId(u.id.0 as i64)).collect();
        let bot_added = new_members.contains(&bot_id);
        return Some(IncomingUpdate::MembersJoined(MembersJoined {
            chat_id,
            chat_kind,
            message,
            new_members,
            bot_added,
        }));
    }

    let text = msg.text()?;
    // Channel posts and anonymous admins have no `from`; key them by chat.
    let user_id = msg
        .from()
        .map(|u| UserId(u.id.0 as i64))
        .unwrap_or(UserId(chat_id.0));

    if starts_with_command(msg) {
        let (name, args) = parse_command(text);
        return Some(IncomingUpdate::Command(Command {
            chat_id,
            chat_kind,
            user_id,
            message,
            name,
            args,
        }));
    }

    Some(IncomingUpdate::Text(TextMessage {
        chat_id,
        chat_kind,
        user_id,
        message,
        text: text.to_string(),
    }))
}
