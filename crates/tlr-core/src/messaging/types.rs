use crate::domain::{ChatId, ChatKind, MessageRef, UserId};

/// Messenger-agnostic incoming update.
///
/// Telegram-specific fields stay in the Telegram adapter.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(Command),
    Text(TextMessage),
    Callback(CallbackQuery),
    MembersJoined(MembersJoined),
}

#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub user_id: UserId,
    pub message: MessageRef,
    /// Lowercased, without the leading `/` or `@botname` suffix.
    pub name: String,
    pub args: String,
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub user_id: UserId,
    pub message: MessageRef,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub user_id: UserId,
    pub callback_id: String,
    pub data: String,
    /// The message carrying the pressed button, when still accessible.
    pub message: Option<MessageRef>,
}

#[derive(Clone, Debug)]
pub struct MembersJoined {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message: MessageRef,
    pub new_members: Vec<UserId>,
    /// Whether the bot itself is among `new_members`.
    pub bot_added: bool,
}

impl IncomingUpdate {
    pub fn chat_id(&self) -> ChatId {
        match self {
            IncomingUpdate::Command(c) => c.chat_id,
            IncomingUpdate::Text(t) => t.chat_id,
            IncomingUpdate::Callback(q) => q.chat_id,
            IncomingUpdate::MembersJoined(m) => m.chat_id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            IncomingUpdate::Command(_) => "command",
            IncomingUpdate::Text(_) => "text",
            IncomingUpdate::Callback(_) => "callback",
            IncomingUpdate::MembersJoined(_) => "members_joined",
        }
    }
}

/// The bot's own rights in a chat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChatPermissions {
    pub can_delete_messages: bool,
}

/// A command advertised in the client's command menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// Inline keyboard (buttons) carrying callback payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn single(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            buttons: vec![InlineButton {
                label: label.into(),
                callback_data: callback_data.into(),
            }],
        }
    }
}
