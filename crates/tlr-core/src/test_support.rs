//! In-memory `MessagingPort` for tests.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatPermissions, CommandSpec, InlineKeyboard},
    },
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
    },
    Reply {
        to: MessageRef,
        text: String,
    },
    Keyboard {
        chat_id: ChatId,
        text: String,
        keyboard: InlineKeyboard,
    },
}

impl Sent {
    pub fn text(&self) -> &str {
        match self {
            Sent::Text { text, .. } | Sent::Reply { text, .. } | Sent::Keyboard { text, .. } => {
                text
            }
        }
    }
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: Mutex<i32>,
    sent: Mutex<Vec<Sent>>,
    edits: Mutex<Vec<(MessageRef, String)>>,
    deleted: Mutex<Vec<MessageRef>>,
    delete_attempts: AtomicUsize,
    failing_deletes: Mutex<HashSet<MessageRef>>,
    answered: Mutex<Vec<(String, Option<String>)>>,
    commands: Mutex<Vec<CommandSpec>>,
    deny_delete: AtomicBool,
    fail_permission_check: AtomicBool,
}

impl FakeMessenger {
    fn alloc(&self, chat_id: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        if *guard == 0 {
            *guard = 1000;
        }
        let id = *guard;
        *guard += 1;
        MessageRef {
            chat_id,
            message_id: MessageId(id),
        }
    }

    pub fn fail_deletes_of(&self, msg: MessageRef) {
        self.failing_deletes.lock().unwrap().insert(msg);
    }

    pub fn deny_delete_permission(&self) {
        self.deny_delete.store(true, Ordering::SeqCst);
    }

    pub fn fail_permission_check(&self) {
        self.fail_permission_check.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().iter().map(|s| s.text().to_string()).collect()
    }

    pub fn edits(&self) -> Vec<(MessageRef, String)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }

    pub fn answered(&self) -> Vec<(String, Option<String>)> {
        self.answered.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(self.alloc(chat_id))
    }

    async fn reply_text(&self, to: MessageRef, text: &str) -> Result<MessageRef> {
        self.sent.lock().unwrap().push(Sent::Reply {
            to,
            text: text.to_string(),
        });
        Ok(self.alloc(to.chat_id))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
        _reply_to: Option<MessageRef>,
    ) -> Result<MessageRef> {
        self.sent.lock().unwrap().push(Sent::Keyboard {
            chat_id,
            text: text.to_string(),
            keyboard,
        });
        Ok(self.alloc(chat_id))
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.edits.lock().unwrap().push((msg, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.lock().unwrap().contains(&msg) {
            return Err(Error::Transport("message to delete not found".to_string()));
        }
        self.deleted.lock().unwrap().push(msg);
        Ok(())
    }

    async fn self_permissions(&self, _chat_id: ChatId) -> Result<ChatPermissions> {
        if self.fail_permission_check.load(Ordering::SeqCst) {
            return Err(Error::Transport("getChatMember timed out".to_string()));
        }
        Ok(ChatPermissions {
            can_delete_messages: !self.deny_delete.load(Ordering::SeqCst),
        })
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.answered
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.map(str::to_string)));
        Ok(())
    }

    async fn register_commands(&self, commands: &[CommandSpec]) -> Result<()> {
        *self.commands.lock().unwrap() = commands.to_vec();
        Ok(())
    }
}
