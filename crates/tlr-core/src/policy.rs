//! Per-chat deletion policies (in-memory, process lifetime).

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, Result};

/// Configured auto-deletion delay for one chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatDeletionPolicy {
    pub delay_seconds: u64,
}

impl ChatDeletionPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

/// chat id -> deletion delay. Absence means auto-deletion is disabled.
#[derive(Debug, Default)]
pub struct PolicyStore {
    inner: RwLock<HashMap<ChatId, ChatDeletionPolicy>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable (or overwrite) auto-deletion for `chat_id`.
    pub fn set(&self, chat_id: ChatId, delay_seconds: u64) -> Result<()> {
        if delay_seconds == 0 {
            return Err(Error::Validation(
                "deletion delay must be a positive number of seconds".to_string(),
            ));
        }
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chat_id, ChatDeletionPolicy { delay_seconds });
        Ok(())
    }

    pub fn get(&self, chat_id: ChatId) -> Option<ChatDeletionPolicy> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chat_id)
            .copied()
    }

    /// Disable auto-deletion; returns whether a policy was present.
    pub fn clear(&self, chat_id: ChatId) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chat_id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
