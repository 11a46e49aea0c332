//! Interactive "set timer" dialog.
//!
//! State is keyed by (user, chat) so a user configuring one conversation never
//! sees input routed to another. Transitions:
//!
//! ```text
//! Idle --begin--> AwaitingSeconds --valid number--> AwaitingConfirmation{n} --confirm(n)--> Idle
//!                  |    ^                                   |
//!                  +----+ invalid input (retry in place)    +--confirm(m != n)--> unchanged
//! ```
//!
//! `cancel` returns any state to `Idle`.

use std::{
    collections::HashMap,
    num::IntErrorKind,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use crate::domain::{ChatId, UserId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingSeconds,
    AwaitingConfirmation {
        seconds: u64,
    },
}

/// Why a timer value was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelayInputError {
    NotANumber,
    NotPositive,
    TooLarge { max_seconds: u64 },
}

/// Parse a user-supplied delay (`" 30 "`, `"+30"`); must be in `1..=max`.
pub fn parse_delay_seconds(text: &str, max: Duration) -> Result<u64, DelayInputError> {
    let max_seconds = max.as_secs();
    let value = match text.trim().parse::<i64>() {
        Ok(v) => v,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
            return Err(DelayInputError::TooLarge { max_seconds })
        }
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => {
            return Err(DelayInputError::NotPositive)
        }
        Err(_) => return Err(DelayInputError::NotANumber),
    };
    if value <= 0 {
        return Err(DelayInputError::NotPositive);
    }
    let value = value as u64;
    if value > max_seconds {
        return Err(DelayInputError::TooLarge { max_seconds });
    }
    Ok(value)
}

/// Result of feeding text to a dialog waiting for seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SecondsOutcome {
    /// Value accepted; the dialog now waits for confirmation of it.
    Proposed(u64),
    /// Value rejected; the dialog keeps waiting for seconds.
    Rejected(DelayInputError),
    /// The dialog was not waiting for seconds.
    NotAwaiting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The proposal matched; caller commits the policy. Dialog is idle again.
    Confirmed(u64),
    /// No pending proposal for this value.
    Expired,
}

/// Per-(user, chat) dialog states. Idle entries are not stored.
#[derive(Debug, Default)]
pub struct DialogStore {
    inner: Mutex<HashMap<(UserId, ChatId), DialogState>>,
}

impl DialogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, user: UserId, chat: ChatId) -> DialogState {
        self.lock().get(&(user, chat)).copied().unwrap_or_default()
    }

    pub fn is_awaiting_seconds(&self, user: UserId, chat: ChatId) -> bool {
        self.state(user, chat) == DialogState::AwaitingSeconds
    }

    /// Start (or restart) the dialog.
    pub fn begin(&self, user: UserId, chat: ChatId) {
        self.lock().insert((user, chat), DialogState::AwaitingSeconds);
    }

    pub fn submit_seconds(
        &self,
        user: UserId,
        chat: ChatId,
        text: &str,
        max: Duration,
    ) -> SecondsOutcome {
        let mut map = self.lock();
        if map.get(&(user, chat)) != Some(&DialogState::AwaitingSeconds) {
            return SecondsOutcome::NotAwaiting;
        }
        match parse_delay_seconds(text, max) {
            Ok(seconds) => {
                map.insert((user, chat), DialogState::AwaitingConfirmation { seconds });
                SecondsOutcome::Proposed(seconds)
            }
            Err(e) => SecondsOutcome::Rejected(e),
        }
    }

    pub fn confirm(&self, user: UserId, chat: ChatId, seconds: u64) -> ConfirmOutcome {
        let mut map = self.lock();
        match map.get(&(user, chat)).copied() {
            Some(DialogState::AwaitingConfirmation { seconds: proposed }) if proposed == seconds => {
                map.remove(&(user, chat));
                ConfirmOutcome::Confirmed(seconds)
            }
            _ => ConfirmOutcome::Expired,
        }
    }

    /// Abandon the dialog; returns whether one was in progress.
    pub fn cancel(&self, user: UserId, chat: ChatId) -> bool {
        self.lock().remove(&(user, chat)).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(UserId, ChatId), DialogState>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
