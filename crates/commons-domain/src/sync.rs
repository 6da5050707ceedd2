//! Directory sync job state machine and its wire messages.
//!
//! A job is `Running` until it reaches exactly one terminal state. Progress
//! never decreases within a run, and only the successful terminal state
//! reports 100.

use serde::{Deserialize, Serialize};

/// Highest progress value a job may report before it has a result.
pub const MAX_RUNNING_PROGRESS: u8 = 99;

/// Counts reported when a sync completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Guests seen across all imported events.
    pub total: u64,
    /// People rows created.
    pub created: u64,
    /// Guests without an email, duplicates, and rows that already existed.
    pub skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Running { progress: u8, message: String },
    Succeeded { message: String, result: SyncResult },
    Failed { progress: u8, message: String },
}

impl SyncState {
    pub fn started() -> Self {
        Self::Running {
            progress: 0,
            message: "Starting sync...".to_owned(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running { .. })
    }

    pub fn progress(&self) -> u8 {
        match self {
            Self::Running { progress, .. } | Self::Failed { progress, .. } => *progress,
            Self::Succeeded { .. } => 100,
        }
    }

    /// Move a running job forward. Lower progress values than the current one
    /// keep the current value; terminal states are left untouched.
    ///
    /// Returns `true` when the state changed.
    pub fn advance(&mut self, progress: u8, message: impl Into<String>) -> bool {
        let Self::Running {
            progress: current,
            message: current_message,
        } = self
        else {
            return false;
        };
        let next = progress.min(MAX_RUNNING_PROGRESS).max(*current);
        let message = message.into();
        if next == *current && message == *current_message {
            return false;
        }
        *current = next;
        *current_message = message;
        true
    }

    /// Returns `true` when the state changed.
    pub fn succeed(&mut self, message: impl Into<String>, result: SyncResult) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = Self::Succeeded {
            message: message.into(),
            result,
        };
        true
    }

    /// Returns `true` when the state changed.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = Self::Failed {
            progress: self.progress(),
            message: message.into(),
        };
        true
    }

    /// Wire message describing this state.
    pub fn to_message(&self) -> SyncMessage {
        match self {
            Self::Running { progress, message } => SyncMessage::Status {
                message: message.clone(),
                progress: *progress,
                data: None,
            },
            Self::Succeeded { message, result } => SyncMessage::Status {
                message: message.clone(),
                progress: 100,
                data: Some(*result),
            },
            Self::Failed { message, .. } => SyncMessage::Error {
                message: message.clone(),
            },
        }
    }
}

/// Message pushed to event-stream subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    Status {
        message: String,
        progress: u8,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        data: Option<SyncResult>,
    },
    Error {
        message: String,
    },
}

impl SyncMessage {
    /// Terminal messages end the stream: errors, and status messages carrying data.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Status { data, .. } => data.is_some(),
            Self::Error { .. } => true,
        }
    }
}
