//! UI/backend events and error modeling for desktop GUI controller.

use shared::domain::PersistedTicket;
use ticket_core::{SubmitError, TicketView};

pub enum UiEvent {
    Info(String),
    Error(UiError),
    Navigate(String),
    SubmissionFinished(Result<PersistedTicket, SubmitError>),
    TicketLoaded(TicketView),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Storage,
    FileAccess,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    PickAvatar,
    ClearTicket,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("sqlite")
            || message_lower.contains("database")
            || message_lower.contains("store")
        {
            UiErrorCategory::Storage
        } else if message_lower.contains("permission denied")
            || message_lower.contains("no such file")
            || message_lower.contains("not found")
            || message_lower.contains("not a regular file")
        {
            UiErrorCategory::FileAccess
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Without a working store nothing can be submitted or shown.
    pub fn is_fatal(&self) -> bool {
        self.context == UiErrorContext::BackendStartup
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
