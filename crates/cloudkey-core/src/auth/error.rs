use thiserror::Error;

use crate::command::{Command, USAGE};
use crate::config::StoreError;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("You are already logged in. To {}, please log out first.", .0.retry_hint())]
    AlreadyAuthenticated(Command),

    #[error("Unknown command {command:?}. Usage: {}", USAGE)]
    Usage { command: String },

    #[error("No {field} entered, aborting")]
    InputAborted { field: String },

    #[error("Failed to read input: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("Failed to save session: {0}")]
    Persistence(#[from] StoreError),
}

impl AccountError {
    /// Errors that end the invocation with a non-zero exit status.
    /// Rejecting a login because one already exists is only reported.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AccountError::AlreadyAuthenticated(_))
    }
}
