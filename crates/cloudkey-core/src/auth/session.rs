//! The account session state machine.
//!
//! `AccountSession` owns the session store and the identity service for the
//! duration of one command. Every accepted transition is written through the
//! store before the caller hears about it.

use std::fmt;

use tracing::{debug, info, warn};

use super::{AccountError, CredentialInput, SessionToken};
use crate::api::{AuthResult, IdentityService};
use crate::command::Command;
use crate::config::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// User-visible result of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    AccountCreated,
    LoggedIn,
    LoggedOut,
    CreateFailed,
    LoginFailed,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::AccountCreated | Outcome::LoggedIn | Outcome::LoggedOut
        )
    }

    pub fn message(&self) -> &'static str {
        match self {
            Outcome::AccountCreated => {
                "Account created successfully. Please confirm your e-mail within 24 hours \
                 to continue using all features without interruption."
            }
            Outcome::LoggedIn => "You have been successfully logged in.",
            Outcome::LoggedOut => "Logged out successfully.",
            Outcome::CreateFailed => "Account creation failed. Please try again later.",
            Outcome::LoginFailed => {
                "Error while attempting to log you in. Please check your username and \
                 password, and if the problem persists, try again later."
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub struct AccountSession<S, C> {
    store: S,
    client: C,
}

impl<S: SessionStore, C: IdentityService> AccountSession<S, C> {
    pub fn new(store: S, client: C) -> Self {
        Self { store, client }
    }

    pub fn state(&self) -> SessionState {
        if self.store.token().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Reject `command` if a session already exists. Checked before any
    /// prompt or network call.
    pub fn ensure_anonymous(&self, command: Command) -> Result<(), AccountError> {
        if self.is_authenticated() {
            return Err(AccountError::AlreadyAuthenticated(command));
        }
        Ok(())
    }

    pub async fn create(&mut self, identifier: &str) -> Result<Outcome, AccountError> {
        self.ensure_anonymous(Command::Create)?;

        let result = self.client.create_account(identifier).await;
        match result {
            AuthResult::Success { token } => {
                self.persist_token(Some(token))?;
                info!("Account created");
                Ok(Outcome::AccountCreated)
            }
            failure => {
                log_failure(Command::Create, &failure);
                Ok(Outcome::CreateFailed)
            }
        }
    }

    pub async fn login(&mut self, credentials: &CredentialInput) -> Result<Outcome, AccountError> {
        self.ensure_anonymous(Command::Login)?;

        let secret = credentials
            .secret
            .as_deref()
            .ok_or_else(|| AccountError::InputAborted {
                field: "password".to_string(),
            })?;

        let result = self.client.login(&credentials.identifier, secret).await;
        match result {
            AuthResult::Success { token } => {
                self.persist_token(Some(token))?;
                info!("Logged in");
                Ok(Outcome::LoggedIn)
            }
            failure => {
                log_failure(Command::Login, &failure);
                Ok(Outcome::LoginFailed)
            }
        }
    }

    /// Local only; the token is simply forgotten. Logging out while anonymous
    /// is accepted and reported the same way.
    pub fn logout(&mut self) -> Result<Outcome, AccountError> {
        let was_authenticated = self.is_authenticated();
        self.persist_token(None)?;
        info!(was_authenticated, "Logged out");
        Ok(Outcome::LoggedOut)
    }

    /// Write `token` through the store. On failure the in-memory value is
    /// restored so state() keeps matching what is on disk.
    fn persist_token(&mut self, token: Option<SessionToken>) -> Result<(), AccountError> {
        let previous = self.store.token().cloned();
        self.store.set_token(token);

        if let Err(e) = self.store.save() {
            debug!(error = %e, "Failed to persist session, rolling back");
            self.store.set_token(previous);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Server-supplied text stays at debug; only the status reaches warn.
fn log_failure(command: Command, result: &AuthResult) {
    match result {
        AuthResult::Failure { status, message } => {
            warn!(command = %command, status = *status, "Identity service rejected request");
            debug!(command = %command, status = *status, detail = %message, "Rejection detail");
        }
        AuthResult::TransportError { cause } => {
            warn!(command = %command, "Identity service request failed");
            debug!(command = %command, cause = %cause, "Transport failure detail");
        }
        AuthResult::Success { .. } => {}
    }
}
