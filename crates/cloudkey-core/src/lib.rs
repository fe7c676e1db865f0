//! Core library for cloudkey.
//!
//! This crate holds everything the `cloudkey` binary needs apart from the
//! terminal itself:
//! - `config`: the persisted configuration document and the `SessionStore` seam
//! - `api`: the identity service client and its typed `AuthResult`
//! - `auth`: the account session state machine
//! - `command`: the `create | login | logout` dispatcher
//! - `prompt`: the credential prompt capability
//! - `update`: the new-version check

pub mod api;
pub mod auth;
pub mod command;
pub mod config;
pub mod prompt;
pub mod update;

#[cfg(test)]
mod test_support;

/// Log filter used when `RUST_LOG` is not set. Warnings are visible to the
/// user on stderr, so they carry no server-supplied text.
pub const DEFAULT_LOG_FILTER: &str = "warn";

pub use api::{AuthClient, AuthResult, IdentityService};
pub use auth::{AccountError, AccountSession, CredentialInput, Outcome, SessionState, SessionToken};
pub use command::{Command, Dispatcher};
pub use config::{Config, MemoryStore, SessionStore, StoreError};
pub use prompt::{Prompt, ScriptedPrompt};
pub use update::{UpdateCheck, UpdateError, UpdateInfo, Updater};
