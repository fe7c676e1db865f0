//! Account session management.
//!
//! This module provides:
//! - `SessionToken`: the opaque bearer credential, never empty
//! - `CredentialInput`: per-invocation email/password pair
//! - `AccountSession`: the anonymous/authenticated state machine
//! - `AccountError`: everything a command can fail with
//!
//! The session state is derived entirely from whether the store holds a
//! token. There is no expiry; a token stays until `logout` clears it.

pub mod error;
pub mod session;
pub mod token;

pub use error::AccountError;
pub use session::{AccountSession, Outcome, SessionState};
pub use token::{CredentialInput, SessionToken};
