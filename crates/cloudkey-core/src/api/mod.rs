//! Identity service client module.
//!
//! This module provides the `AuthClient` for the two account endpoints
//! (create-account and login) and the `IdentityService` trait it
//! implements, so the account session can be driven by a stand-in in tests.
//!
//! Every call resolves to an `AuthResult`; network and parse faults are
//! values here, never errors that reach the dispatcher.

pub mod client;
pub mod response;

pub use client::{http_client, AuthClient, IdentityService};
pub use response::AuthResult;
