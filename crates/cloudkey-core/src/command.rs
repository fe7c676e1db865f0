//! Command dispatch for `cloudkey create | login | logout`.
//!
//! `Command` parses the subcommand; the dispatcher gathers credentials
//! through the prompt and hands off to the account session.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::api::IdentityService;
use crate::auth::{AccountError, AccountSession, CredentialInput, Outcome};
use crate::config::SessionStore;
use crate::prompt::Prompt;

pub const USAGE: &str = "cloudkey create|login|logout";

/// Prompt label for the account email address
const EMAIL_FIELD: &str = "email address";

/// Prompt label for the account password
const PASSWORD_FIELD: &str = "password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Create,
    Login,
    Logout,
}

impl Command {
    /// Parse the process arguments that follow the program name.
    /// Exactly one subcommand is accepted.
    pub fn from_args<A: AsRef<str>>(args: &[A]) -> Result<Self, AccountError> {
        match args {
            [command] => command.as_ref().parse(),
            _ => Err(AccountError::Usage {
                command: args
                    .iter()
                    .map(|a| a.as_ref())
                    .collect::<Vec<_>>()
                    .join(" "),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::Login => "login",
            Command::Logout => "logout",
        }
    }

    /// What the user should do after logging out, for the
    /// already-logged-in message
    pub(crate) fn retry_hint(&self) -> &'static str {
        match self {
            Command::Create => "create a new account",
            Command::Login => "log in again",
            Command::Logout => "log out",
        }
    }
}

impl FromStr for Command {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Command::Create),
            "login" => Ok(Command::Login),
            "logout" => Ok(Command::Logout),
            other => Err(AccountError::Usage {
                command: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Dispatcher<S, C, P> {
    session: AccountSession<S, C>,
    prompt: P,
}

impl<S, C, P> Dispatcher<S, C, P>
where
    S: SessionStore,
    C: IdentityService,
    P: Prompt,
{
    pub fn new(session: AccountSession<S, C>, prompt: P) -> Self {
        Self { session, prompt }
    }

    pub fn session(&self) -> &AccountSession<S, C> {
        &self.session
    }

    /// Run `command`. Create and login are refused before any prompt when a
    /// session already exists.
    pub async fn dispatch(&mut self, command: Command) -> Result<Outcome, AccountError> {
        debug!(command = %command, "Dispatching");

        match command {
            Command::Create => {
                self.session.ensure_anonymous(command)?;
                let email = self.prompt.read_line(EMAIL_FIELD)?;
                self.session.create(&email).await
            }
            Command::Login => {
                self.session.ensure_anonymous(command)?;
                let email = self.prompt.read_line(EMAIL_FIELD)?;
                let password = self.prompt.read_secret(PASSWORD_FIELD)?;
                self.session
                    .login(&CredentialInput::with_secret(email, password))
                    .await
            }
            Command::Logout => self.session.logout(),
        }
    }
}
