//! Terminal implementation of the credential prompt.

use std::io::{self, BufRead, Write};

use cloudkey_core::prompt::{accept_input, Prompt};
use cloudkey_core::AccountError;

pub struct TerminalPrompt;

impl TerminalPrompt {
    fn label(field: &str) -> String {
        format!("Please enter your {}: ", field)
    }
}

impl Prompt for TerminalPrompt {
    fn read_line(&mut self, field: &str) -> Result<String, AccountError> {
        print!("{}", Self::label(field));
        io::stdout().flush()?;

        read_from(&mut io::stdin().lock(), field)
    }

    fn read_secret(&mut self, field: &str) -> Result<String, AccountError> {
        secret_from(field, rpassword::prompt_password(Self::label(field)))
    }
}

/// Read one answer from `reader`. Zero bytes read is end of input.
fn read_from<R: BufRead>(reader: &mut R, field: &str) -> Result<String, AccountError> {
    let mut input = String::new();
    let read = reader.read_line(&mut input)?;
    accept_input(field, (read > 0).then_some(input))
}

fn secret_from(field: &str, read: io::Result<String>) -> Result<String, AccountError> {
    match read {
        Ok(secret) => accept_input(field, Some(secret)),
        // Closed stdin reads as end of input rather than a failure
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => accept_input(field, None),
        Err(e) => Err(e.into()),
    }
}
