//! Credential prompt capability.
//!
//! The dispatcher asks for each field by label ("email address",
//! "password"). Implementations return the trimmed line; an empty line or
//! end of input means the user gave up and is reported as `InputAborted`.

use std::collections::VecDeque;

use crate::auth::AccountError;

pub trait Prompt {
    fn read_line(&mut self, field: &str) -> Result<String, AccountError>;

    /// Read a value that should not be echoed
    fn read_secret(&mut self, field: &str) -> Result<String, AccountError> {
        self.read_line(field)
    }
}

impl<P: Prompt + ?Sized> Prompt for &mut P {
    fn read_line(&mut self, field: &str) -> Result<String, AccountError> {
        (**self).read_line(field)
    }

    fn read_secret(&mut self, field: &str) -> Result<String, AccountError> {
        (**self).read_secret(field)
    }
}

/// Turn a raw read into a credential value. `None` is end of input.
pub fn accept_input(field: &str, raw: Option<String>) -> Result<String, AccountError> {
    match raw.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(AccountError::InputAborted {
            field: field.to_string(),
        }),
    }
}

/// Prompt that answers from a fixed script, for tests and non-interactive use.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, T>(answers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Labels of every field requested so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn read_line(&mut self, field: &str) -> Result<String, AccountError> {
        self.asked.push(field.to_string());
        accept_input(field, self.answers.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_input_trims() {
        assert_eq!(accept_input("email", Some("  a@b.com \n".into())).unwrap(), "a@b.com");
    }

    #[test]
    fn test_blank_or_eof_is_aborted() {
        assert!(matches!(
            accept_input("email", Some("   \n".into())),
            Err(AccountError::InputAborted { .. })
        ));
        assert!(matches!(
            accept_input("email", None),
            Err(AccountError::InputAborted { .. })
        ));
    }

    #[test]
    fn test_scripted_prompt_runs_out() {
        let mut prompt = ScriptedPrompt::new(["a@b.com"]);
        assert_eq!(prompt.read_line("email address").unwrap(), "a@b.com");
        assert!(prompt.read_secret("password").is_err());
        assert_eq!(prompt.asked(), ["email address", "password"]);
    }

    #[test]
    fn test_borrowed_prompt_records_on_the_original() {
        let mut prompt = ScriptedPrompt::new(["a@b.com", "pw"]);
        {
            let mut borrowed = &mut prompt;
            assert_eq!(borrowed.read_line("email address").unwrap(), "a@b.com");
            assert_eq!(borrowed.read_secret("password").unwrap(), "pw");
        }
        assert_eq!(prompt.asked(), ["email address", "password"]);
    }
}
