use serde::Deserialize;

use crate::auth::SessionToken;

/// Maximum length for response bodies carried in failure messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Outcome of one identity service call.
#[derive(Debug)]
pub enum AuthResult {
    Success { token: SessionToken },

    /// The service answered, but not with a usable token
    Failure { status: u16, message: String },

    /// The service could not be reached or the response could not be read
    TransportError { cause: String },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

impl AuthResult {
    /// Interpret a completed HTTP exchange. Only status 200 with a JSON
    /// object carrying a non-empty `token` string counts as success.
    pub fn from_response(status: u16, body: &str) -> Self {
        if status != 200 {
            return AuthResult::Failure {
                status,
                message: truncate_body(body),
            };
        }

        let parsed: TokenResponse = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return AuthResult::Failure {
                    status,
                    message: format!("Malformed token response: {}", e),
                }
            }
        };

        match SessionToken::new(parsed.token) {
            Ok(token) => AuthResult::Success { token },
            Err(e) => AuthResult::Failure {
                status,
                message: e.to_string(),
            },
        }
    }
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
