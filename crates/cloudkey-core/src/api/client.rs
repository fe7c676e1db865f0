//! HTTP client for the identity service.

use std::future::Future;
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{header, Client};
use tracing::debug;

use super::AuthResult;

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the identity service
const AUTH_BASE_URL: &str = "https://auth.epirus.io";

/// Path of the create-account endpoint
const CREATE_ACCOUNT_PATH: &str = "/auth/realms/EpirusPortal/web3j-token/create";

/// Path of the login endpoint
const LOGIN_PATH: &str = "/api/api-token-auth/";

/// HTTP request timeout in seconds.
/// 30s allows for a slow identity service without hanging the terminal.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the HTTP client shared by every network call in the process.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("cloudkey/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// The two remote account operations.
pub trait IdentityService {
    fn create_account(&self, identifier: &str) -> impl Future<Output = AuthResult> + Send;

    fn login(&self, identifier: &str, secret: &str) -> impl Future<Output = AuthResult> + Send;
}

/// Identity service client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, AUTH_BASE_URL)
    }

    /// Point the client at another deployment of the identity service
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_form(&self, url: &str, form: Form) -> AuthResult {
        let response = match self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(url = url, error = %e, "Identity service unreachable");
                return AuthResult::TransportError {
                    cause: e.to_string(),
                };
            }
        };

        let status = response.status().as_u16();
        debug!(url = url, status = status, "Identity service responded");

        // Reading the body to the end consumes the response, which hands the
        // connection back to the pool on every path below.
        match response.text().await {
            Ok(body) => AuthResult::from_response(status, &body),
            Err(e) => {
                debug!(url = url, status = status, error = %e, "Failed to read response body");
                AuthResult::TransportError {
                    cause: e.to_string(),
                }
            }
        }
    }
}

impl IdentityService for AuthClient {
    async fn create_account(&self, identifier: &str) -> AuthResult {
        let url = self.url(CREATE_ACCOUNT_PATH);
        let form = Form::new().text("email", identifier.to_string());
        self.post_form(&url, form).await
    }

    async fn login(&self, identifier: &str, secret: &str) -> AuthResult {
        let url = self.url(LOGIN_PATH);
        let form = Form::new()
            .text("username", identifier.to_string())
            .text("password", secret.to_string());
        self.post_form(&url, form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_client, serve_once};
    use std::net::TcpListener;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = AuthClient::with_base_url(Client::new(), "http://localhost:9000/");
        assert_eq!(
            client.url(LOGIN_PATH),
            "http://localhost:9000/api/api-token-auth/"
        );
    }

    #[tokio::test]
    async fn test_create_account_posts_multipart_email() {
        let (base_url, server) = serve_once(200, r#"{"token":"abc123"}"#);
        let client = AuthClient::with_base_url(local_client(), base_url);

        let result = client.create_account("a@b.com").await;
        let request = server.join().unwrap();

        match result {
            AuthResult::Success { token } => assert_eq!(token.as_str(), "abc123"),
            other => panic!("expected success, got {:?}", other),
        }
        assert!(request.head.starts_with(&format!("POST {} ", CREATE_ACCOUNT_PATH)));
        assert!(request
            .header("content-type")
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
        assert_eq!(request.part("email").as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn test_login_posts_multipart_credentials() {
        let (base_url, server) = serve_once(401, r#"{"detail":"Invalid credentials"}"#);
        let client = AuthClient::with_base_url(local_client(), base_url);

        let result = client.login("a@b.com", "wrong").await;
        let request = server.join().unwrap();

        assert!(matches!(result, AuthResult::Failure { status: 401, .. }));
        assert!(request.head.starts_with(&format!("POST {} ", LOGIN_PATH)));
        assert!(request
            .header("content-type")
            .unwrap()
            .starts_with("multipart/form-data"));
        assert_eq!(request.part("username").as_deref(), Some("a@b.com"));
        assert_eq!(request.part("password").as_deref(), Some("wrong"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing is listening on
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let client = AuthClient::with_base_url(local_client(), format!("http://{}", addr));

        let result = client.create_account("a@b.com").await;
        assert!(matches!(result, AuthResult::TransportError { .. }));
    }
}
