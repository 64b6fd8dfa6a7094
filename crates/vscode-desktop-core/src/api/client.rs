use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::auth::DeploymentSession;
use crate::launch::{Credential, CredentialProvider};

const SESSION_TOKEN_HEADER: &str = "Coder-Session-Token";
const USER_AGENT: &str = concat!("vscode-desktop/", env!("CARGO_PKG_VERSION"));

/// Errors returned by the Coder API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status} body: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("invalid deployment URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to deserialize response: {0}")]
    Deserialize(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Minimal client for the Coder deployment REST API.
#[derive(Debug, Clone)]
pub struct CoderClient {
    http: Client,
    base_url: Url,
    session_token: String,
}

impl CoderClient {
    /// Build a client for the deployment and token held by `session`.
    pub fn from_session(session: &DeploymentSession) -> ApiResult<Self> {
        Self::new(session.url.clone(), session.session_token.clone())
    }

    pub fn new(base_url: Url, session_token: String) -> ApiResult<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url,
            session_token,
        })
    }

    /// Mint a new API key for the authenticated user.
    pub async fn create_api_key(&self) -> ApiResult<GenerateApiKeyResponse> {
        self.request(Method::POST, "api/v2/users/me/keys").await
    }

    /// Fetch the authenticated user.
    pub async fn current_user(&self) -> ApiResult<User> {
        self.request(Method::GET, "api/v2/users/me").await
    }

    async fn request<R>(&self, method: Method, path: &str) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "coder api request");
        let response = self
            .http
            .request(method, url)
            .header(SESSION_TOKEN_HEADER, &self.session_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatus { status, body: text });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        // Deployments may be served under a path prefix.
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let prefixed = format!("{}/", base.path());
            base.set_path(&prefixed);
        }
        Ok(base.join(path)?)
    }
}

#[async_trait]
impl CredentialProvider for CoderClient {
    type Error = ApiError;

    async fn fetch_credential(&self) -> Result<Credential, ApiError> {
        let response = self.create_api_key().await?;
        Ok(Credential::new(response.key))
    }
}

/// Body of `POST /api/v2/users/me/keys`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateApiKeyResponse {
    pub key: String,
}

/// Subset of user fields used to default the workspace owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> CoderClient {
        CoderClient::new(Url::parse(&server.base_url()).unwrap(), "sess".into()).unwrap()
    }

    #[tokio::test]
    async fn create_api_key_posts_with_session_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/users/me/keys")
                .header("Coder-Session-Token", "sess");
            then.status(201)
                .json_body_obj(&serde_json::json!({ "key": "abc-123" }));
        });

        let key = client_for(&server).create_api_key().await.unwrap();
        mock.assert();
        assert_eq!(key.key, "abc-123");
    }

    #[tokio::test]
    async fn fetch_credential_wraps_key() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/users/me/keys");
            then.status(201)
                .json_body_obj(&serde_json::json!({ "key": "tok123" }));
        });

        let credential = client_for(&server).fetch_credential().await.unwrap();
        assert_eq!(credential.key(), "tok123");
    }

    #[tokio::test]
    async fn unauthorized_surfaces_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/users/me/keys");
            then.status(401).body("unauthorized");
        });

        let err = client_for(&server).create_api_key().await.unwrap_err();
        match err {
            ApiError::HttpStatus { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn current_user_parses_username() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2/users/me")
                .header("Coder-Session-Token", "sess");
            then.status(200).json_body_obj(&serde_json::json!({
                "id": "8f1c",
                "username": "alice",
                "email": "alice@example.com",
                "roles": []
            }));
        });

        let user = client_for(&server).current_user().await.unwrap();
        mock.assert();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn path_prefixed_deployment_keeps_prefix() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/coder/api/v2/users/me");
            then.status(200)
                .json_body_obj(&serde_json::json!({ "id": "1", "username": "bob" }));
        });

        let base = Url::parse(&format!("{}/coder", server.base_url())).unwrap();
        let client = CoderClient::new(base, "sess".into()).unwrap();
        let user = client.current_user().await.unwrap();
        mock.assert();
        assert_eq!(user.username, "bob");
    }
}
