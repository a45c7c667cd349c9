//! JetBrains Space chat backend: service-account token exchange and
//! channel messages.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::Credentials;
use crate::error::{NotifyError, Result};

const TOKEN_PATH: &str = "oauth/token";
const SEND_MESSAGE_PATH: &str = "api/http/chats/messages/send-message";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(600);
const EXPIRY_SKEW: Duration = Duration::from_secs(30);

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Acquire whatever session the backend needs before sending.
    async fn authenticate(&self) -> Result<()>;

    /// Post `text` to the channel as-is. One attempt, no retry.
    async fn send_text_message(&self, channel_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_SKEW < self.expires_at
    }
}

/// Space client authenticated with a service account. Tokens are acquired
/// on first use and re-acquired once they expire.
pub struct SpaceClient {
    http: reqwest::Client,
    credentials: Credentials,
    token: Mutex<Option<AccessToken>>,
}

impl SpaceClient {
    pub fn with_service_account(credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("manifest-notify/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            credentials,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.credentials.server_url.trim_end_matches('/'), path)
    }

    async fn access_token(&self) -> Result<String> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }
        let token = self.request_token().await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    async fn request_token(&self) -> Result<AccessToken> {
        debug!(server = %self.credentials.server_url, "requesting service account token");
        let resp = self
            .http
            .post(self.url(TOKEN_PATH))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials"), ("scope", "**")])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let message = describe_error(&body);
            let rejected = [
                StatusCode::BAD_REQUEST,
                StatusCode::UNAUTHORIZED,
                StatusCode::FORBIDDEN,
            ];
            if rejected.contains(&status) {
                return Err(NotifyError::Auth(message));
            }
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            NotifyError::Auth(format!("malformed token response: {e}"))
        })?;
        let now = Instant::now();
        let expires_at = parsed
            .expires_in
            .and_then(|secs| now.checked_add(Duration::from_secs(secs)))
            .unwrap_or(now + DEFAULT_TOKEN_LIFETIME);
        Ok(AccessToken {
            value: parsed.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl ChatClient for SpaceClient {
    async fn authenticate(&self) -> Result<()> {
        self.access_token().await.map(|_| ())
    }

    async fn send_text_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let token = self.access_token().await?;
        let payload = serde_json::json!({
            "channel": format!("id:{channel_id}"),
            "content": {
                "className": "ChatMessage.Text",
                "text": text,
            },
        });

        debug!(channel = channel_id, bytes = text.len(), "posting chat message");
        let resp = self
            .http
            .post(self.url(SEND_MESSAGE_PATH))
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = describe_error(&resp.text().await.unwrap_or_default());
        if status == StatusCode::UNAUTHORIZED {
            return Err(NotifyError::Auth(message));
        }
        Err(NotifyError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(error),
            error_description: Some(desc),
        }) => format!("{error}: {desc}"),
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}
