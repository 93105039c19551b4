use std::time::Duration;

use async_trait::async_trait;
use log::{error, info};
use reqwest::Response;

use crate::config::AppConfig;
use crate::error::SessionError;
use crate::models::wire::{
    FetchRequest, FetchResponse, HistoryRequest, HistoryResponse, LoginRequest, LoginResponse,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The three backend endpoints the client depends on. A trait so the
/// sequencing tests can drive the controller against a mock backend.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Exchanges the Google identity token for a backend session token.
    async fn login(&self, identity_token: &str) -> Result<String, SessionError>;

    /// Triggers the backend email fetch; returns the number of emails
    /// fetched (used for status display only).
    async fn fetch_mail(
        &self,
        session_token: &str,
        access_token: &str,
    ) -> Result<u64, SessionError>;

    /// Returns stored chat history for the signed-in user.
    async fn chat_history(&self, session_token: &str) -> Result<HistoryResponse, SessionError>;
}

pub struct BackendClient {
    http: reqwest::Client,
    login_url: String,
    fetch_url: String,
    history_url: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(BackendClient {
            http,
            login_url: config.login_url(),
            fetch_url: config.fetch_url(),
            history_url: config.history_url(),
        })
    }
}

/// Splits a response into its status and body text for failure reporting.
async fn status_and_body(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn login(&self, identity_token: &str) -> Result<String, SessionError> {
        info!("Posting identity token to {}", self.login_url);
        let response = self
            .http
            .post(&self.login_url)
            .json(&LoginRequest {
                token: identity_token,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = status_and_body(response).await;
            error!("Backend login rejected: status {} body {}", status, body);
            return Err(SessionError::BackendRejected { status, body });
        }

        let login: LoginResponse = response.json().await?;
        info!("Backend login accepted, session token issued");
        Ok(login.jwt_token)
    }

    async fn fetch_mail(
        &self,
        session_token: &str,
        access_token: &str,
    ) -> Result<u64, SessionError> {
        info!("Requesting email fetch via {}", self.fetch_url);
        let response = self
            .http
            .post(&self.fetch_url)
            .json(&FetchRequest {
                jwt_token: session_token,
                access_token,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = status_and_body(response).await;
            error!("Email fetch failed: status {} body {}", status, body);
            return Err(SessionError::FetchFailed { status, body });
        }

        let fetch: FetchResponse = response.json().await?;
        if let Some(message) = &fetch.message {
            info!("Fetch response: {}", message);
        }
        Ok(fetch.count)
    }

    async fn chat_history(&self, session_token: &str) -> Result<HistoryResponse, SessionError> {
        info!("Requesting chat history via {}", self.history_url);
        let response = self
            .http
            .post(&self.history_url)
            .json(&HistoryRequest {
                jwt_token: session_token,
                chat_id: None,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = status_and_body(response).await;
            error!("Chat history request failed: status {} body {}", status, body);
            return Err(SessionError::BackendRejected { status, body });
        }

        Ok(response.json().await?)
    }
}
