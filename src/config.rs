use std::env;

use url::Url;

use crate::error::SessionError;

pub fn init_logging() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
}

pub const LOGIN_PATH: &str = "/auth/google-login";
pub const FETCH_PATH: &str = "/gmail/fetch";
pub const HISTORY_PATH: &str = "/chat/history";
pub const WS_CHAT_PATH: &str = "/ws/chat";

pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";
const DEFAULT_CLIENT_SECRET_PATH: &str = "./cfg/client_secret.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend base URL, e.g. "http://localhost:8001".
    pub backend_url: String,
    /// Chat endpoint derived from `backend_url`, e.g. "ws://localhost:8001/ws/chat".
    pub ws_url: String,
    /// Path to the Google OAuth client secret file ("installed" shape).
    pub client_secret_path: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, SessionError> {
        let backend_url = env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let backend_url = backend_url.trim_end_matches('/').to_string();
        let ws_url = derive_ws_url(&backend_url)?;
        let client_secret_path = env::var("GOOGLE_CLIENT_SECRET_PATH")
            .unwrap_or_else(|_| DEFAULT_CLIENT_SECRET_PATH.to_string());

        Ok(AppConfig {
            backend_url,
            ws_url,
            client_secret_path,
        })
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.backend_url, LOGIN_PATH)
    }

    pub fn fetch_url(&self) -> String {
        format!("{}{}", self.backend_url, FETCH_PATH)
    }

    pub fn history_url(&self) -> String {
        format!("{}{}", self.backend_url, HISTORY_PATH)
    }
}

/// Maps the backend base URL onto the chat endpoint: http -> ws, https -> wss.
fn derive_ws_url(backend_url: &str) -> Result<String, SessionError> {
    let mut url = Url::parse(backend_url)
        .map_err(|e| SessionError::Config(format!("bad backend URL {}: {}", backend_url, e)))?;

    let ws_scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(SessionError::Config(format!(
                "unsupported backend URL scheme: {}",
                other
            )))
        }
    };
    url.set_scheme(ws_scheme)
        .map_err(|_| SessionError::Config("could not derive websocket URL".to_string()))?;
    url.set_path(WS_CHAT_PATH);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ws_url_from_http() {
        assert_eq!(
            derive_ws_url("http://localhost:8001").unwrap(),
            "ws://localhost:8001/ws/chat"
        );
    }

    #[test]
    fn derives_wss_url_from_https() {
        assert_eq!(
            derive_ws_url("https://mail.example.com").unwrap(),
            "wss://mail.example.com/ws/chat"
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(derive_ws_url("ftp://example.com").is_err());
    }
}
