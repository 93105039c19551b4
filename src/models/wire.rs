use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/google-login`: the Google identity token, exchanged
/// exactly once for a backend session token.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub jwt_token: String,
}

/// Body of `POST /gmail/fetch`: the session token plus the scoped Gmail
/// access token. The access token is not retained after this call.
#[derive(Debug, Serialize)]
pub struct FetchRequest<'a> {
    pub jwt_token: &'a str,
    pub access_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct FetchResponse {
    pub count: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /chat/history`. Without a `chat_id` the backend returns
/// every chat for the user, grouped by chat id.
#[derive(Debug, Serialize)]
pub struct HistoryRequest<'a> {
    pub jwt_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub chats: HashMap<String, Vec<StoredExchange>>,
    #[serde(default)]
    pub total_messages: u64,
}

/// One stored user/bot exchange from a previous session.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredExchange {
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub ai_response: Option<String>,
}

/// First client frame on the chat channel; the backend validates this
/// before accepting anything else.
#[derive(Debug, Serialize)]
pub struct HandshakeFrame<'a> {
    pub jwt_token: &'a str,
}

/// Every client frame after the handshake.
#[derive(Debug, Serialize)]
pub struct OutboundFrame<'a> {
    pub message: &'a str,
}

/// Server frame: an ordered list of reply strings, optionally flagged as an
/// error. Only `reply[0]` is consumed; later elements are part of the wire
/// format but deliberately unused (single-reply protocol).
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub reply: Vec<String>,
    #[serde(default)]
    pub error: bool,
}
