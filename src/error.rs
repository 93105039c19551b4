use thiserror::Error;

/// Everything that can take the sign-in sequence down, plus the channel-side
/// conditions. The sequence never retries on its own: any of these (except
/// `MessageParseFailed`, which only degrades a single inbound frame) leaves
/// the controller in its failed state until the user starts over.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing identity token")]
    IdentityMissing,

    #[error("identity flow failed: {0}")]
    IdentityFlow(String),

    #[error("backend login rejected (status {status}): {body}")]
    BackendRejected { status: u16, body: String },

    #[error("resource access denied: {0}")]
    ResourceAccessDenied(String),

    #[error("email fetch failed (status {status}): {body}")]
    FetchFailed { status: u16, body: String },

    #[error("chat channel not ready: no session token")]
    ChannelNotReady,

    #[error("could not parse inbound chat frame: {0}")]
    MessageParseFailed(String),

    #[error("chat channel closed")]
    ChannelClosed,

    #[error("not signed in")]
    NotSignedIn,

    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_carry_status_and_body() {
        let err = SessionError::BackendRejected {
            status: 401,
            body: "bad token".to_string(),
        };
        assert_eq!(err.to_string(), "backend login rejected (status 401): bad token");

        let err = SessionError::FetchFailed {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "email fetch failed (status 500): boom");
    }

    #[test]
    fn channel_not_ready_names_the_missing_token() {
        assert!(SessionError::ChannelNotReady.to_string().contains("no session token"));
    }
}
