use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::SessionError;
use crate::models::message::{ChatMessage, Transcript};
use crate::models::wire::{HandshakeFrame, InboundFrame, OutboundFrame};

pub const BOT_ERROR_PREFIX: &str = "Bot Error: ";
pub const UNRECOGNIZED_TEXT: &str = "Received an unrecognized data structure from the server.";
pub const PARSE_FAILURE_TEXT: &str = "Error parsing message from the server.";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serializes the channel's authentication handshake, always the first frame
/// sent after the socket opens.
pub fn handshake_frame(session_token: &str) -> String {
    serde_json::to_string(&HandshakeFrame {
        jwt_token: session_token,
    })
    .unwrap_or_default()
}

/// Encodes one outbound chat frame. Whitespace-only input produces no frame
/// at all; anything else is sent exactly as given.
pub fn outbound_frame(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::to_string(&OutboundFrame { message: text }).ok()
}

/// Send-side transcript step: appends the User entry for text the channel
/// sends. Shares the encode decision with `outbound_frame`, so text that
/// produces no frame records no entry either.
pub fn record_outbound<'a>(transcript: &'a mut Transcript, text: &str) -> Option<&'a ChatMessage> {
    outbound_frame(text)?;
    Some(transcript.append(ChatMessage::user(text)))
}

/// Turns one inbound text frame into a transcript entry. Malformed frames
/// degrade to fixed placeholder entries; they never close the channel.
pub fn classify_inbound(raw: &str) -> ChatMessage {
    let value: serde_json::Value = match serde_json::from_str(raw)
        .map_err(|e| SessionError::MessageParseFailed(e.to_string()))
    {
        Ok(value) => value,
        Err(e) => {
            warn!("Dropping malformed chat frame: {}", e);
            return ChatMessage::bot(PARSE_FAILURE_TEXT, false);
        }
    };

    match serde_json::from_value::<InboundFrame>(value) {
        Ok(frame) if !frame.reply.is_empty() => {
            // reply[0] only; the protocol is single-reply and further
            // elements are ignored rather than concatenated.
            if frame.error {
                ChatMessage::bot(format!("{}{}", BOT_ERROR_PREFIX, frame.reply[0]), false)
            } else {
                ChatMessage::bot(frame.reply[0].clone(), true)
            }
        }
        _ => ChatMessage::bot(UNRECOGNIZED_TEXT, false),
    }
}

/// The single chat transport. At most one is live at a time; connecting a
/// new one supersedes whatever the controller held before.
#[derive(Debug)]
pub struct ChatChannel {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl ChatChannel {
    /// Opens the websocket and sends the authentication handshake. Fails
    /// fast with `ChannelNotReady` before any network activity when no
    /// session token is available.
    pub async fn connect(ws_url: &str, session_token: Option<&str>) -> Result<Self, SessionError> {
        let token = match session_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(SessionError::ChannelNotReady),
        };

        info!("Connecting chat channel to {}", ws_url);
        let (ws, _) = connect_async(ws_url).await?;
        let (mut sink, stream) = ws.split();

        sink.send(Message::Text(handshake_frame(token))).await?;
        info!("Chat channel open, handshake sent");

        Ok(ChatChannel { sink, stream })
    }

    pub fn split(self) -> (ChatSender, ChatReceiver) {
        (
            ChatSender { sink: self.sink },
            ChatReceiver {
                stream: self.stream,
            },
        )
    }
}

/// Outbound half of the channel.
pub struct ChatSender {
    sink: SplitSink<WsStream, Message>,
}

impl ChatSender {
    /// Sends one chat message. Returns `Ok(false)` when the text was
    /// whitespace-only and nothing was sent.
    pub async fn send(&mut self, text: &str) -> Result<bool, SessionError> {
        match outbound_frame(text) {
            Some(frame) => {
                self.sink
                    .send(Message::Text(frame))
                    .await
                    .map_err(|e| match e {
                        tokio_tungstenite::tungstenite::Error::ConnectionClosed
                        | tokio_tungstenite::tungstenite::Error::AlreadyClosed => {
                            SessionError::ChannelClosed
                        }
                        other => SessionError::WebSocket(other),
                    })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Inbound half of the channel. Yields one transcript entry per event and
/// `None` once the socket is gone.
pub struct ChatReceiver {
    stream: SplitStream<WsStream>,
}

impl ChatReceiver {
    pub async fn next_event(&mut self) -> Option<ChatMessage> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(classify_inbound(&text)),
                Ok(Message::Close(_)) => {
                    info!("Server closed the chat channel");
                    return Some(ChatMessage::system("Chat connection closed."));
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!("Chat channel error: {}", e);
                    return Some(ChatMessage::system(format!("Chat connection error: {}", e)));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Sender;

    #[test]
    fn handshake_is_a_single_jwt_field() {
        let frame = handshake_frame("tok-123");
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, serde_json::json!({ "jwt_token": "tok-123" }));
    }

    #[test]
    fn empty_and_whitespace_sends_encode_nothing() {
        assert!(outbound_frame("").is_none());
        assert!(outbound_frame("   ").is_none());
        assert!(outbound_frame("\n\t").is_none());
    }

    #[test]
    fn outbound_frame_wraps_message() {
        let frame = outbound_frame("hi").unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, serde_json::json!({ "message": "hi" }));
    }

    #[test]
    fn outbound_frame_sends_text_as_given() {
        // Trimming is only the emptiness check; the payload is untouched.
        let frame = outbound_frame("  spaced out  ").unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, serde_json::json!({ "message": "  spaced out  " }));
    }

    #[test]
    fn sent_text_is_recorded_as_exactly_one_user_entry() {
        let mut transcript = Transcript::new();
        let entry = record_outbound(&mut transcript, "hi").unwrap();
        assert_eq!(entry.sender, Sender::User);
        assert_eq!(entry.text, "hi");
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn unsent_whitespace_text_records_no_entry() {
        let mut transcript = Transcript::new();
        assert!(record_outbound(&mut transcript, "").is_none());
        assert!(record_outbound(&mut transcript, "   ").is_none());
        assert!(transcript.is_empty());
    }

    #[test]
    fn reply_frame_becomes_markdown_bot_entry() {
        let msg = classify_inbound(r#"{"reply":["Hello"]}"#);
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.text, "Hello");
        assert!(msg.markdown);
    }

    #[test]
    fn error_frame_gets_prefixed() {
        let msg = classify_inbound(r#"{"error":true,"reply":["bad input"]}"#);
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.text, "Bot Error: bad input");
        assert!(!msg.markdown);
    }

    #[test]
    fn extra_reply_elements_are_ignored() {
        let msg = classify_inbound(r#"{"reply":["first","second","third"]}"#);
        assert_eq!(msg.text, "first");
    }

    #[test]
    fn error_frame_without_reply_is_unrecognized() {
        let msg = classify_inbound(r#"{"error":true,"reply":[]}"#);
        assert_eq!(msg.text, UNRECOGNIZED_TEXT);
    }

    #[test]
    fn unexpected_json_shape_is_unrecognized() {
        let msg = classify_inbound(r#"{"status":"ok"}"#);
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.text, UNRECOGNIZED_TEXT);
    }

    #[test]
    fn non_json_frame_becomes_parse_failure_entry() {
        let msg = classify_inbound("definitely not json");
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.text, PARSE_FAILURE_TEXT);
    }

    #[tokio::test]
    async fn connect_without_token_fails_before_any_network() {
        // The URL is unroutable; reaching it would error differently.
        let err = ChatChannel::connect("ws://192.0.2.1:1/ws/chat", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ChannelNotReady));

        let err = ChatChannel::connect("ws://192.0.2.1:1/ws/chat", Some(""))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ChannelNotReady));
    }
}
