//! Terminal client for the Gmail-memory chat backend: signs the user in
//! with Google, exchanges the identity token for a backend session token,
//! runs the Gmail read-only consent flow, triggers the backend email fetch,
//! then chats with the bot over a websocket, rendering replies as markdown.

pub mod channel;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod services;
pub mod session;
