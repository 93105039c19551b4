use std::fmt;

use log::{error, info};

use crate::channel::ChatChannel;
use crate::config::AppConfig;
use crate::error::SessionError;
use crate::models::wire::HistoryResponse;
use crate::services::backend::BackendApi;
use crate::services::identity::IdentityProvider;

/// Where the sign-in sequence currently stands. The sequence runs exactly
/// once per process; `Failed` is terminal and the user starts over by
/// restarting the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingIdentity,
    VerifyingWithBackend,
    AwaitingResourceAccess,
    FetchingData,
    ConnectingChannel,
    ChatReady,
    Failed(String),
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle."),
            SessionPhase::AwaitingIdentity => write!(f, "Waiting for Google sign-in..."),
            SessionPhase::VerifyingWithBackend => write!(f, "Verifying sign-in with backend..."),
            SessionPhase::AwaitingResourceAccess => {
                write!(f, "Waiting for Gmail read-only consent...")
            }
            SessionPhase::FetchingData => write!(f, "Fetching your emails..."),
            SessionPhase::ConnectingChannel => write!(f, "Connecting to chat..."),
            SessionPhase::ChatReady => write!(f, "Chat ready."),
            SessionPhase::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

/// How the controller surfaces progress. The rendering layer implements
/// this; the controller itself never touches the terminal.
pub trait SessionView: Send + Sync {
    /// Persistent status line, updated on every phase transition.
    fn status(&self, line: &str);
    /// Blocking, alert-level notification for failures.
    fn alert(&self, line: &str);
}

/// Drives sign-in -> backend login -> Gmail consent -> email fetch -> chat
/// channel, in that order, with every await a hard sequence point: step N+1
/// never issues its call before step N's result is in. All tokens live here
/// for the lifetime of the process and nowhere else.
pub struct SessionController {
    config: AppConfig,
    identity: Box<dyn IdentityProvider>,
    backend: Box<dyn BackendApi>,
    view: Box<dyn SessionView>,
    phase: SessionPhase,
    session_token: Option<String>,
    channel: Option<ChatChannel>,
    email_count: Option<u64>,
}

impl SessionController {
    pub fn new(
        config: AppConfig,
        identity: Box<dyn IdentityProvider>,
        backend: Box<dyn BackendApi>,
        view: Box<dyn SessionView>,
    ) -> Self {
        SessionController {
            config,
            identity,
            backend,
            view,
            phase: SessionPhase::Idle,
            session_token: None,
            channel: None,
            email_count: None,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn email_count(&self) -> Option<u64> {
        self.email_count
    }

    /// Hands the open channel to the caller. The controller keeps the
    /// session token, so `/history` keeps working afterwards.
    pub fn take_channel(&mut self) -> Option<ChatChannel> {
        self.channel.take()
    }

    /// Runs the whole sequence. On any error the controller lands in
    /// `Failed`, surfaces the reason, and returns the error; there is no
    /// automatic retry.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        match self.drive().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<(), SessionError> {
        self.authenticate().await?;
        self.open_channel().await
    }

    /// Steps 1-5: identity token, backend login, Gmail consent, email
    /// fetch. The Gmail access token is handed to the fetch call once and
    /// dropped; only the session token is retained.
    pub async fn authenticate(&mut self) -> Result<(), SessionError> {
        self.set_phase(SessionPhase::AwaitingIdentity);
        let identity_token = self.identity.sign_in().await?;
        if identity_token.is_empty() {
            return Err(SessionError::IdentityMissing);
        }

        self.set_phase(SessionPhase::VerifyingWithBackend);
        let session_token = self.backend.login(&identity_token).await?;
        self.session_token = Some(session_token.clone());

        self.set_phase(SessionPhase::AwaitingResourceAccess);
        let access_token = self.identity.request_mail_access().await?;

        self.set_phase(SessionPhase::FetchingData);
        let count = self.backend.fetch_mail(&session_token, &access_token).await?;
        self.email_count = Some(count);
        info!("Backend fetched {} emails", count);
        self.view.status(&format!("Fetched {} emails.", count));

        Ok(())
    }

    /// Step 6: open the chat channel. Complete only once the socket is
    /// open and the handshake frame is on the wire.
    pub async fn open_channel(&mut self) -> Result<(), SessionError> {
        self.set_phase(SessionPhase::ConnectingChannel);
        let channel =
            ChatChannel::connect(&self.config.ws_url, self.session_token.as_deref()).await?;
        // A previously held channel is dropped here: one live channel only.
        self.channel = Some(channel);
        self.set_phase(SessionPhase::ChatReady);
        Ok(())
    }

    pub async fn history(&self) -> Result<HistoryResponse, SessionError> {
        let token = self.session_token.as_deref().ok_or(SessionError::NotSignedIn)?;
        self.backend.chat_history(token).await
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        info!("Session phase: {:?} -> {:?}", self.phase, phase);
        self.view.status(&phase.to_string());
        self.phase = phase;
    }

    fn fail(&mut self, e: &SessionError) {
        error!("Session sequence failed: {}", e);
        self.view.alert(&format!("Error: {}", e));
        self.set_phase(SessionPhase::Failed(e.to_string()));
    }
}
