use std::fs;
use std::io::{self, Write};

use async_trait::async_trait;
use log::info;
use oauth2::basic::{BasicErrorResponseType, BasicTokenType};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, EmptyExtraTokenFields,
    ExtraTokenFields, RedirectUrl, RevocationErrorResponseType, Scope, StandardErrorResponse,
    StandardRevocableToken, StandardTokenIntrospectionResponse, StandardTokenResponse,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, GMAIL_READONLY_SCOPE};
use crate::error::SessionError;

// Out-of-band flow: Google shows the code for the user to paste back.
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// The two consent flows the sequence needs, kept behind a trait so the
/// controller can be driven by a mock in tests. The flows are separate on
/// purpose: the first issues the identity token, the second a Gmail-scoped
/// access token with the consent prompt forced.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Runs the sign-in flow and returns the Google identity token.
    async fn sign_in(&self) -> Result<String, SessionError>;

    /// Runs the Gmail read-only consent flow and returns the access token.
    async fn request_mail_access(&self) -> Result<String, SessionError>;
}

/// Google's token endpoint returns the identity token alongside the access
/// token; the standard response type drops it, so it is declared here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenFields {
    #[serde(default)]
    pub id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

type GoogleTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type GoogleOAuthClient = Client<
    StandardErrorResponse<BasicErrorResponseType>,
    GoogleTokenResponse,
    BasicTokenType,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    StandardErrorResponse<RevocationErrorResponseType>,
>;

#[derive(Deserialize)]
struct OAuthConfig {
    installed: InstalledConfig,
}

#[derive(Deserialize)]
struct InstalledConfig {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
}

pub struct GoogleIdentity {
    client: GoogleOAuthClient,
}

impl GoogleIdentity {
    /// Builds the OAuth client from the Google client secret file
    /// ("installed" application shape).
    pub fn new(config: &AppConfig) -> Result<Self, SessionError> {
        let secret_str = fs::read_to_string(&config.client_secret_path).map_err(|e| {
            SessionError::Config(format!(
                "unable to read client secret file {}: {}",
                config.client_secret_path, e
            ))
        })?;
        let oauth_config: OAuthConfig = serde_json::from_str(&secret_str)
            .map_err(|e| SessionError::Config(format!("invalid client secret file: {}", e)))?;
        let installed = oauth_config.installed;

        let auth_url = AuthUrl::new(installed.auth_uri)
            .map_err(|e| SessionError::Config(format!("invalid auth URI: {}", e)))?;
        let token_url = TokenUrl::new(installed.token_uri)
            .map_err(|e| SessionError::Config(format!("invalid token URI: {}", e)))?;
        let redirect_url = RedirectUrl::new(OOB_REDIRECT_URI.to_string())
            .map_err(|e| SessionError::Config(format!("invalid redirect URI: {}", e)))?;

        let client = Client::new(
            ClientId::new(installed.client_id),
            Some(ClientSecret::new(installed.client_secret)),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(GoogleIdentity { client })
    }

    async fn exchange(&self, code: String) -> Result<GoogleTokenResponse, String> {
        self.client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    async fn sign_in(&self) -> Result<String, SessionError> {
        let (auth_url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();

        info!("Starting Google sign-in flow");
        let code = read_code_blocking(auth_url.to_string(), "Sign in with Google")
            .await
            .map_err(SessionError::IdentityFlow)?;

        let token = self
            .exchange(code)
            .await
            .map_err(SessionError::IdentityFlow)?;

        match token.extra_fields().id_token.as_deref() {
            Some(id_token) if !id_token.is_empty() => Ok(id_token.to_string()),
            _ => Err(SessionError::IdentityMissing),
        }
    }

    async fn request_mail_access(&self) -> Result<String, SessionError> {
        let (auth_url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(GMAIL_READONLY_SCOPE.to_string()))
            // Force the consent screen even when access was granted before.
            .add_extra_param("prompt", "consent")
            .url();

        info!("Starting Gmail read-only consent flow");
        let code = read_code_blocking(auth_url.to_string(), "Grant read-only Gmail access")
            .await
            .map_err(SessionError::ResourceAccessDenied)?;

        let token = self
            .exchange(code)
            .await
            .map_err(SessionError::ResourceAccessDenied)?;

        Ok(token.access_token().secret().clone())
    }
}

/// Prompts on stdout and reads the pasted authorization code from stdin.
/// Runs on the blocking pool so the runtime stays responsive.
async fn read_code_blocking(auth_url: String, label: &'static str) -> Result<String, String> {
    tokio::task::spawn_blocking(move || {
        println!("\n== {} ==", label);
        println!("Open this URL in your browser, approve access, then paste the code below:");
        println!("\n{}\n", auth_url);
        print!("Code: ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        let mut code = String::new();
        io::stdin()
            .read_line(&mut code)
            .map_err(|e| e.to_string())?;
        Ok(code.trim().to_string())
    })
    .await
    .map_err(|e| e.to_string())?
}
