//! Microsoft OAuth authentication module
//!
//! Provides the OAuth2 device-code flow for Microsoft accounts and the
//! token exchange for Minecraft services.

use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, ClientId, DeviceAuthorizationUrl, DeviceCodeErrorResponse,
    DeviceCodeErrorResponseType, RefreshToken, RequestTokenError, Scope,
    StandardDeviceAuthorizationResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Microsoft OAuth endpoints (consumers tenant)
const AUTHORIZATION_URL: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/authorize";
const TOKEN_URL: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/token";
const DEVICE_CODE_URL: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/devicecode";

/// OAuth scopes required for Minecraft authentication
const SCOPES: &[&str] = &["XboxLive.signin", "offline_access"];

/// Authentication failures, split so callers can tell a revoked grant
/// (drop the account) from a transient network problem.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid OAuth endpoint: {0}")]
    Endpoint(#[from] oauth2::url::ParseError),
    #[error("device code request failed: {0}")]
    DeviceCode(String),
    #[error("device code expired before sign-in completed")]
    CodeExpired,
    #[error("authorization was declined: {0}")]
    Declined(String),
    #[error("refresh grant is expired or revoked")]
    SessionExpired,
    #[error("token request failed: {0}")]
    TokenRequest(String),
    #[error("minecraft token exchange failed: {0}")]
    MinecraftExchange(String),
    #[error("profile request failed: {0}")]
    Profile(String),
    #[error("this Microsoft account does not own Minecraft")]
    NotEntitled,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Device code login details handed to the UI layer for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCodeDetails {
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: u64,
    pub interval: u64,
}

/// Create the OAuth2 client for the given application registration
pub fn oauth_client(client_id: &str) -> Result<BasicClient, AuthError> {
    let client = BasicClient::new(
        ClientId::new(client_id.to_string()),
        None,
        AuthUrl::new(AUTHORIZATION_URL.to_string())?,
        Some(TokenUrl::new(TOKEN_URL.to_string())?),
    )
    .set_device_authorization_url(DeviceAuthorizationUrl::new(DEVICE_CODE_URL.to_string())?);

    Ok(client)
}

/// Request a device code for user authentication
pub async fn request_device_code(
    client: &BasicClient,
) -> Result<StandardDeviceAuthorizationResponse, AuthError> {
    let scopes: Vec<Scope> = SCOPES.iter().map(|s| Scope::new(s.to_string())).collect();

    client
        .exchange_device_code()
        .map_err(|e| AuthError::DeviceCode(e.to_string()))?
        .add_scopes(scopes)
        .request_async(async_http_client)
        .await
        .map_err(|e| AuthError::DeviceCode(format!("{e:?}")))
}

/// Convert a device authorization response to UI-friendly details
pub fn device_code_details(response: &StandardDeviceAuthorizationResponse) -> DeviceCodeDetails {
    DeviceCodeDetails {
        user_code: response.user_code().secret().clone(),
        verification_uri: response.verification_uri().to_string(),
        expires_in: response.expires_in().as_secs(),
        interval: response.interval().as_secs(),
    }
}

/// Poll once for completion of the device-code sign-in.
///
/// Call in a loop; `AuthorizationPending`/`SlowDown` responses surface as
/// the raw error so the caller controls pacing and cancellation.
pub async fn poll_for_token(
    client: &BasicClient,
    device_code: StandardDeviceAuthorizationResponse,
) -> Result<
    BasicTokenResponse,
    RequestTokenError<oauth2::reqwest::Error<reqwest::Error>, DeviceCodeErrorResponse>,
> {
    client
        .exchange_device_access_token(&device_code)
        .request_async(async_http_client, tokio::time::sleep, None)
        .await
}

/// Classify a device-flow server response for the polling loop
pub fn classify_device_error(error: &DeviceCodeErrorResponseType) -> Option<AuthError> {
    match error {
        DeviceCodeErrorResponseType::AuthorizationPending
        | DeviceCodeErrorResponseType::SlowDown => None,
        DeviceCodeErrorResponseType::ExpiredToken => Some(AuthError::CodeExpired),
        other => Some(AuthError::Declined(format!("{other:?}"))),
    }
}

/// Refresh an expired Microsoft access token using the stored refresh token
pub async fn refresh_access_token(
    client: &BasicClient,
    refresh_token: String,
) -> Result<BasicTokenResponse, AuthError> {
    log::info!("[auth] Attempting to refresh Microsoft access token");
    match client
        .exchange_refresh_token(&RefreshToken::new(refresh_token))
        .request_async(async_http_client)
        .await
    {
        Ok(token) => {
            log::info!("[auth] Successfully refreshed Microsoft access token");
            Ok(token)
        }
        Err(RequestTokenError::ServerResponse(resp))
            if matches!(resp.error(), &BasicErrorResponseType::InvalidGrant) =>
        {
            log::warn!("[auth] Refresh token is revoked or expired");
            Err(AuthError::SessionExpired)
        }
        Err(e) => {
            log::error!("[auth] Failed to refresh Microsoft access token: {:?}", e);
            Err(AuthError::TokenRequest(format!("{e:?}")))
        }
    }
}

/// Exchange a Microsoft access token for a Minecraft token
pub async fn exchange_for_minecraft_token(
    microsoft_access_token: &str,
) -> Result<minecraft_msa_auth::MinecraftAuthenticationResponse, AuthError> {
    // minecraft-msa-auth uses reqwest 0.12, so we use the reqwest12 alias
    let client = reqwest12::Client::new();
    log::info!("[auth] Exchanging Microsoft access token for Minecraft token");
    minecraft_msa_auth::MinecraftAuthorizationFlow::new(client)
        .exchange_microsoft_token(microsoft_access_token)
        .await
        .map_err(|e| {
            log::error!("[auth] Failed to exchange for Minecraft token: {:?}", e);
            AuthError::MinecraftExchange(format!("{e:?}"))
        })
}
