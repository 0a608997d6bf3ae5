//! Microsoft account capability.
//!
//! Wraps beacon-lib's OAuth device-code flow and Mojang lookups into the
//! two operations the session needs: a full interactive login and a
//! non-interactive token refresh. Both produce complete [`Account`]
//! records; only this module interprets the token fields stored on them.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    DeviceCodeErrorResponseType, RequestTokenError, StandardDeviceAuthorizationResponse,
    TokenResponse,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use beacon_lib::api::{mojang, player};
use beacon_lib::auth::{self, AuthError};

use crate::models::{Account, AccountKind, AccountMeta, PlayerProfile, Skin};
use crate::signals::UiSink;

/// Authentication stage events surfaced to the shell while a sign-in runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage")]
pub enum AuthStage {
    Start,
    AuthCode {
        code: String,
        url: String,
        expires_in: u64,
    },
    Polling,
    Complete {
        uuid: String,
        username: String,
    },
    Cancelled,
    Error {
        message: String,
    },
}

/// Result of an interactive login. Cancellation is a valid outcome, not an
/// error.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Completed(Account),
    Cancelled,
}

/// Exchanges an account's stored credentials for a refreshed record.
///
/// Implementations must preserve identity: the returned record describes
/// the same player (`name`/`uuid` continuity) so the repository can re-key
/// it under the original id.
#[async_trait]
pub trait AccountRefresher: Send + Sync {
    async fn refresh(&self, account: &Account) -> Result<Account, AuthError>;
}

pub struct MicrosoftAuthenticator {
    client_id: String,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl MicrosoftAuthenticator {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            cancel: Mutex::new(None),
        }
    }

    /// Abort an in-flight login. The poll loop notices on its next turn.
    pub fn cancel_login(&self) {
        if let Some(tx) = self.cancel.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }

    /// Run the device-code sign-in flow, announcing stages through the sink.
    pub async fn login(&self, sink: &dyn UiSink) -> Result<LoginOutcome, AuthError> {
        let (tx, rx) = oneshot::channel::<()>();
        *self.cancel.lock().unwrap() = Some(tx);

        sink.auth_stage(&AuthStage::Start);

        let client = auth::oauth_client(&self.client_id)?;
        let device_code = auth::request_device_code(&client).await?;
        let details = auth::device_code_details(&device_code);

        sink.auth_stage(&AuthStage::AuthCode {
            code: details.user_code.clone(),
            url: details.verification_uri.clone(),
            expires_in: details.expires_in,
        });
        sink.auth_stage(&AuthStage::Polling);

        let token = match poll_with_cancellation(&client, device_code, rx).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                sink.auth_stage(&AuthStage::Cancelled);
                return Ok(LoginOutcome::Cancelled);
            }
            Err(e) => {
                sink.auth_stage(&AuthStage::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        match self.account_from_token(&token).await {
            Ok(account) => {
                sink.auth_stage(&AuthStage::Complete {
                    uuid: account.uuid.clone(),
                    username: account.name.clone(),
                });
                Ok(LoginOutcome::Completed(account))
            }
            Err(e) => {
                sink.auth_stage(&AuthStage::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Build a full account record from a Microsoft token response: exchange
    /// for a Minecraft token, verify entitlement, fetch profile and skin.
    async fn account_from_token(
        &self,
        token: &BasicTokenResponse,
    ) -> Result<Account, AuthError> {
        let microsoft_access_token = token.access_token().secret();
        let refresh_token = token.refresh_token().map(|r| r.secret().clone());

        let minecraft = auth::exchange_for_minecraft_token(microsoft_access_token).await?;
        let minecraft_access_token = minecraft.access_token().clone().into_inner();

        if !mojang::verify_game_ownership(&minecraft_access_token).await? {
            return Err(AuthError::NotEntitled);
        }

        let profile = mojang::get_minecraft_profile(&minecraft_access_token).await?;

        let expires_in = token
            .expires_in()
            .unwrap_or(std::time::Duration::from_secs(3600));
        let token_expires_at =
            (Utc::now() + Duration::seconds(expires_in.as_secs() as i64)).to_rfc3339();

        let mut skins = Vec::new();
        if let Some(skin) = profile.skins.first() {
            match player::fetch_skin_base64(&skin.url).await {
                Ok(base64) => skins.push(Skin {
                    base64: Some(base64),
                    url: Some(skin.url.clone()),
                    variant: Some(skin.variant.clone()),
                }),
                Err(e) => {
                    log::warn!("[auth] Skin download failed for {}: {}", profile.name, e)
                }
            }
        }

        log::info!(
            "[auth] Completed token exchange and profile fetch for user {} ({})",
            profile.name,
            profile.id
        );

        Ok(Account {
            id: 0,
            name: profile.name,
            uuid: profile.id,
            meta: AccountMeta {
                kind: AccountKind::Xbox,
            },
            profile: PlayerProfile { skins },
            access_token: Some(minecraft_access_token),
            refresh_token,
            token_expires_at: Some(token_expires_at),
        })
    }
}

#[async_trait]
impl AccountRefresher for MicrosoftAuthenticator {
    async fn refresh(&self, account: &Account) -> Result<Account, AuthError> {
        log::info!("[auth] Refresh requested for account: {}", account.uuid);

        let refresh_token = account
            .refresh_token
            .clone()
            .ok_or(AuthError::SessionExpired)?;

        let client = auth::oauth_client(&self.client_id)?;
        let token = auth::refresh_access_token(&client, refresh_token).await?;

        let mut fresh = self.account_from_token(&token).await?;
        fresh.id = account.id;
        Ok(fresh)
    }
}

/// Poll for sign-in completion, checking the cancel channel between turns.
/// `Ok(None)` means the user cancelled.
async fn poll_with_cancellation(
    client: &BasicClient,
    device_code: StandardDeviceAuthorizationResponse,
    mut cancel_rx: oneshot::Receiver<()>,
) -> Result<Option<BasicTokenResponse>, AuthError> {
    let interval = std::time::Duration::from_secs(device_code.interval().as_secs());

    loop {
        if cancel_rx.try_recv().is_ok() {
            return Ok(None);
        }

        match auth::poll_for_token(client, device_code.clone()).await {
            Ok(token) => return Ok(Some(token)),
            Err(RequestTokenError::ServerResponse(resp)) => {
                match auth::classify_device_error(resp.error()) {
                    Some(err) => return Err(err),
                    None => {
                        let delay = if matches!(
                            resp.error(),
                            DeviceCodeErrorResponseType::SlowDown
                        ) {
                            interval * 2
                        } else {
                            interval
                        };
                        tokio::time::sleep(delay).await;
                    }
                }
            }
            Err(e) => return Err(AuthError::TokenRequest(format!("{e:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_stages_tag_for_the_shell() {
        let stage = AuthStage::AuthCode {
            code: "ABCD-EFGH".into(),
            url: "https://www.microsoft.com/link".into(),
            expires_in: 900,
        };
        let value = serde_json::to_value(&stage).unwrap();
        assert_eq!(value["stage"], "AuthCode");
        assert_eq!(value["code"], "ABCD-EFGH");
    }

    #[tokio::test]
    async fn refresh_without_a_token_is_a_dead_session() {
        let authenticator = MicrosoftAuthenticator::new("client-id");
        let account: Account =
            serde_json::from_value(serde_json::json!({ "name": "Alex", "uuid": "abc" })).unwrap();
        assert!(matches!(
            authenticator.refresh(&account).await,
            Err(AuthError::SessionExpired)
        ));
    }
}
