//! Mojang API client for Minecraft profile information
//!
//! Fetches user profile data and verifies game ownership.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

const MOJANG_API_BASE: &str = "https://api.minecraftservices.com";

/// Minecraft profile information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinecraftProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skins: Vec<ProfileSkin>,
    #[serde(default)]
    pub capes: Vec<ProfileCape>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSkin {
    pub id: String,
    pub state: String,
    pub url: String,
    pub variant: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCape {
    pub id: String,
    pub state: String,
    pub url: String,
    pub alias: String,
}

#[derive(Debug, Deserialize)]
struct EntitlementResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// Fetch the Minecraft profile for a bearer token
pub async fn get_minecraft_profile(bearer_token: &str) -> Result<MinecraftProfile, AuthError> {
    get_profile_from(MOJANG_API_BASE, bearer_token).await
}

pub(crate) async fn get_profile_from(
    base_url: &str,
    bearer_token: &str,
) -> Result<MinecraftProfile, AuthError> {
    let client = Client::new();

    let response = client
        .get(format!("{}/minecraft/profile", base_url))
        .bearer_auth(bearer_token)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Profile(format!("{} - {}", status, body)));
    }

    response
        .json::<MinecraftProfile>()
        .await
        .map_err(|e| AuthError::Profile(e.to_string()))
}

/// Verify game ownership.
///
/// The entitlement store must list at least one item; an authenticated
/// Microsoft account without Minecraft returns an empty list, not an error.
pub async fn verify_game_ownership(bearer_token: &str) -> Result<bool, AuthError> {
    verify_ownership_from(MOJANG_API_BASE, bearer_token).await
}

pub(crate) async fn verify_ownership_from(
    base_url: &str,
    bearer_token: &str,
) -> Result<bool, AuthError> {
    let client = Client::new();

    let response = client
        .get(format!("{}/entitlements/mcstore", base_url))
        .bearer_auth(bearer_token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Ok(false);
    }

    let entitlements = response
        .json::<EntitlementResponse>()
        .await
        .map_err(|e| AuthError::Profile(e.to_string()))?;

    Ok(!entitlements.items.is_empty())
}
