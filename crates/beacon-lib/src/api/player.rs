//! Player texture helpers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::auth::AuthError;

/// Download a skin texture and return it base64-encoded, ready to embed in
/// an account record or a data URI.
pub async fn fetch_skin_base64(url: &str) -> Result<String, AuthError> {
    let response = reqwest::get(url).await?;

    if !response.status().is_success() {
        return Err(AuthError::Profile(format!(
            "skin download failed: {}",
            response.status()
        )));
    }

    let bytes = response.bytes().await?;
    Ok(STANDARD.encode(&bytes))
}
