//! Server-defined instance descriptors.
//!
//! Instances are fetched from the distribution server every session and are
//! never persisted locally; only the selected instance *name* lives in the
//! client config.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    /// Unique key, injected from the instance map when the list is fetched.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub whitelist_active: bool,
    #[serde(default)]
    pub whitelist: Vec<String>,
    /// Connectivity descriptor; absent for offline-only instances.
    #[serde(default)]
    pub status: Option<ServerStatus>,
    #[serde(default)]
    pub loader: Option<LoaderSpec>,
    /// Asset-manifest base url handed to the download library.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub verify: bool,
    #[serde(default)]
    pub ignored: Vec<String>,
    #[serde(default)]
    pub jvm_args: Vec<String>,
    #[serde(default)]
    pub game_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub ip: String,
    pub port: u16,
    pub server_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderSpec {
    #[serde(default)]
    pub minecraft_version: Option<String>,
    #[serde(default)]
    pub loader_type: Option<String>,
    #[serde(default)]
    pub loader_version: Option<String>,
}

impl Instance {
    /// Whether the named player may use this instance.
    pub fn permits(&self, account_name: &str) -> bool {
        !self.whitelist_active || self.whitelist.iter().any(|n| n == account_name)
    }
}
