//! Locally stored account records.

use serde::{Deserialize, Serialize};

/// One linked game identity.
///
/// The token fields are owned by the authentication capability; the rest of
/// the launcher only reads `name`, `uuid`, the kind tag and the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Store key, injected by the repository. Stable for the record's life.
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub uuid: String,
    #[serde(default)]
    pub meta: AccountMeta,
    #[serde(default)]
    pub profile: PlayerProfile,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_expires_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountMeta {
    #[serde(rename = "type")]
    pub kind: AccountKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    /// Microsoft/Xbox-backed account with refreshable tokens.
    Xbox,
    #[default]
    Offline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    #[serde(default)]
    pub skins: Vec<Skin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skin {
    #[serde(default)]
    pub base64: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
}

impl Account {
    /// Whether this account carries refreshable credentials.
    pub fn is_token_bearing(&self) -> bool {
        self.meta.kind == AccountKind::Xbox
    }

    /// Profile uuid with dashes stripped, the form used for identity checks.
    pub fn normalized_uuid(&self) -> String {
        self.uuid.replace('-', "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tag_serializes_under_meta_type() {
        let account = Account {
            id: 3,
            name: "Steve".into(),
            uuid: "abc".into(),
            meta: AccountMeta {
                kind: AccountKind::Xbox,
            },
            profile: PlayerProfile::default(),
            access_token: None,
            refresh_token: None,
            token_expires_at: None,
        };

        let value = serde_json::to_value(&account).unwrap();
        assert_eq!(value["meta"]["type"], "Xbox");
    }

    #[test]
    fn uuid_normalization_strips_dashes() {
        let account = Account {
            id: 0,
            name: "Alex".into(),
            uuid: "069a79f4-44e9-4726-a5be-fca90e38aaf5".into(),
            meta: AccountMeta::default(),
            profile: PlayerProfile::default(),
            access_token: None,
            refresh_token: None,
            token_expires_at: None,
        };
        assert_eq!(account.normalized_uuid(), "069a79f444e94726a5befca90e38aaf5");
    }

    #[test]
    fn minimal_document_deserializes_with_defaults() {
        let account: Account =
            serde_json::from_value(serde_json::json!({ "name": "Alex", "uuid": "abc" })).unwrap();
        assert_eq!(account.meta.kind, AccountKind::Offline);
        assert!(!account.is_token_bearing());
        assert!(account.profile.skins.is_empty());
    }
}
