//! Typed repository over the record store.
//!
//! Exactly two logical tables: the `configClient` singleton (key 1) and
//! `accounts`. This layer owns the typed shape; cross-record invariants
//! belong to the session.

use std::path::Path;
use std::sync::Arc;

use crate::models::{Account, ConfigClient};
use crate::store::{RecordStore, StoreError};

pub const CONFIG_TABLE: &str = "configClient";
pub const ACCOUNTS_TABLE: &str = "accounts";
/// The singleton lives under a fixed key by convention.
pub const CONFIG_KEY: i64 = 1;

const STORE_FILE: &str = "launcher.db";

#[derive(Clone)]
pub struct Database {
    store: Arc<RecordStore>,
}

impl Database {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Open the on-disk store inside the launcher data directory.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(RecordStore::open(dir, STORE_FILE)?))
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(RecordStore::in_memory()?))
    }

    /// Read the client config. Absent on first run; this layer never
    /// auto-creates it; call [`Database::init_config`] explicitly.
    pub fn read_config(&self) -> Result<Option<ConfigClient>, StoreError> {
        match self.store.read_one(CONFIG_TABLE, CONFIG_KEY)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Read the client config, treating a missing singleton as a store
    /// fault. Valid once first-run initialization has happened.
    pub fn require_config(&self) -> Result<ConfigClient, StoreError> {
        self.read_config()?.ok_or(StoreError::NotFound {
            table: CONFIG_TABLE.to_string(),
            key: CONFIG_KEY,
        })
    }

    /// First-run initialization: write the fully populated default document.
    /// Later consumers write nested fields without existence checks, so
    /// every preference group must be present from the start.
    pub fn init_config(&self) -> Result<ConfigClient, StoreError> {
        let config = ConfigClient::default();
        self.store
            .create(CONFIG_TABLE, &serde_json::to_value(&config)?)?;
        Ok(config)
    }

    /// Whole-document replace of the singleton.
    pub fn update_config(&self, config: &ConfigClient) -> Result<(), StoreError> {
        self.store
            .update(CONFIG_TABLE, CONFIG_KEY, &serde_json::to_value(config)?)
    }

    pub fn read_account(&self, id: i64) -> Result<Option<Account>, StoreError> {
        match self.store.read_one(ACCOUNTS_TABLE, id)? {
            Some(value) => {
                let mut account: Account = serde_json::from_value(value)?;
                account.id = id;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    pub fn read_all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        self.store
            .read_all(ACCOUNTS_TABLE)?
            .into_iter()
            .map(|record| {
                let mut account: Account = serde_json::from_value(record.value)?;
                account.id = record.key;
                Ok(account)
            })
            .collect()
    }

    /// Insert a new account; the store assigns the key, returned on the
    /// record's `id`.
    pub fn create_account(&self, account: &Account) -> Result<Account, StoreError> {
        let record = self
            .store
            .create(ACCOUNTS_TABLE, &serde_json::to_value(account)?)?;
        let mut created = account.clone();
        created.id = record.key;
        Ok(created)
    }

    /// Replace an account document under its existing key.
    pub fn update_account(&self, account: &Account) -> Result<(), StoreError> {
        self.store
            .update(ACCOUNTS_TABLE, account.id, &serde_json::to_value(account)?)
    }

    pub fn remove_account(&self, id: i64) -> Result<(), StoreError> {
        self.store.delete(ACCOUNTS_TABLE, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountKind, AccountMeta, PlayerProfile};

    fn account(name: &str, uuid: &str) -> Account {
        Account {
            id: 0,
            name: name.into(),
            uuid: uuid.into(),
            meta: AccountMeta {
                kind: AccountKind::Xbox,
            },
            profile: PlayerProfile::default(),
            access_token: Some("at".into()),
            refresh_token: Some("rt".into()),
            token_expires_at: None,
        }
    }

    #[test]
    fn config_is_absent_until_initialized() {
        let db = Database::in_memory().unwrap();
        assert!(db.read_config().unwrap().is_none());

        let config = db.init_config().unwrap();
        assert_eq!(config, ConfigClient::default());
        assert_eq!(db.read_config().unwrap().unwrap(), config);
    }

    #[test]
    fn first_run_document_lands_under_the_singleton_key() {
        let db = Database::in_memory().unwrap();
        db.init_config().unwrap();

        let mut config = db.require_config().unwrap();
        config.account_selected = Some(9);
        db.update_config(&config).unwrap();
        assert_eq!(db.require_config().unwrap().account_selected, Some(9));
    }

    #[test]
    fn require_config_flags_a_missing_singleton() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(
            db.require_config(),
            Err(StoreError::NotFound { key: CONFIG_KEY, .. })
        ));
    }

    #[test]
    fn created_accounts_come_back_keyed() {
        let db = Database::in_memory().unwrap();
        let steve = db.create_account(&account("Steve", "s-1")).unwrap();
        let alex = db.create_account(&account("Alex", "a-1")).unwrap();
        assert!(alex.id > steve.id);

        let read = db.read_account(steve.id).unwrap().unwrap();
        assert_eq!(read.name, "Steve");
        assert_eq!(read.id, steve.id);

        let all = db.read_all_accounts().unwrap();
        assert_eq!(
            all.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            vec!["Steve", "Alex"]
        );
    }

    #[test]
    fn update_account_keeps_the_key() {
        let db = Database::in_memory().unwrap();
        let mut steve = db.create_account(&account("Steve", "s-1")).unwrap();
        steve.access_token = Some("rotated".into());
        db.update_account(&steve).unwrap();

        let read = db.read_account(steve.id).unwrap().unwrap();
        assert_eq!(read.access_token.as_deref(), Some("rotated"));
        assert_eq!(read.id, steve.id);
    }
}
