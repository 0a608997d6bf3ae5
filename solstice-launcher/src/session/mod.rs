//! Launcher session orchestration.
//!
//! Owns the startup sequence (config init, account reconciliation,
//! instance resolution, UI flow transition) and the user-driven account
//! operations. All external capabilities are injected: the refresher, the
//! instance source and the UI sink, so the whole flow runs against fakes
//! in tests.

pub mod reconcile;
pub mod resolver;
mod settings;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::{AccountRefresher, LoginOutcome};
use crate::db::Database;
use crate::launch::{build_launch_options, LaunchOptions};
use crate::models::{Account, Instance, ServerStatus};
use crate::signals::UiSink;
use crate::store::StoreError;

pub use reconcile::{ReconcileError, ReconcileReport, SessionFlow};
pub use resolver::{InstanceResolution, SelectionOutcome};

/// Source of the live instance list. The distribution server in
/// production; a fixed list in tests. An empty list is a valid answer.
#[async_trait]
pub trait InstanceSource: Send + Sync {
    async fn instances(&self) -> Vec<Instance>;
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("no account with id {0}")]
    UnknownAccount(i64),
    #[error("java binary must be named java or javaw")]
    InvalidJavaPath,
}

/// How a session start ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// A valid selection exists; the main flow was entered.
    Main {
        account: Account,
        resolution: InstanceResolution,
    },
    /// No linked accounts; the sign-in flow was entered.
    NoAccount,
}

pub struct Session {
    pub(crate) db: Database,
    pub(crate) refresher: Arc<dyn AccountRefresher>,
    pub(crate) instances: Arc<dyn InstanceSource>,
    pub(crate) sink: Arc<dyn UiSink>,
    pub(crate) reconcile_lock: tokio::sync::Mutex<()>,
}

impl Session {
    pub fn new(
        db: Database,
        refresher: Arc<dyn AccountRefresher>,
        instances: Arc<dyn InstanceSource>,
        sink: Arc<dyn UiSink>,
    ) -> Self {
        Self {
            db,
            refresher,
            instances,
            sink,
            reconcile_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Session start: first-run config init, reconciliation, instance
    /// resolution, then hand the shell its entry flow. Store faults
    /// propagate to the caller; they are terminal for the session.
    pub async fn start(&self) -> Result<StartOutcome, SessionError> {
        if self.db.read_config()?.is_none() {
            log::info!("[session] First run, writing default client config");
            self.db.init_config()?;
        }

        let report = self.reconcile().await?;

        match report.flow {
            SessionFlow::NoAccount => {
                self.sink.enter_no_account_flow();
                Ok(StartOutcome::NoAccount)
            }
            SessionFlow::Main(account) => {
                let instances = self.instances.instances().await;
                let resolution = resolver::resolve_and_persist(&self.db, &account, &instances)?;
                self.sink.instance_status_changed(resolution.status.as_ref());
                self.sink.enter_main_flow();
                Ok(StartOutcome::Main {
                    account,
                    resolution,
                })
            }
        }
    }

    /// Handle a completed login. Identity rule: an existing record with the
    /// same uuid (dashes ignored) is reused and selected, never duplicated;
    /// a renamed profile must not orphan its play data.
    pub async fn login_completed(
        &self,
        outcome: LoginOutcome,
    ) -> Result<Option<Account>, SessionError> {
        let data = match outcome {
            LoginOutcome::Cancelled => {
                log::info!("[session] Sign-in cancelled");
                return Ok(None);
            }
            LoginOutcome::Completed(data) => data,
        };

        let mut config = self.db.require_config()?;
        let accounts = self.db.read_all_accounts()?;

        if let Some(existing) = accounts
            .iter()
            .find(|a| a.normalized_uuid() == data.normalized_uuid())
        {
            log::info!(
                "[session] Login matches existing account {} (id {}), reusing it",
                existing.name,
                existing.id
            );
            config.account_selected = Some(existing.id);
            self.db.update_config(&config)?;
            self.sink.account_upserted(existing);
            self.sink.account_selected(existing);
            return Ok(Some(existing.clone()));
        }

        let account = self.db.create_account(&data)?;
        config.account_selected = Some(account.id);
        self.db.update_config(&config)?;

        let instances = self.instances.instances().await;
        let resolution = resolver::resolve_and_persist(&self.db, &account, &instances)?;

        self.sink.account_upserted(&account);
        self.sink.account_selected(&account);
        self.sink.instance_status_changed(resolution.status.as_ref());

        Ok(Some(account))
    }

    /// Remove an account at the user's request. Removing a non-selected
    /// account never touches the selection; removing the selected one falls
    /// back to the first remaining account or the sign-in flow.
    pub async fn remove_account(&self, id: i64) -> Result<(), SessionError> {
        self.db.remove_account(id)?;
        self.sink.account_removed(id);

        let mut config = self.db.require_config()?;
        if config.account_selected != Some(id) {
            return Ok(());
        }

        let accounts = self.db.read_all_accounts()?;
        match accounts.first() {
            Some(next) => {
                config.account_selected = Some(next.id);
                self.db.update_config(&config)?;
                self.sink.account_selected(next);

                let instances = self.instances.instances().await;
                let resolution = resolver::resolve_and_persist(&self.db, next, &instances)?;
                self.sink.instance_status_changed(resolution.status.as_ref());
            }
            None => {
                config.account_selected = None;
                self.db.update_config(&config)?;
                self.sink.enter_no_account_flow();
            }
        }
        Ok(())
    }

    /// Switch the active account, re-checking the instance selection
    /// against the new account's whitelist standing.
    pub async fn select_account(&self, id: i64) -> Result<Account, SessionError> {
        let account = self
            .db
            .read_account(id)?
            .ok_or(SessionError::UnknownAccount(id))?;

        let instances = self.instances.instances().await;
        let resolution = resolver::resolve_and_persist(&self.db, &account, &instances)?;

        let mut config = self.db.require_config()?;
        config.account_selected = Some(account.id);
        self.db.update_config(&config)?;

        self.sink.account_selected(&account);
        self.sink.instance_status_changed(resolution.status.as_ref());
        Ok(account)
    }

    /// Switch the selected instance and report its connectivity descriptor.
    pub async fn select_instance(
        &self,
        name: &str,
    ) -> Result<Option<ServerStatus>, SessionError> {
        let instances = self.instances.instances().await;

        let mut config = self.db.require_config()?;
        config.instance_selected = Some(name.to_string());
        self.db.update_config(&config)?;

        let status = instances
            .iter()
            .find(|i| i.name == name)
            .and_then(|i| i.status.clone());
        self.sink.instance_status_changed(status.as_ref());
        Ok(status)
    }

    /// Assemble launch options for the current selection. `None` when no
    /// account or instance is selected, or the instance vanished from the
    /// live list.
    pub async fn prepare_launch(
        &self,
        data_dir: &Path,
    ) -> Result<Option<LaunchOptions>, SessionError> {
        let config = self.db.require_config()?;

        let Some(account_id) = config.account_selected else {
            return Ok(None);
        };
        let Some(account) = self.db.read_account(account_id)? else {
            return Ok(None);
        };

        let instances = self.instances.instances().await;
        let Some(instance) = instances
            .iter()
            .find(|i| Some(i.name.as_str()) == config.instance_selected.as_deref())
        else {
            return Ok(None);
        };

        Ok(Some(build_launch_options(
            &config, instance, &account, data_dir,
        )))
    }
}
