//! Startup account reconciliation.
//!
//! Walks every stored account once per session start, refreshes the
//! token-bearing ones, drops the ones whose credentials are dead and
//! repairs the selection pointer, so the UI is only ever handed a
//! selection that references a live record.

use thiserror::Error;

use crate::models::Account;
use crate::store::StoreError;

use super::Session;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A pass is already in flight; interleaving two passes over the same
    /// account list could double-delete or race the selection writes.
    #[error("a reconciliation pass is already running")]
    AlreadyRunning,
    /// Store faults are fatal to the whole pass, unlike per-account
    /// refresh failures.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where the session goes after reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionFlow {
    /// A valid selection exists.
    Main(Account),
    /// The accounts table is empty.
    NoAccount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub refreshed: usize,
    pub dropped: usize,
    pub flow: SessionFlow,
}

impl Session {
    /// Run one reconciliation pass. At most one runs at a time; a second
    /// call while one is pending is rejected, not queued.
    ///
    /// The pass lock is held for the whole run, which also serialises every
    /// config read-modify-write inside it.
    pub async fn reconcile(&self) -> Result<ReconcileReport, ReconcileError> {
        let _pass = self
            .reconcile_lock
            .try_lock()
            .map_err(|_| ReconcileError::AlreadyRunning)?;

        let mut config = self.db.require_config()?;
        let accounts = self.db.read_all_accounts()?;

        let mut refreshed = 0usize;
        let mut dropped = 0usize;

        for account in accounts {
            if !account.is_token_bearing() {
                continue;
            }

            log::info!(
                "[session] Refreshing {:?} account | username: {}",
                account.meta.kind,
                account.name
            );

            match self.refresher.refresh(&account).await {
                Ok(mut fresh) => {
                    // Refresh never changes identity: the record keeps its key.
                    fresh.id = account.id;
                    self.db.update_account(&fresh)?;
                    self.sink.account_upserted(&fresh);
                    if config.account_selected == Some(fresh.id) {
                        // Re-announce: display data such as the skin may differ.
                        self.sink.account_selected(&fresh);
                    }
                    refreshed += 1;
                }
                Err(e) => {
                    log::warn!("[session] Dropping account {}: {}", account.name, e);
                    self.db.remove_account(account.id)?;
                    self.sink.account_removed(account.id);
                    if config.account_selected == Some(account.id) {
                        // Never leave a dangling selection, even between
                        // loop iterations.
                        config.account_selected = None;
                        self.db.update_config(&config)?;
                    }
                    dropped += 1;
                }
            }
        }

        let accounts = self.db.read_all_accounts()?;
        let mut config = self.db.require_config()?;

        if accounts.is_empty() {
            if config.account_selected.is_some() {
                config.account_selected = None;
                self.db.update_config(&config)?;
            }
            log::info!("[session] No accounts remain after reconciliation");
            return Ok(ReconcileReport {
                refreshed,
                dropped,
                flow: SessionFlow::NoAccount,
            });
        }

        let selected = accounts
            .iter()
            .find(|a| Some(a.id) == config.account_selected)
            .cloned();

        let selected = match selected {
            Some(account) => account,
            None => {
                // Null or dangling pointer: fall back deterministically to
                // the first surviving account.
                let fallback = accounts[0].clone();
                config.account_selected = Some(fallback.id);
                self.db.update_config(&config)?;
                self.sink.account_selected(&fallback);
                fallback
            }
        };

        log::info!(
            "[session] Reconciliation done: {} refreshed, {} dropped, selected {}",
            refreshed,
            dropped,
            selected.name
        );

        Ok(ReconcileReport {
            refreshed,
            dropped,
            flow: SessionFlow::Main(selected),
        })
    }
}
