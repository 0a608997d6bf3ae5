//! UI signal boundary.
//!
//! The windowing shell is not this crate's business; everything it needs to
//! hear travels through [`UiSink`], injected wherever signals originate.
//! No module-level window handles, so the session logic tests against a
//! recording sink.

use crate::auth::AuthStage;
use crate::launch::LaunchEvent;
use crate::models::{Account, ServerStatus};

/// Signals produced by the core for the shell to render.
///
/// Every method has a no-op default so sinks only handle what they care
/// about.
pub trait UiSink: Send + Sync {
    /// An account appeared or its display data (name, skin) changed.
    fn account_upserted(&self, _account: &Account) {}

    /// The active selection changed; payload is the full record.
    fn account_selected(&self, _account: &Account) {}

    fn account_removed(&self, _id: i64) {}

    /// A valid selection exists; show the main flow.
    fn enter_main_flow(&self) {}

    /// No linked accounts remain; show the sign-in entry flow.
    fn enter_no_account_flow(&self) {}

    /// The resolved instance's connectivity descriptor, `None` meaning
    /// offline/unknown.
    fn instance_status_changed(&self, _status: Option<&ServerStatus>) {}

    fn auth_stage(&self, _stage: &AuthStage) {}

    fn launch_event(&self, _event: &LaunchEvent) {}
}

/// Sink that drops every signal. Headless runs and capability calls that
/// have nothing to announce.
pub struct NullSink;

impl UiSink for NullSink {}

/// Sink that narrates signals to the log, used by the headless binary.
pub struct LogSink;

impl UiSink for LogSink {
    fn account_upserted(&self, account: &Account) {
        log::info!("[ui] account listed: {} ({})", account.name, account.uuid);
    }

    fn account_selected(&self, account: &Account) {
        log::info!("[ui] account selected: {} (id {})", account.name, account.id);
    }

    fn account_removed(&self, id: i64) {
        log::info!("[ui] account removed: id {}", id);
    }

    fn enter_main_flow(&self) {
        log::info!("[ui] entering main flow");
    }

    fn enter_no_account_flow(&self) {
        log::info!("[ui] entering sign-in flow");
    }

    fn instance_status_changed(&self, status: Option<&ServerStatus>) {
        match status {
            Some(status) => log::info!(
                "[ui] instance status: {} at {}:{}",
                status.server_name,
                status.ip,
                status.port
            ),
            None => log::info!("[ui] instance status: offline"),
        }
    }

    fn auth_stage(&self, stage: &AuthStage) {
        log::info!("[ui] auth stage: {:?}", stage);
    }

    fn launch_event(&self, event: &LaunchEvent) {
        log::info!("[ui] launch: {:?}", event);
    }
}
