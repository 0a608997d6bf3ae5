//! Instance selection validation against per-instance whitelists.

use crate::db::Database;
use crate::models::{Account, Instance, ServerStatus};
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// The stored selection exists and the account may use it.
    Valid,
    /// There was no usable selection; defaulted to the first open instance.
    Selected(String),
    /// The stored selection is whitelist-gated against this account.
    Reassigned { from: String, to: String },
    /// Nothing permitted is available. The stored selection is left alone
    /// so nothing is silently forgotten, and the shell can say so.
    NoAccessibleInstance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceResolution {
    /// The selection in effect after resolution (what the config now holds).
    pub selected: Option<String>,
    /// Connectivity descriptor of the resolved instance; `None` means
    /// offline/unknown.
    pub status: Option<ServerStatus>,
    pub outcome: SelectionOutcome,
}

/// Validate the stored instance selection for `account` against the live
/// list, correct it if the whitelist forbids it, and persist any correction
/// before returning.
pub fn resolve_and_persist(
    db: &Database,
    account: &Account,
    instances: &[Instance],
) -> Result<InstanceResolution, StoreError> {
    let mut config = db.require_config()?;
    let resolution = resolve(config.instance_selected.as_deref(), &account.name, instances);

    if resolution.selected.is_some() && resolution.selected != config.instance_selected {
        config.instance_selected = resolution.selected.clone();
        db.update_config(&config)?;
    }

    Ok(resolution)
}

/// Pure selection logic; [`resolve_and_persist`] adds the config write.
pub fn resolve(
    stored: Option<&str>,
    account_name: &str,
    instances: &[Instance],
) -> InstanceResolution {
    let current = stored.and_then(|name| instances.iter().find(|i| i.name == name));

    if let Some(instance) = current {
        if instance.permits(account_name) {
            return InstanceResolution {
                selected: Some(instance.name.clone()),
                status: instance.status.clone(),
                outcome: SelectionOutcome::Valid,
            };
        }

        return match first_open(instances) {
            Some(open) => InstanceResolution {
                selected: Some(open.name.clone()),
                status: open.status.clone(),
                outcome: SelectionOutcome::Reassigned {
                    from: instance.name.clone(),
                    to: open.name.clone(),
                },
            },
            None => InstanceResolution {
                selected: stored.map(str::to_string),
                status: None,
                outcome: SelectionOutcome::NoAccessibleInstance,
            },
        };
    }

    // Nothing selected, or the selection names an instance the server no
    // longer publishes.
    match first_open(instances) {
        Some(open) => InstanceResolution {
            selected: Some(open.name.clone()),
            status: open.status.clone(),
            outcome: SelectionOutcome::Selected(open.name.clone()),
        },
        None => InstanceResolution {
            selected: stored.map(str::to_string),
            status: None,
            outcome: SelectionOutcome::NoAccessibleInstance,
        },
    }
}

fn first_open(instances: &[Instance]) -> Option<&Instance> {
    instances.iter().find(|i| !i.whitelist_active)
}
