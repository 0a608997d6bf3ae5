//! Settings-panel write paths.
//!
//! Every mutation is a read-modify-write of the whole config document; the
//! store has no partial-field update.

use std::path::Path;

use crate::models::{CloseBehavior, LauncherConfig, MemoryRange, ScreenSize, Theme};

use super::{Session, SessionError};

impl Session {
    /// Set the JVM heap bounds in GiB.
    pub fn set_memory_range(&self, range: MemoryRange) -> Result<(), SessionError> {
        let mut config = self.db.require_config()?;
        config.java_config.java_memory = range;
        self.db.update_config(&config)?;
        Ok(())
    }

    /// Repair a memory range that no longer fits the machine: a stored
    /// minimum above the installed RAM resets the range to the default.
    /// Returns the range in effect afterwards.
    pub fn clamp_memory_to_system(&self, total_gib: u32) -> Result<MemoryRange, SessionError> {
        let mut config = self.db.require_config()?;
        if config.java_config.java_memory.min > total_gib {
            log::warn!(
                "[settings] Stored memory minimum {} GiB exceeds system total {} GiB, resetting",
                config.java_config.java_memory.min,
                total_gib
            );
            config.java_config.java_memory = MemoryRange::default();
            self.db.update_config(&config)?;
        }
        Ok(config.java_config.java_memory)
    }

    /// Point the launcher at a custom java binary, or `None` to go back to
    /// the bundled runtime. The file must be named `java` or `javaw`.
    pub fn set_java_path(&self, path: Option<&Path>) -> Result<(), SessionError> {
        let java_path = match path {
            Some(path) => {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default();
                if stem != "java" && stem != "javaw" {
                    return Err(SessionError::InvalidJavaPath);
                }
                Some(path.to_string_lossy().into_owned())
            }
            None => None,
        };

        let mut config = self.db.require_config()?;
        config.java_config.java_path = java_path;
        self.db.update_config(&config)?;
        Ok(())
    }

    pub fn set_resolution(&self, screen_size: ScreenSize) -> Result<(), SessionError> {
        let mut config = self.db.require_config()?;
        config.game_config.screen_size = screen_size;
        self.db.update_config(&config)?;
        Ok(())
    }

    pub fn reset_resolution(&self) -> Result<(), SessionError> {
        self.set_resolution(ScreenSize::default())
    }

    /// Parallel download slots for the install step.
    pub fn set_download_multi(&self, count: u32) -> Result<(), SessionError> {
        let mut config = self.db.require_config()?;
        config.launcher_config.download_multi = count;
        self.db.update_config(&config)?;
        Ok(())
    }

    pub fn reset_download_multi(&self) -> Result<(), SessionError> {
        self.set_download_multi(LauncherConfig::default().download_multi)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), SessionError> {
        let mut config = self.db.require_config()?;
        config.launcher_config.theme = theme;
        self.db.update_config(&config)?;
        Ok(())
    }

    pub fn set_close_behavior(&self, behavior: CloseBehavior) -> Result<(), SessionError> {
        let mut config = self.db.require_config()?;
        config.launcher_config.close_launcher = behavior;
        self.db.update_config(&config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccountRefresher;
    use crate::db::Database;
    use crate::models::Account;
    use crate::session::InstanceSource;
    use crate::signals::NullSink;
    use async_trait::async_trait;
    use beacon_lib::auth::AuthError;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct NoRefresh;

    #[async_trait]
    impl AccountRefresher for NoRefresh {
        async fn refresh(&self, account: &Account) -> Result<Account, AuthError> {
            Ok(account.clone())
        }
    }

    struct NoInstances;

    #[async_trait]
    impl InstanceSource for NoInstances {
        async fn instances(&self) -> Vec<crate::models::Instance> {
            Vec::new()
        }
    }

    fn session() -> Session {
        let db = Database::in_memory().unwrap();
        db.init_config().unwrap();
        Session::new(
            db,
            Arc::new(NoRefresh),
            Arc::new(NoInstances),
            Arc::new(NullSink),
        )
    }

    #[test]
    fn memory_range_too_big_for_the_machine_resets() {
        let session = session();
        session
            .set_memory_range(MemoryRange { min: 32, max: 64 })
            .unwrap();

        let repaired = session.clamp_memory_to_system(16).unwrap();
        assert_eq!(repaired, MemoryRange::default());
        assert_eq!(
            session.db.require_config().unwrap().java_config.java_memory,
            MemoryRange::default()
        );
    }

    #[test]
    fn fitting_memory_range_is_left_alone() {
        let session = session();
        let range = MemoryRange { min: 2, max: 8 };
        session.set_memory_range(range).unwrap();
        assert_eq!(session.clamp_memory_to_system(16).unwrap(), range);
    }

    #[test]
    fn java_path_must_name_a_java_binary() {
        let session = session();

        session
            .set_java_path(Some(&PathBuf::from("/opt/jdk/bin/java")))
            .unwrap();
        session
            .set_java_path(Some(&PathBuf::from("javaw.exe")))
            .unwrap();
        assert!(matches!(
            session.set_java_path(Some(&PathBuf::from("/usr/bin/python3"))),
            Err(SessionError::InvalidJavaPath)
        ));

        session.set_java_path(None).unwrap();
        assert!(session
            .db
            .require_config()
            .unwrap()
            .java_config
            .java_path
            .is_none());
    }

    #[test]
    fn resolution_reset_returns_to_default() {
        let session = session();
        session
            .set_resolution(ScreenSize {
                width: 1280,
                height: 720,
            })
            .unwrap();
        session.reset_resolution().unwrap();
        assert_eq!(
            session.db.require_config().unwrap().game_config.screen_size,
            ScreenSize::default()
        );
    }

    #[test]
    fn launcher_preferences_round_trip() {
        let session = session();
        session.set_download_multi(8).unwrap();
        session.set_theme(Theme::Dark).unwrap();
        session.set_close_behavior(CloseBehavior::CloseNone).unwrap();

        let config = session.db.require_config().unwrap();
        assert_eq!(config.launcher_config.download_multi, 8);
        assert_eq!(config.launcher_config.theme, Theme::Dark);
        assert_eq!(config.launcher_config.close_launcher, CloseBehavior::CloseNone);

        session.reset_download_multi().unwrap();
        assert_eq!(
            session
                .db
                .require_config()
                .unwrap()
                .launcher_config
                .download_multi,
            5
        );
    }
}
