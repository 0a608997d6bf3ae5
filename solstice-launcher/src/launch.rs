//! Boundary to the external game download/launch library.
//!
//! The launcher core assembles a [`LaunchOptions`] from the client config,
//! the selected instance and the active account; the library behind
//! [`GameLauncher`] does the downloading and process management and streams
//! [`LaunchEvent`]s back.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Account, CloseBehavior, ConfigClient, Instance, ScreenSize};
use crate::signals::UiSink;

/// Lifecycle and progress events reported while installing and running the
/// game.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchEvent {
    Extract { file: String },
    Progress { current: u64, total: u64 },
    Check { current: u64, total: u64 },
    /// Download speed in bytes per second.
    Speed(u64),
    Patch,
    /// The game process is up and producing output.
    Started,
    Closed,
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchOptions {
    pub url: Option<String>,
    pub instance: String,
    pub version: Option<String>,
    pub path: PathBuf,
    /// Keep the game alive if the launcher exits, unless the user chose to
    /// take everything down together.
    pub detached: bool,
    pub download_concurrency: u32,
    pub intel_enabled_mac: bool,
    pub loader: LoaderOptions,
    pub verify: bool,
    pub ignored: Vec<String>,
    pub java_path: Option<String>,
    pub jvm_args: Vec<String>,
    pub game_args: Vec<String>,
    pub screen: ScreenSize,
    pub memory: MemoryOptions,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoaderOptions {
    pub loader_type: Option<String>,
    pub build: Option<String>,
    pub enabled: bool,
}

/// JVM heap bounds in the `"4096M"` form the launch library expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryOptions {
    pub min: String,
    pub max: String,
}

#[async_trait]
pub trait GameLauncher: Send + Sync {
    /// Download what is missing and start the game, reporting progress and
    /// lifecycle through the sink.
    async fn launch(&self, options: &LaunchOptions, sink: &dyn UiSink) -> anyhow::Result<()>;
}

/// Assemble the launch options for one instance.
pub fn build_launch_options(
    config: &ConfigClient,
    instance: &Instance,
    _account: &Account,
    data_dir: &Path,
) -> LaunchOptions {
    let loader = instance.loader.clone().unwrap_or_default();
    let memory = &config.java_config.java_memory;

    LaunchOptions {
        url: instance.url.clone(),
        instance: instance.name.clone(),
        version: loader.minecraft_version.clone(),
        path: data_dir.to_path_buf(),
        detached: config.launcher_config.close_launcher != CloseBehavior::CloseAll,
        download_concurrency: config.launcher_config.download_multi,
        intel_enabled_mac: config.launcher_config.intel_enabled_mac,
        loader: LoaderOptions {
            enabled: loader
                .loader_type
                .as_deref()
                .is_some_and(|t| t != "none"),
            loader_type: loader.loader_type,
            build: loader.loader_version,
        },
        verify: instance.verify,
        ignored: instance.ignored.clone(),
        java_path: config.java_config.java_path.clone(),
        jvm_args: instance.jvm_args.clone(),
        game_args: instance.game_args.clone(),
        screen: config.game_config.screen_size,
        memory: MemoryOptions {
            min: format_heap(memory.min, 1024),
            max: format_heap(memory.max, 2048),
        },
        timeout_ms: 10_000,
    }
}

// A zeroed bound falls back rather than producing a 0M heap.
fn format_heap(gib: u32, fallback_mib: u32) -> String {
    let mib = if gib == 0 { fallback_mib } else { gib * 1024 };
    format!("{}M", mib)
}
