//! Headless launcher session driver.
//!
//! Runs the full startup sequence (remote config, store, reconciliation,
//! instance resolution) with a logging sink standing in for the window
//! shell. The shell embeds the same [`Session`] and swaps in its own sink.

use std::sync::Arc;

use anyhow::Context;
use solstice_launcher::auth::MicrosoftAuthenticator;
use solstice_launcher::db::Database;
use solstice_launcher::paths;
use solstice_launcher::remote::RemoteApi;
use solstice_launcher::session::{Session, StartOutcome};
use solstice_launcher::signals::LogSink;

const DEFAULT_API_BASE: &str = "https://files.solstice-launcher.net";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|e| {
        eprintln!("Solstice Launcher closed unexpectedly: {e:?}");
    }));

    let data_dir = paths::app_config_dir()?;
    let db = Database::open(&data_dir)?;

    // Early config read so the persisted debug flag can raise the level
    // before anything logs.
    let mut log_level = log::LevelFilter::Info;
    if let Ok(Some(config)) = db.read_config() {
        if config.launcher_config.debug_logging {
            log_level = log::LevelFilter::Debug;
        }
    }
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    let api_base =
        std::env::var("SOLSTICE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    let remote = RemoteApi::new(&api_base)?;

    // The distribution server is load-bearing: without its config there is
    // no OAuth client id and no instance list. Terminal error state.
    let remote_config = remote
        .launcher_config()
        .await
        .context("distribution server not accessible")?;

    log::info!(
        "[main] Distribution config loaded (online: {})",
        remote_config.online
    );

    for item in remote.news(&remote_config).await {
        log::info!("[main] news: {} | {}", item.publish_date, item.title);
    }

    let authenticator = Arc::new(MicrosoftAuthenticator::new(&remote_config.client_id));
    let session = Session::new(db, authenticator, Arc::new(remote), Arc::new(LogSink));

    match session.start().await? {
        StartOutcome::NoAccount => {
            log::info!("[main] No linked accounts; waiting for sign-in");
        }
        StartOutcome::Main {
            account,
            resolution,
        } => {
            log::info!(
                "[main] Ready: {} on {:?}",
                account.name,
                resolution.selected
            );

            if let Some(status) = &resolution.status {
                let ping = beacon_lib::api::status::ping(&status.ip, status.port).await;
                if ping.online {
                    log::info!(
                        "[main] {} online: {}/{} players, {} ms",
                        status.server_name,
                        ping.players_online,
                        ping.players_max,
                        ping.latency_ms
                    );
                } else {
                    log::info!("[main] {} offline", status.server_name);
                }
            }

            if let Some(options) = session.prepare_launch(&data_dir).await? {
                log::info!(
                    "[main] Launch profile ready: {} ({} / {})",
                    options.instance,
                    options.memory.min,
                    options.memory.max
                );
            }
        }
    }

    Ok(())
}
