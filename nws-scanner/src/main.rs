use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use nws_scanner::config::{self, AppConfig};
use nws_scanner::feed::NwsFeed;
use nws_scanner::notification::NotificationService;
use nws_scanner::scanner::AlertScanner;
use nws_scanner::store::SeenIdStore;
use nws_scanner::utils::http_client;
use nws_scanner::{logging, panic_hook};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logging comes up before the rest of the configuration so config errors are recorded.
    let log_dir = std::env::var(config::keys::LOG_DIR)
        .ok()
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_LOG_DIR));
    let _log_guard = logging::init_logging(&log_dir).context("initializing logging")?;
    panic_hook::install(&log_dir);

    info!(version = env!("CARGO_PKG_VERSION"), "National Weather Service Scanner starting");

    let config = AppConfig::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;
    config.log_summary();

    let cancel = CancellationToken::new();
    logging::start_retention_cleanup(config.log_dir.clone(), cancel.clone());

    let client = http_client::build_client(&config.feed.user_agent, config.feed.request_timeout)
        .context("building HTTP client")?;
    let source = Arc::new(NwsFeed::new(config.feed.clone(), client.clone()));
    let notifier = NotificationService::from_config(&config.channels, client)
        .context("building notification channels")?;
    let store = SeenIdStore::load(&config.scanner.state_file, config.scanner.alert_cap)
        .context("loading seen-alert history")?;
    info!(
        path = %store.path().display(),
        known = store.len(),
        "Seen-alert history loaded"
    );

    let scanner = AlertScanner::new(
        source,
        notifier,
        store,
        config.scanner.clone(),
        cancel.clone(),
    );

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown requested");
        signal_token.cancel();
    });

    let result = scanner.run().await;
    cancel.cancel();

    match result {
        Ok(()) => {
            info!("National Weather Service Scanner stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Scanner terminated");
            Err(e.into())
        }
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
