// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling: SIGINT/SIGTERM trigger shutdown, SIGHUP reloads settings.

use std::path::PathBuf;
use std::sync::Arc;

use parley_config::LiveSettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Re-reads the configuration on SIGHUP and swaps in the new translation
/// settings. Invalid configuration is logged and the current settings kept.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(
    settings: Arc<LiveSettings>,
    config_path: Option<PathBuf>,
    shutdown: CancellationToken,
) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!(error = %e, "SIGHUP handler unavailable, settings reload disabled");
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    reload(&settings, config_path.as_deref());
                }
            }
        }
    });
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(
    _settings: Arc<LiveSettings>,
    _config_path: Option<PathBuf>,
    _shutdown: CancellationToken,
) {
}

/// Loads the configuration again and applies its translation section.
pub fn reload(settings: &LiveSettings, config_path: Option<&std::path::Path>) -> bool {
    let loaded = match config_path {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => {
            settings.update(config.translation.to_settings());
            true
        }
        Err(errors) => {
            for error in &errors {
                warn!(error = %error, "configuration reload rejected");
            }
            false
        }
    }
}
