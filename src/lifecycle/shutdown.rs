//! Graceful Shutdown Handler
//!
//! Listens for OS signals while the application runs and turns the first one into
//! a lifecycle shutdown.

use super::Lifecycle;
use crate::config::Settings;
use crate::error::{Result, SenError};
use crate::hub::{Binder, Injectable, LIFECYCLE};
use crate::plugin::Plugin;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Plugin that shuts the application down on Ctrl+C or SIGTERM.
///
/// Signal handlers are installed when the plugin is applied inside a runtime, or at
/// the start of the run phase otherwise, so a signal arriving before the listener
/// task is polled is not lost. The listener lives as long as the run phase. When
/// every run hook has returned it stops listening and the application exits on its own.
///
/// # Example
///
/// ```rust,ignore
/// let app = Application::new()?;
/// app.with(GracefulShutdown::default())?;
/// app.run(&CancellationToken::new()).await?;
/// ```
#[derive(Default)]
pub struct GracefulShutdown {
    lifecycle: Option<Arc<Lifecycle>>,
    settings: Option<Arc<Settings>>,
}

impl Injectable for GracefulShutdown {
    fn bindings(binder: &mut Binder<Self>) {
        binder
            .bind(LIFECYCLE, |p: &mut Self, lifecycle: Arc<Lifecycle>| {
                p.lifecycle = Some(lifecycle)
            })
            .bind("settings,optional", |p: &mut Self, settings: Arc<Settings>| {
                p.settings = Some(settings)
            });
    }
}

impl Plugin for GracefulShutdown {
    fn initialize(&mut self) -> Result<()> {
        let lifecycle = self
            .lifecycle
            .as_ref()
            .ok_or_else(|| SenError::not_registered(LIFECYCLE))?;
        let timeout = self.settings.as_ref().and_then(|s| s.shutdown_timeout());

        let signals = match Handle::try_current() {
            Ok(_) => Some(ShutdownSignal::install().map_err(SenError::hook)?),
            Err(_) => None,
        };

        let handle = Lifecycle::clone(lifecycle);
        lifecycle.on_run(move |token| async move {
            let signals = match signals {
                Some(signals) => signals,
                None => ShutdownSignal::install().map_err(SenError::hook)?,
            };
            tokio::spawn(listen(handle, signals, token, timeout));
            Ok(())
        });
        Ok(())
    }
}

async fn listen(
    lifecycle: Lifecycle,
    mut signals: ShutdownSignal,
    token: CancellationToken,
    timeout: Option<Duration>,
) {
    tokio::select! {
        _ = token.cancelled() => {
            tracing::debug!("Run phase finished, no longer listening for signals");
        }
        _ = signals.recv() => shutdown(lifecycle, timeout).await,
    }
}

async fn shutdown(lifecycle: Lifecycle, timeout: Option<Duration>) {
    tracing::info!("Starting graceful shutdown...");

    let waiter = CancellationToken::new();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, lifecycle.shutdown(&waiter)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(?limit, "Graceful shutdown still running, stopped waiting");
                return;
            }
        },
        None => lifecycle.shutdown(&waiter).await,
    };

    match result {
        Ok(()) => tracing::info!("Graceful shutdown complete"),
        Err(err) => tracing::error!(error = %err, "Error during graceful shutdown"),
    }
}

/// Installed handlers for Ctrl+C and, on unix, SIGTERM.
///
/// Signals received after [`ShutdownSignal::install`] are buffered until
/// [`ShutdownSignal::recv`] is polled.
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: signal::unix::Signal,
    #[cfg(unix)]
    terminate: signal::unix::Signal,
    #[cfg(not(unix))]
    ctrl_c: signal::windows::CtrlC,
}

impl ShutdownSignal {
    /// Install the handlers. Must be called from within a Tokio runtime.
    pub fn install() -> io::Result<Self> {
        #[cfg(unix)]
        {
            use signal::unix::{SignalKind, signal};
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {
                ctrl_c: signal::windows::ctrl_c()?,
            })
        }
    }

    /// Wait for the next signal.
    pub async fn recv(&mut self) {
        #[cfg(unix)]
        tokio::select! {
            _ = self.interrupt.recv() => tracing::info!("Received Ctrl+C signal"),
            _ = self.terminate.recv() => tracing::info!("Received SIGTERM signal"),
        }

        #[cfg(not(unix))]
        {
            self.ctrl_c.recv().await;
            tracing::info!("Received Ctrl+C signal");
        }
    }
}

/// Resolves when the process receives Ctrl+C or, on unix, SIGTERM.
///
/// ```rust,ignore
/// tokio::select! {
///     _ = shutdown_signal() => {}
///     _ = server.serve() => {}
/// }
/// ```
pub async fn shutdown_signal() -> io::Result<()> {
    ShutdownSignal::install()?.recv().await;
    Ok(())
}
