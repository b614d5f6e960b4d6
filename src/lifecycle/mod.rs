//! Lifecycle Management
//!
//! Hooks are grouped into three phases:
//!
//! 1. **Run**: executed concurrently by [`Lifecycle::run`]
//! 2. **Shutdown**: executed once, when the run phase ends or someone calls
//!    [`Lifecycle::shutdown`]
//! 3. **PostRun**: executed after the shutdown hooks and the run phase completed
//!
//! # Example
//!
//! ```rust,ignore
//! let lifecycle = Lifecycle::new();
//! let (tx, mut rx) = tokio::sync::mpsc::channel::<Job>(16);
//!
//! lifecycle.on_run(move |token| async move {
//!     loop {
//!         tokio::select! {
//!             _ = token.cancelled() => return Ok(()),
//!             Some(job) = rx.recv() => job.process().await?,
//!         }
//!     }
//! });
//! lifecycle.on_shutdown(move |_| async move {
//!     drop(tx);
//!     Ok(())
//! });
//!
//! lifecycle.run(&CancellationToken::new()).await?;
//! ```

mod application;
mod executor;
mod hook;
mod manager;
mod service;
mod shutdown;

pub use application::{Application, ApplicationBuilder};
pub use hook::{Hook, Phase};
pub use manager::{Lifecycle, State};
pub use service::Service;
pub use shutdown::{GracefulShutdown, ShutdownSignal, shutdown_signal};
