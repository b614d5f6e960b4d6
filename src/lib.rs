//! # Sen
//!
//! Application bootstrap for Rust services: a named component hub with dependency
//! injection, a plugin protocol for composing setup steps, and a lifecycle that runs
//! long-lived work and shuts it down exactly once.
//!
//! ## Features
//!
//! - **Component Hub**: singletons registered by name, wired by name or by type
//! - **Explicit Bindings**: components declare what they need through [`Injectable`]
//! - **Trait Object Support**: expose a component as `Arc<dyn Trait>` with [`Component::provides`]
//! - **Plugins**: ordered, fail-fast setup units that can nest into modules
//! - **Lifecycle**: concurrent run hooks, a once-only shutdown sequence, post-run cleanup
//! - **Graceful Shutdown**: Ctrl+C / SIGTERM handling as a plugin
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sen::prelude::*;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Announcer {
//!     greeter: Option<Arc<dyn Greeter>>,
//! }
//!
//! impl Injectable for Announcer {
//!     fn bindings(binder: &mut Binder<Self>) {
//!         binder.bind("*", |a: &mut Self, greeter: Arc<dyn Greeter>| a.greeter = Some(greeter));
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let app = Application::builder()
//!         .plugin(component(
//!             "greeter",
//!             Component::new(English).provides::<dyn Greeter>(|g| g as Arc<dyn Greeter>),
//!         ))
//!         .plugin(component("announcer", Component::injectable(Announcer::default())))
//!         .build()?;
//!
//!     let announcer = app.retrieve::<Announcer>("announcer")?;
//!     app.on_run(move |_| async move {
//!         if let Some(greeter) = &announcer.greeter {
//!             println!("{}", greeter.greet());
//!         }
//!         Ok(())
//!     });
//!
//!     app.run(&CancellationToken::new()).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod hub;
pub mod lifecycle;
pub mod plugin;

// Re-export core types
pub use config::Settings;
pub use error::{ErrorKind, Result, SenError};
pub use hub::{Binder, Component, Hub, Injectable};
pub use lifecycle::{Application, ApplicationBuilder, GracefulShutdown, Lifecycle, Service};
pub use plugin::{BoxedPlugin, Plugin};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

/// Prelude module for convenient imports
///
/// ```
/// use sen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{ErrorKind, Result, SenError};
    pub use crate::hub::{Binder, Component, Hub, Injectable};
    pub use crate::lifecycle::{
        Application, ApplicationBuilder, GracefulShutdown, Hook, Lifecycle, Phase, Service,
        ShutdownSignal, State, shutdown_signal,
    };
    pub use crate::plugin::{
        BoxedPlugin, Factory, Plugin, bundle, component, module, on_run, on_shutdown, post_run,
        provider, service,
    };
    pub use crate::plugins;
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
    pub use tokio_util::sync::CancellationToken;
}
