//! Application Bootstrap
//!
//! The composition root: one hub, one lifecycle and the settings they were built
//! with. Plugins are applied against the hub, then `run` drives the lifecycle.

use super::{GracefulShutdown, Lifecycle};
use crate::config::Settings;
use crate::error::Result;
use crate::hub::{APP, Component, Hub, Injectable, LIFECYCLE, SETTINGS};
use crate::plugin::{self, BoxedPlugin, Plugin};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application with an integrated component hub and lifecycle.
///
/// The hub starts with four entries: `hub`, `app`, `lifecycle` and `settings`.
///
/// # Example
///
/// ```rust,ignore
/// use sen::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let app = Application::builder()
///         .plugin(component("data", Component::new(10)))
///         .plugin(on_run(|token| async move {
///             token.cancelled().await;
///             Ok(())
///         }))
///         .build()?;
///
///     app.run(&CancellationToken::new()).await
/// }
/// ```
pub struct Application {
    hub: Arc<Hub>,
    lifecycle: Lifecycle,
    settings: Arc<Settings>,
}

impl Application {
    /// Create an application with default [`Settings`].
    pub fn new() -> Result<Arc<Self>> {
        Self::with_settings(Settings::default())
    }

    /// Create an application and register its reserved components.
    ///
    /// The application itself is stored weakly under `app`, so dropping the last
    /// `Arc` still tears it down.
    pub fn with_settings(settings: Settings) -> Result<Arc<Self>> {
        let hub = Hub::new();
        let lifecycle = Lifecycle::new();
        let settings = Arc::new(settings);

        hub.register(LIFECYCLE, Component::new(lifecycle.clone()))?;
        hub.register(SETTINGS, Component::shared(Arc::clone(&settings)))?;

        let app = Arc::new(Self {
            hub,
            lifecycle,
            settings,
        });
        app.hub.register_weak(APP, Arc::downgrade(&app))?;
        Ok(app)
    }

    /// Start building an application from settings and plugins.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Get a reference to the component hub.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Get a reference to the lifecycle.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Get a reference to the settings the application was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply `plugins` in order, stopping at the first error.
    pub fn apply(&self, plugins: Vec<BoxedPlugin>) -> Result<()> {
        plugin::apply(&self.hub, plugins)
    }

    /// Apply a single plugin.
    pub fn with<P: Plugin>(&self, plugin: P) -> Result<()> {
        self.apply(vec![Box::new(plugin) as BoxedPlugin])
    }

    /// Register a component into the hub. See [`Hub::register`].
    pub fn register<T>(&self, name: &str, component: Component<T>) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.hub.register(name, component)
    }

    /// Retrieve a component from the hub. See [`Hub::retrieve`].
    pub fn retrieve<T: ?Sized + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.hub.retrieve(name)
    }

    /// Wire `component` from the hub without storing it.
    pub fn inject<C: Injectable>(&self, component: &mut C) -> Result<()> {
        self.hub.inject(component)
    }

    /// Register a run hook. See [`Lifecycle::on_run`].
    pub fn on_run<F, Fut>(&self, func: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.lifecycle.on_run(func);
    }

    /// Register a shutdown hook. See [`Lifecycle::on_shutdown`].
    pub fn on_shutdown<F, Fut>(&self, func: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.lifecycle.on_shutdown(func);
    }

    /// Register a post-run hook. See [`Lifecycle::post_run`].
    pub fn post_run<F, Fut>(&self, func: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.lifecycle.post_run(func);
    }

    /// Run until every run hook returned and the shutdown sequence completed.
    pub async fn run(&self, token: &CancellationToken) -> Result<()> {
        tracing::info!("Starting application...");
        let result = self.lifecycle.run(token).await;
        tracing::info!(ok = result.is_ok(), "Application stopped");
        result
    }

    /// Trigger the shutdown sequence and wait for it, or for `token`.
    pub async fn shutdown(&self, token: &CancellationToken) -> Result<()> {
        tracing::info!("Shutting down application...");
        self.lifecycle.shutdown(token).await
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.hub.clear();
        self.lifecycle.discard_pending_hooks();
    }
}

/// Builder for Application
#[derive(Default)]
pub struct ApplicationBuilder {
    settings: Settings,
    plugins: Vec<BoxedPlugin>,
}

impl ApplicationBuilder {
    /// Create a builder with default settings and no plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `settings` instead of the defaults.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Append a plugin. Plugins are applied in the order they were added.
    pub fn plugin<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Append several plugins, usually built with [`plugins!`](crate::plugins).
    pub fn plugins(mut self, plugins: Vec<BoxedPlugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Create the application and apply the collected plugins.
    pub fn build(self) -> Result<Arc<Application>> {
        let app = Application::with_settings(self.settings)?;

        let mut plugins: Vec<BoxedPlugin> = Vec::with_capacity(self.plugins.len() + 1);
        if app.settings.handle_signals {
            plugins.push(Box::new(GracefulShutdown::default()));
        }
        plugins.extend(self.plugins);

        let count = plugins.len();
        app.apply(plugins)?;
        tracing::info!(plugins = count, components = app.hub.len(), "Application built");
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{Binder, HUB};
    use crate::plugin::component;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_reserved_components() {
        let app = Application::new().unwrap();
        assert_eq!(
            app.hub().names(),
            vec![APP, HUB, LIFECYCLE, SETTINGS]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );

        let this = app.retrieve::<Application>(APP).unwrap();
        assert!(Arc::ptr_eq(&app, &this));
        let settings = app.retrieve::<Settings>(SETTINGS).unwrap();
        assert_eq!(*settings, Settings::default());
    }

    #[test]
    fn test_drop_clears_hub() {
        let app = Application::new().unwrap();
        app.register("data", Component::new(10)).unwrap();

        let hub = Arc::clone(app.hub());
        drop(app);
        assert!(hub.is_empty());
    }

    #[derive(Default)]
    struct NeedsApp {
        app: Option<Arc<Application>>,
    }

    impl Injectable for NeedsApp {
        fn bindings(binder: &mut Binder<Self>) {
            binder.bind(APP, |c: &mut Self, app: Arc<Application>| c.app = Some(app));
        }
    }

    #[test]
    fn test_components_can_depend_on_app() {
        let app = Application::new().unwrap();
        let mut component = NeedsApp::default();
        app.inject(&mut component).unwrap();
        assert!(Arc::ptr_eq(&app, component.app.as_ref().unwrap()));
    }

    #[tokio::test]
    async fn test_builder_applies_plugins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let app = Application::builder()
            .plugin(component("data", Component::new(10)))
            .build()
            .unwrap();
        app.on_run(move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(*app.retrieve::<i32>("data").unwrap(), 10);
        app.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_builder_fails_on_missing_dependency() {
        #[derive(Default)]
        struct NeedsData {
            data: Option<Arc<i32>>,
        }

        impl Injectable for NeedsData {
            fn bindings(binder: &mut Binder<Self>) {
                binder.bind("data", |c: &mut Self, data: Arc<i32>| c.data = Some(data));
            }
        }

        impl Plugin for NeedsData {
            fn initialize(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let err = Application::builder()
            .plugin(NeedsData::default())
            .build()
            .err()
            .unwrap();
        assert!(err.is_not_registered());
    }

    #[tokio::test]
    async fn test_signal_handling_installs_listener() {
        let app = Application::builder()
            .settings(Settings::default().with_signal_handling(true))
            .build()
            .unwrap();
        app.run(&CancellationToken::new()).await.unwrap();
    }
}
