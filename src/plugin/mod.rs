//! Plugin protocol.
//!
//! A plugin is an [`Injectable`] unit of setup. Applying a plugin first wires its
//! bindings from the [`Hub`], then calls [`Plugin::initialize`]. Plugins are applied
//! strictly in order and the first failure aborts the remaining ones.

mod component;
mod factory;
mod hooks;
mod module;

pub use component::{ComponentPlugin, component};
pub use factory::{Factory, Provider, ServiceProvider, provider, service};
pub use hooks::{HookPlugin, on_run, on_shutdown, post_run};
pub use module::{Module, bundle, module};

use crate::error::Result;
use crate::hub::{Hub, Injectable};
use std::any::type_name;

/// A setup step applied to the hub.
///
/// The plugin's own bindings are resolved first, then [`Plugin::initialize`] runs.
/// An error from either aborts the remaining plugins.
pub trait Plugin: Injectable + Send {
    /// Finish setup once every binding is in place.
    fn initialize(&mut self) -> Result<()>;
}

/// Object-safe view of a [`Plugin`], so heterogeneous plugins can share a list.
pub trait ErasedPlugin: Send {
    fn plugin_name(&self) -> &'static str;

    fn wire(&mut self, hub: &Hub) -> Result<()>;

    fn install(&mut self) -> Result<()>;
}

impl<P: Plugin> ErasedPlugin for P {
    fn plugin_name(&self) -> &'static str {
        type_name::<P>()
    }

    fn wire(&mut self, hub: &Hub) -> Result<()> {
        hub.inject(self)
    }

    fn install(&mut self) -> Result<()> {
        self.initialize()
    }
}

pub type BoxedPlugin = Box<dyn ErasedPlugin>;

/// Wire and initialize `plugins` in order, stopping at the first error.
pub fn apply(hub: &Hub, plugins: Vec<BoxedPlugin>) -> Result<()> {
    for mut plugin in plugins {
        let name = plugin.plugin_name();
        if let Err(err) = plugin.wire(hub).and_then(|()| plugin.install()) {
            tracing::debug!(plugin = name, error = %err, "Plugin failed");
            return Err(err);
        }
        tracing::debug!(plugin = name, "Applied plugin");
    }
    Ok(())
}

/// Build a `Vec<BoxedPlugin>` from plugin values.
///
/// ```rust,ignore
/// app.apply(plugins![
///     component("data", Component::new(10)),
///     on_run(|_| async { Ok(()) }),
/// ])?;
/// ```
#[macro_export]
macro_rules! plugins {
    ($($plugin:expr),* $(,)?) => {
        ::std::vec![$(::std::boxed::Box::new($plugin) as $crate::plugin::BoxedPlugin),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hub::{Binder, Component};
    use std::sync::Arc;

    #[derive(Default)]
    struct NeedsData {
        data: Option<Arc<i32>>,
    }

    impl Injectable for NeedsData {
        fn bindings(binder: &mut Binder<Self>) {
            binder.bind("data", |p: &mut Self, data: Arc<i32>| p.data = Some(data));
        }
    }

    impl Plugin for NeedsData {
        fn initialize(&mut self) -> Result<()> {
            assert!(self.data.is_some());
            Ok(())
        }
    }

    #[test]
    fn test_apply_requires_dependencies() {
        let hub = Hub::new();
        let err = apply(&hub, plugins![NeedsData::default()]).unwrap_err();
        assert_eq!(err.to_string(), "hub: data is not registered");
        assert_eq!(err.kind(), ErrorKind::NotRegistered);
    }

    #[test]
    fn test_apply_in_order() {
        let hub = Hub::new();
        apply(
            &hub,
            plugins![
                component("data", Component::new(10)),
                NeedsData::default(),
            ],
        )
        .unwrap();
    }

    #[test]
    fn test_apply_stops_at_first_failure() {
        let hub = Hub::new();
        let err = apply(
            &hub,
            plugins![
                NeedsData::default(),
                component("data", Component::new(10)),
            ],
        )
        .unwrap_err();
        assert!(err.is_not_registered());
        assert!(!hub.contains("data"));
    }
}
