use super::{BoxedPlugin, Plugin, apply};
use crate::error::{Result, SenError};
use crate::hub::{Binder, HUB, Hub, Injectable};
use std::mem;
use std::sync::Arc;

/// A group of plugins applied as one.
///
/// ```rust,ignore
/// let storage = module(plugins![
///     component("pool", Component::new(pool)),
///     provider("users", UserRepositoryFactory::default()),
/// ]);
/// app.with(storage)?;
/// ```
pub struct Module {
    plugins: Vec<BoxedPlugin>,
    hub: Option<Arc<Hub>>,
}

pub fn module(plugins: Vec<BoxedPlugin>) -> Module {
    Module { plugins, hub: None }
}

/// Alias of [`module`].
pub fn bundle(plugins: Vec<BoxedPlugin>) -> Module {
    module(plugins)
}

impl Module {
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Injectable for Module {
    fn bindings(binder: &mut Binder<Self>) {
        binder.bind(HUB, |m: &mut Self, hub: Arc<Hub>| m.hub = Some(hub));
    }
}

impl Plugin for Module {
    fn initialize(&mut self) -> Result<()> {
        let hub = self.hub.as_ref().ok_or_else(|| SenError::not_registered(HUB))?;
        apply(hub, mem::take(&mut self.plugins))
    }
}
