use super::Plugin;
use crate::error::{Result, SenError};
use crate::hub::{Binder, Component, HUB, Hub, Injectable};
use std::sync::Arc;

/// Registers a single component under a name.
pub struct ComponentPlugin<T> {
    name: String,
    component: Option<Component<T>>,
    hub: Option<Arc<Hub>>,
}

pub fn component<T>(name: impl Into<String>, component: Component<T>) -> ComponentPlugin<T>
where
    T: Send + Sync + 'static,
{
    ComponentPlugin {
        name: name.into(),
        component: Some(component),
        hub: None,
    }
}

impl<T: Send + Sync + 'static> Injectable for ComponentPlugin<T> {
    fn bindings(binder: &mut Binder<Self>) {
        binder.bind(HUB, |p: &mut Self, hub: Arc<Hub>| p.hub = Some(hub));
    }
}

impl<T: Send + Sync + 'static> Plugin for ComponentPlugin<T> {
    fn initialize(&mut self) -> Result<()> {
        let hub = self.hub.as_ref().ok_or_else(|| SenError::not_registered(HUB))?;
        match self.component.take() {
            Some(component) => hub.register(&self.name, component),
            None => Ok(()),
        }
    }
}
