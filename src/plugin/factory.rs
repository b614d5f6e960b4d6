use super::Plugin;
use crate::error::{Result, SenError};
use crate::hub::{Binder, Component, HUB, Hub, Injectable, LIFECYCLE};
use crate::lifecycle::{Lifecycle, Service};
use std::sync::Arc;

/// Builds a component from dependencies held by the hub.
///
/// The factory itself is injected before [`Factory::create`] runs, so its bindings
/// describe what the product needs.
pub trait Factory: Injectable + Send {
    type Output: Send + Sync + 'static;

    /// Build the component to register. Called once, after the factory was injected.
    fn create(&mut self) -> Result<Component<Self::Output>>;
}

/// Registers the product of a [`Factory`] under a name.
pub struct Provider<F> {
    name: String,
    factory: F,
    hub: Option<Arc<Hub>>,
}

pub fn provider<F: Factory>(name: impl Into<String>, factory: F) -> Provider<F> {
    Provider {
        name: name.into(),
        factory,
        hub: None,
    }
}

impl<F: Factory> Provider<F> {
    fn produce(&mut self) -> Result<Arc<Hub>> {
        let hub = self
            .hub
            .clone()
            .ok_or_else(|| SenError::not_registered(HUB))?;
        hub.inject(&mut self.factory)?;
        let component = self.factory.create()?;
        hub.register(&self.name, component)?;
        Ok(hub)
    }
}

impl<F: Factory> Injectable for Provider<F> {
    fn bindings(binder: &mut Binder<Self>) {
        binder.bind(HUB, |p: &mut Self, hub: Arc<Hub>| p.hub = Some(hub));
    }
}

impl<F: Factory> Plugin for Provider<F> {
    fn initialize(&mut self) -> Result<()> {
        self.produce().map(|_| ())
    }
}

/// Like [`Provider`], and the product is wired into the run and shutdown phases.
pub struct ServiceProvider<F> {
    provider: Provider<F>,
    lifecycle: Option<Arc<Lifecycle>>,
}

pub fn service<F>(name: impl Into<String>, factory: F) -> ServiceProvider<F>
where
    F: Factory,
    F::Output: Service,
{
    ServiceProvider {
        provider: provider(name, factory),
        lifecycle: None,
    }
}

impl<F> Injectable for ServiceProvider<F>
where
    F: Factory,
    F::Output: Service,
{
    fn bindings(binder: &mut Binder<Self>) {
        binder
            .bind(HUB, |p: &mut Self, hub: Arc<Hub>| p.provider.hub = Some(hub))
            .bind(LIFECYCLE, |p: &mut Self, lifecycle: Arc<Lifecycle>| {
                p.lifecycle = Some(lifecycle)
            });
    }
}

impl<F> Plugin for ServiceProvider<F>
where
    F: Factory,
    F::Output: Service,
{
    fn initialize(&mut self) -> Result<()> {
        let lifecycle = self
            .lifecycle
            .clone()
            .ok_or_else(|| SenError::not_registered(LIFECYCLE))?;
        let hub = self.provider.produce()?;
        let service = hub.retrieve::<F::Output>(&self.provider.name)?;
        lifecycle.service(service);
        Ok(())
    }
}
