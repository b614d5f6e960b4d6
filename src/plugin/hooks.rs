use super::Plugin;
use crate::error::{Result, SenError};
use crate::hub::{Binder, Injectable, LIFECYCLE};
use crate::lifecycle::{Hook, Lifecycle, Phase};
use std::future::Future;
use std::mem;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Attaches hooks of one phase to the application lifecycle.
pub struct HookPlugin {
    phase: Phase,
    hooks: Vec<Hook>,
    lifecycle: Option<Arc<Lifecycle>>,
}

impl HookPlugin {
    fn new(phase: Phase, hook: Hook) -> Self {
        Self {
            phase,
            hooks: vec![hook],
            lifecycle: None,
        }
    }

    /// Attach another hook of the same phase.
    pub fn and<F, Fut>(mut self, func: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.hooks.push(Hook::new(func));
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

pub fn on_run<F, Fut>(func: F) -> HookPlugin
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    HookPlugin::new(Phase::Run, Hook::new(func))
}

pub fn on_shutdown<F, Fut>(func: F) -> HookPlugin
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    HookPlugin::new(Phase::Shutdown, Hook::new(func))
}

pub fn post_run<F, Fut>(func: F) -> HookPlugin
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    HookPlugin::new(Phase::PostRun, Hook::new(func))
}

impl Injectable for HookPlugin {
    fn bindings(binder: &mut Binder<Self>) {
        binder.bind(LIFECYCLE, |p: &mut Self, lifecycle: Arc<Lifecycle>| {
            p.lifecycle = Some(lifecycle)
        });
    }
}

impl Plugin for HookPlugin {
    fn initialize(&mut self) -> Result<()> {
        let lifecycle = self
            .lifecycle
            .as_ref()
            .ok_or_else(|| SenError::not_registered(LIFECYCLE))?;
        for hook in mem::take(&mut self.hooks) {
            lifecycle.add_hook(self.phase, hook);
        }
        Ok(())
    }
}
