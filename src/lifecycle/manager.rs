//! Lifecycle Manager
//!
//! Owns the ordered hook lists and drives the run, shutdown and post-run phases.
//!
//! Run hooks execute concurrently. Once they all return, or as soon as one fails,
//! the shutdown sequence starts. That sequence runs exactly once no matter how
//! many callers ask for it: shutdown hooks first, then (if the run phase was in
//! flight) a wait for the run phase to drain, then post-run hooks. Every caller
//! observes the same result.

use super::executor::execute_hooks;
use super::hook::{Hook, Phase};
use super::service::Service;
use crate::error::{Result, SenError};
use std::future::Future;
use std::mem;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const SHUTTING_DOWN: u8 = 2;
const STOPPED: u8 = 3;

/// Observable state of a [`Lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
}

impl State {
    fn from_u8(raw: u8) -> Self {
        match raw {
            IDLE => State::Idle,
            RUNNING => State::Running,
            SHUTTING_DOWN => State::ShuttingDown,
            _ => State::Stopped,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Running => "running",
            State::ShuttingDown => "shutting down",
            State::Stopped => "stopped",
        }
    }
}

#[derive(Default)]
struct PhaseHooks {
    hooks: Vec<Hook>,
    started: bool,
}

#[derive(Default)]
struct HookTable {
    run: PhaseHooks,
    shutdown: PhaseHooks,
    post_run: PhaseHooks,
}

impl HookTable {
    fn phase_mut(&mut self, phase: Phase) -> &mut PhaseHooks {
        match phase {
            Phase::Run => &mut self.run,
            Phase::Shutdown => &mut self.shutdown,
            Phase::PostRun => &mut self.post_run,
        }
    }
}

struct Inner {
    state: AtomicU8,
    hooks: Mutex<HookTable>,
    /// Parent of the tokens handed to shutdown and post-run hooks.
    root: CancellationToken,
    run_finished: watch::Sender<bool>,
    stopped: watch::Sender<Option<Result<()>>>,
}

/// Handle to the hook lists and phase state machine. Clones share state.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AtomicU8::new(IDLE),
                hooks: Mutex::new(HookTable::default()),
                root: CancellationToken::new(),
                run_finished: watch::Sender::new(false),
                stopped: watch::Sender::new(None),
            }),
        }
    }

    pub fn state(&self) -> State {
        State::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// Register a hook executed concurrently with the other run hooks.
    pub fn on_run<F, Fut>(&self, func: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.add_hook(Phase::Run, Hook::new(func));
    }

    /// Register a hook executed when the shutdown sequence starts.
    pub fn on_shutdown<F, Fut>(&self, func: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.add_hook(Phase::Shutdown, Hook::new(func));
    }

    /// Register a hook executed after shutdown hooks and the run phase completed.
    pub fn post_run<F, Fut>(&self, func: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.add_hook(Phase::PostRun, Hook::new(func));
    }

    /// Append `hook` to the list of `phase`. Hooks added once the phase started are dropped.
    pub fn add_hook(&self, phase: Phase, hook: Hook) {
        let mut table = self.table();
        let list = table.phase_mut(phase);
        if list.started {
            tracing::warn!(%phase, "Hook registered after its phase started, it will not run");
            return;
        }
        list.hooks.push(hook);
    }

    /// Wire a [`Service`] into the run and shutdown phases.
    pub fn service<S>(&self, service: Arc<S>)
    where
        S: Service + ?Sized + 'static,
    {
        let runner = Arc::clone(&service);
        self.on_run(move |token| async move { runner.run(token).await });
        self.on_shutdown(move |token| async move { service.shutdown(token).await });
    }

    /// Execute the run hooks, then the shutdown sequence.
    ///
    /// Returns the first error by phase priority: run, shutdown, post-run. When a
    /// shutdown was requested before `run` got here, the run hooks still execute but
    /// receive an already-cancelled token.
    ///
    /// # Errors
    /// Returns [`SenError::InvalidState`] if `run` was already called.
    pub async fn run(&self, token: &CancellationToken) -> Result<()> {
        let hooks = self.begin_run()?;
        let _ = self.inner.state.compare_exchange(
            IDLE,
            RUNNING,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );

        let phase_token = token.child_token();
        if matches!(self.state(), State::ShuttingDown | State::Stopped) {
            tracing::debug!("Shutdown already requested, run hooks start cancelled");
            phase_token.cancel();
        }
        tracing::info!(hooks = hooks.len(), "Starting run phase");

        let lifecycle = self.clone();
        let run_result = execute_hooks(Phase::Run, hooks, &phase_token, move || {
            lifecycle.trigger_stop();
        })
        .await;

        self.inner.run_finished.send_replace(true);
        tracing::info!(ok = run_result.is_ok(), "Run phase complete");

        self.trigger_stop();
        let stop_result = self.wait_stopped(&CancellationToken::new()).await;
        run_result.and(stop_result)
    }

    /// Trigger the shutdown sequence and wait for its outcome.
    ///
    /// Concurrent callers share a single execution. A caller whose `token` fires
    /// first stops waiting with [`SenError::Cancelled`]; the sequence keeps going.
    pub async fn shutdown(&self, token: &CancellationToken) -> Result<()> {
        self.trigger_stop();
        self.wait_stopped(token).await
    }

    /// Drop every hook that has not been executed yet.
    pub fn discard_pending_hooks(&self) {
        let mut table = self.table();
        table.run.hooks.clear();
        table.shutdown.hooks.clear();
        table.post_run.hooks.clear();
    }

    fn table(&self) -> MutexGuard<'_, HookTable> {
        self.inner
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the run phase as started and take its hooks. Only the first call succeeds.
    fn begin_run(&self) -> Result<Vec<Hook>> {
        let mut table = self.table();
        if table.run.started {
            return Err(SenError::InvalidState {
                operation: "run",
                state: self.state().as_str(),
            });
        }
        table.run.started = true;
        Ok(mem::take(&mut table.run.hooks))
    }

    fn run_started(&self) -> bool {
        self.table().run.started
    }

    fn take_hooks(&self, phase: Phase) -> Vec<Hook> {
        let mut table = self.table();
        let list = table.phase_mut(phase);
        list.started = true;
        mem::take(&mut list.hooks)
    }

    /// Move to `ShuttingDown` and spawn the stop sequence, once.
    fn trigger_stop(&self) {
        let state = &self.inner.state;
        let mut current = state.load(Ordering::SeqCst);
        loop {
            if current != IDLE && current != RUNNING {
                return;
            }
            match state.compare_exchange(current, SHUTTING_DOWN, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let lifecycle = self.clone();
        tokio::spawn(async move { lifecycle.stop_sequence().await });
    }

    async fn stop_sequence(self) {
        let hooks = self.take_hooks(Phase::Shutdown);
        tracing::info!(hooks = hooks.len(), "Starting shutdown phase");
        let shutdown_result = execute_hooks(Phase::Shutdown, hooks, &self.inner.root, || {}).await;

        if self.run_started() {
            let mut finished = self.inner.run_finished.subscribe();
            let drained = finished.wait_for(|done| *done).await.is_ok();
            tracing::debug!(drained, "Run phase drained");
        }

        let hooks = self.take_hooks(Phase::PostRun);
        tracing::info!(hooks = hooks.len(), "Starting post-run phase");
        let post_run_result = execute_hooks(Phase::PostRun, hooks, &self.inner.root, || {}).await;

        self.inner.state.store(STOPPED, Ordering::SeqCst);
        let result = shutdown_result.and(post_run_result);
        tracing::info!(ok = result.is_ok(), "Lifecycle stopped");
        self.inner.stopped.send_replace(Some(result));
    }

    async fn wait_stopped(&self, token: &CancellationToken) -> Result<()> {
        let mut stopped = self.inner.stopped.subscribe();
        tokio::select! {
            biased;
            outcome = stopped.wait_for(Option::is_some) => {
                outcome.ok().and_then(|result| (*result).clone()).unwrap_or(Ok(()))
            }
            _ = token.cancelled() => {
                tracing::warn!("Stopped waiting for shutdown, caller cancelled");
                Err(SenError::Cancelled)
            }
        }
    }
}
