use crate::error::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

type HookFn = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<()>> + Send>;

/// Phase a [`Hook`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Run,
    Shutdown,
    PostRun,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Run => "run",
            Phase::Shutdown => "shutdown",
            Phase::PostRun => "post-run",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work executed once when its phase starts.
///
/// The hook receives a token that is cancelled when a sibling hook of the same
/// phase fails or the phase completes.
pub struct Hook {
    func: HookFn,
}

impl Hook {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            func: Box::new(move |token| func(token).boxed()),
        }
    }

    pub(crate) fn call(self, token: CancellationToken) -> BoxFuture<'static, Result<()>> {
        (self.func)(token)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").finish_non_exhaustive()
    }
}
