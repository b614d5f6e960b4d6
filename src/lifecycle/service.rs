use crate::error::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A long-running component with a paired stop operation.
///
/// Attached to a [`Lifecycle`](super::Lifecycle), `run` becomes a run hook and
/// `shutdown` a shutdown hook.
#[async_trait]
pub trait Service: Send + Sync {
    async fn run(&self, token: CancellationToken) -> Result<()>;

    async fn shutdown(&self, token: CancellationToken) -> Result<()>;
}
