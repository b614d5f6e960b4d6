use super::hook::{Hook, Phase};
use crate::error::{Result, SenError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Run `hooks` concurrently and wait for all of them.
///
/// Every hook gets a child of `parent`. The first error observed is kept, cancels
/// the shared token and fires `on_first_error`. The token is cancelled once every
/// hook has returned.
pub(crate) async fn execute_hooks<F>(
    phase: Phase,
    hooks: Vec<Hook>,
    parent: &CancellationToken,
    on_first_error: F,
) -> Result<()>
where
    F: FnOnce(),
{
    let token = parent.child_token();
    let count = hooks.len();
    let mut tasks = JoinSet::new();
    for hook in hooks {
        tasks.spawn(hook.call(token.clone()));
    }

    let mut first_error = None;
    let mut on_first_error = Some(on_first_error);
    while let Some(joined) = tasks.join_next().await {
        let outcome = match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(SenError::HookPanicked {
                phase: phase.as_str(),
            }),
            Err(_) => Err(SenError::Cancelled),
        };

        let Err(err) = outcome else { continue };
        if first_error.is_some() {
            tracing::debug!(%phase, error = %err, "Additional hook failure ignored");
            continue;
        }

        tracing::error!(%phase, error = %err, "Hook failed");
        token.cancel();
        if let Some(callback) = on_first_error.take() {
            callback();
        }
        first_error = Some(err);
    }

    token.cancel();
    tracing::debug!(%phase, hooks = count, "Hooks completed");
    first_error.map_or(Ok(()), Err)
}
