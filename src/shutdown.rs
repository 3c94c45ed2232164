use std::future::Future;
use tracing::warn;

/// Result of racing a workflow against Ctrl-C.
#[derive(Debug, PartialEq, Eq)]
pub enum Interruptible<T> {
    Completed(T),
    Interrupted,
}

/// Run `work` until it finishes or the operator presses Ctrl-C.
///
/// Dropping the future abandons any in-flight poll. Remote jobs already
/// submitted keep running on the AWS side.
pub async fn run_until_interrupted<F, T>(work: F) -> Interruptible<T>
where
    F: Future<Output = T>,
{
    run_until(work, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}

async fn run_until<F, S, T>(work: F, signal: S) -> Interruptible<T>
where
    F: Future<Output = T>,
    S: Future<Output = ()>,
{
    tokio::select! {
        output = work => Interruptible::Completed(output),
        _ = signal => {
            warn!("Interrupted by operator");
            Interruptible::Interrupted
        }
    }
}

/// Printed after an interrupt; a created account may not have been moved yet.
pub fn interrupted_notice() -> &'static str {
    "⚠️  Interrupted. An account created during this run may still be at the organization root; move it manually if needed."
}
