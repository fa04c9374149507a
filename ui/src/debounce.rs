//! A generic delay-and-coalesce helper for bursts of calls.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

/// Which edges of a burst invoke the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Invoke immediately on the first call of a burst.
    pub leading: bool,
    /// Invoke once the burst has been quiet for the full period.
    pub trailing: bool,
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            leading: false,
            trailing: true,
        }
    }
}

/// Delays an async operation until calls have stopped arriving for `quiet_period`,
/// then runs it once with the most recent arguments.
///
/// A worker task owns the timer. Each invocation of the operation is spawned as its
/// own task, so a slow invocation never holds back the next burst. Dropping the
/// `Debouncer` stops the worker and discards any call still waiting for its trailing
/// edge.
pub struct Debouncer<A> {
    calls: mpsc::UnboundedSender<A>,
}

impl<A: Send + 'static> Debouncer<A> {
    /// Creates the debouncer and spawns its worker on the current tokio runtime.
    pub fn new<F, Fut>(quiet_period: Duration, options: DebounceOptions, op: F) -> Self
    where
        F: Fn(A) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (calls, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx, quiet_period, options, op));
        Self { calls }
    }

    /// Registers a call, restarting the quiet period.
    pub fn call(&self, args: A) {
        if self.calls.send(args).is_err() {
            tracing::warn!("debounce worker has stopped, call dropped");
        }
    }
}

async fn run_worker<A, F, Fut>(
    mut rx: mpsc::UnboundedReceiver<A>,
    quiet_period: Duration,
    options: DebounceOptions,
    op: F,
) where
    A: Send + 'static,
    F: Fn(A) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    while let Some(first) = rx.recv().await {
        let mut pending = if options.leading {
            tokio::spawn(op(first));
            None
        } else {
            Some(first)
        };

        loop {
            match tokio::time::timeout(quiet_period, rx.recv()).await {
                Ok(Some(args)) => {
                    tracing::debug!("debounce window restarted");
                    pending = Some(args);
                }
                // All senders are gone.
                Ok(None) => return,
                Err(_elapsed) => break,
            }
        }

        if let Some(args) = pending.filter(|_| options.trailing) {
            tokio::spawn(op(args));
        }
    }
}
