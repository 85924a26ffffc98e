use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{error, info};

use super::retry::sleep_unless;

/// How a supervised worker ended for good.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SupervisorExit {
    /// Incarnations started after the first one.
    pub restarts: u32,
    /// Whether the last incarnation panicked (shutdown raced with a crash).
    pub panicked: bool,
}

/// Run `body` on a named worker thread and replace it if it panics.
///
/// Blocks the calling thread. Each incarnation runs on a fresh thread named
/// `{name}-{incarnation}` and receives its incarnation number (0 for the
/// first). A replacement is started only after the previous thread has been
/// joined, so at most one incarnation is ever alive. Nothing is restarted
/// once `shutdown` is raised or after a normal return.
pub fn supervise<F>(
    name: &str,
    shutdown: &AtomicBool,
    restart_backoff: Duration,
    body: F,
) -> SupervisorExit
where
    F: Fn(u32) + Send + Sync + 'static,
{
    let body = Arc::new(body);
    let mut incarnation: u32 = 0;

    loop {
        let worker = Arc::clone(&body);
        let spawned = thread::Builder::new()
            .name(format!("{name}-{incarnation}"))
            .spawn(move || worker(incarnation));

        let panicked = match spawned {
            Ok(handle) => handle.join().is_err(),
            Err(e) => {
                error!(worker = name, incarnation, error = %e, "failed to spawn worker thread");
                true
            }
        };

        if !panicked {
            info!(worker = name, incarnation, "worker exited");
            return SupervisorExit {
                restarts: incarnation,
                panicked: false,
            };
        }

        if shutdown.load(Ordering::SeqCst) {
            return SupervisorExit {
                restarts: incarnation,
                panicked: true,
            };
        }

        error!(
            worker = name,
            incarnation,
            backoff_ms = restart_backoff.as_millis() as u64,
            "worker crashed; restarting"
        );

        if !sleep_unless(shutdown, restart_backoff) {
            return SupervisorExit {
                restarts: incarnation,
                panicked: true,
            };
        }
        incarnation += 1;
    }
}
