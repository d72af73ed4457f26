//! Trailing-edge throttle controller
//!
//! A [`Throttle`] collapses a burst of submissions into exactly one execution
//! of the most recent action, once no new submission has arrived for a full
//! window. Intermediate actions are superseded and never run. The final
//! action is handed to a [`Dispatch`] context when one was configured, or to
//! a fresh background thread otherwise.

mod run;
mod setup;

pub use setup::Config;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::dispatch::Dispatch;
use crate::errors::Error;
use crate::lock::GuardedLock;

/// Bound on administrative lock waits, distinct from the throttle window;
/// it only has to outlast a critical section.
const DEFAULT_LOCK_TIMEOUT_MILLIS: u64 = 3_000;

/// Pause before retrying after losing an administrative lock race.
const RETRY_INTERVAL_MILLIS: u64 = 10;

/// The callable a host submits for throttled execution.
pub type Action = Arc<dyn Fn() -> Result<(), Error> + Send + Sync + 'static>;

/// The most recent submission: run `action` no earlier than `since` plus the
/// window, unless a newer submission takes its place first.
struct PendingRequest {
    since: Instant,
    action: Action,
}

/// The only shared mutable record of a controller. Keeping the timestamp and
/// the action in one `Option` means they can never desynchronize.
struct State {
    pending: Option<PendingRequest>,
}

struct Core {
    state: GuardedLock<State>,
    window: Duration,
    dispatcher: Option<Box<dyn Dispatch>>,
}

/// The throttle controller. Cheap to clone; every clone submits into the same
/// request stream.
#[derive(Clone)]
pub struct Throttle {
    core: Arc<Core>,
    enabled: bool,
}

impl Throttle {
    /// A controller whose final actions run on a fresh background thread.
    ///
    /// Fails with [`Error::Config`] when `window` is zero.
    pub fn new(window: Duration) -> Result<Self, Error> {
        Config::new(window).build(None)
    }

    /// A controller whose final actions are posted to `dispatcher`.
    pub fn with_dispatcher(
        window: Duration,
        dispatcher: impl Dispatch + 'static,
    ) -> Result<Self, Error> {
        Config::new(window).build(Some(Box::new(dispatcher)))
    }

    /// Records `action` as the newest submission of the current burst.
    ///
    /// Fire-and-forget: the call returns promptly, bounded only by the
    /// administrative lock timeout, never by the throttle window. Under
    /// pathological lock contention the submission is dropped rather than
    /// blocking the caller; a superseding submission is assumed to follow.
    ///
    /// With throttling disabled the action runs synchronously before the call
    /// returns and its result is the call's result; the caller is the
    /// execution context in that mode. In throttled mode the result is always
    /// `Ok` and action failures surface wherever the delivery context reports
    /// them.
    pub fn handle<F>(&self, action: F) -> Result<(), Error>
    where
        F: Fn() -> Result<(), Error> + Send + Sync + 'static,
    {
        if !self.enabled {
            return action();
        }

        self.submit(Arc::new(action));

        Ok(())
    }

    fn submit(&self, action: Action) {
        let had_pending = {
            let mut state = match self.core.state.acquire() {
                Ok(x) => x,
                Err(_) => {
                    warn!("state lock busy, dropping throttled submission");
                    return;
                }
            };

            let had_pending = state.pending.is_some();

            state.pending = Some(PendingRequest {
                since: Instant::now(),
                action,
            });

            had_pending
        };

        // first submission of a new burst; later ones only move the window
        // that the live worker observes
        if !had_pending {
            run::spawn_settle_worker(self.core.clone());
        }
    }
}
