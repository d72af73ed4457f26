use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{Action, Core, RETRY_INTERVAL_MILLIS};
use crate::dispatch::WorkItem;

pub(super) fn spawn_settle_worker(core: Arc<Core>) {
    thread::spawn(move || settle_loop(core));
}

/// One run of this loop covers one burst: it polls the shared record until
/// the newest timestamp has stayed put for a full window, dispatches that
/// submission's action exactly once, and exits. A stream of submissions that
/// never settles keeps the loop alive indefinitely; that is the point.
fn settle_loop(core: Arc<Core>) {
    let retry_interval = Duration::from_millis(RETRY_INTERVAL_MILLIS);

    loop {
        let observed = match core.state.acquire() {
            Ok(state) => match &state.pending {
                Some(request) => request.since,
                None => return,
            },
            Err(_) => {
                // contention backoff, not a window wait
                thread::sleep(retry_interval);
                continue;
            }
        };

        let remaining = (observed + core.window).saturating_duration_since(Instant::now());

        if !remaining.is_zero() {
            thread::sleep(remaining);
        }

        let settled = match core.state.acquire() {
            Ok(state) => match &state.pending {
                // nothing newer arrived while we slept: the burst settled
                Some(request) if request.since == observed => Some(request.action.clone()),
                // the timestamp advanced; the window restarts from the newest
                // submission
                Some(_) => None,
                None => return,
            },
            Err(_) => {
                thread::sleep(retry_interval);
                continue;
            }
        };

        if let Some(action) = settled {
            dispatch(core, observed, action);
            return;
        }
    }
}

/// Hands the settled action to the delivery context, or to a fresh thread
/// when none was configured. Delivery is asynchronous on purpose: the action
/// may re-enter `handle` on the same controller, and running it from a path
/// that still takes the state lock invites deadlock.
fn dispatch(core: Arc<Core>, fired: Instant, action: Action) {
    debug!("burst settled, dispatching trailing action");

    let episode = core.clone();

    let work: WorkItem = Box::new(move || {
        let result = action();

        finish_episode(&episode, fired);

        result
    });

    match &core.dispatcher {
        Some(context) => context.post(work),
        None => {
            thread::spawn(move || {
                if let Err(err) = work() {
                    warn!("throttled action failed: {}", err);
                }
            });
        }
    }
}

/// Resolves the shared record once the dispatched action has finished,
/// whatever its outcome. Runs on the delivery context, not on the worker.
fn finish_episode(core: &Arc<Core>, fired: Instant) {
    let retry_interval = Duration::from_millis(RETRY_INTERVAL_MILLIS);

    let superseded = loop {
        match core.state.acquire() {
            Ok(mut state) => match &state.pending {
                Some(request) if request.since == fired => {
                    state.pending = None;
                    break false;
                }
                Some(_) => break true,
                None => break false,
            },
            // the record must be resolved exactly once per episode, so keep
            // trying instead of walking away
            Err(_) => thread::sleep(retry_interval),
        }
    };

    // a submission that arrived while the action ran found the episode still
    // marked pending, so no worker was spawned for it; start its worker now
    if superseded {
        debug!("fresh submission arrived during execution, starting next burst");
        spawn_settle_worker(core.clone());
    }
}
