//! Delivery of a settled action to its execution context

use std::sync::mpsc::Sender;

use tracing::warn;

use crate::errors::Error;

/// A settled action wrapped with its completion bookkeeping.
///
/// Executing the item runs the action and resolves the throttle episode that
/// produced it, then yields the action's own result. The context that receives
/// an item is expected to execute it eventually; an item that is dropped
/// unexecuted leaves its episode unresolved.
pub type WorkItem = Box<dyn FnOnce() -> Result<(), Error> + Send + 'static>;

/// Capability to hand work over to an owning execution context.
///
/// `post` must return promptly; the context executes the item at its own
/// discretion (its next scheduling turn, the next drain of its mailbox).
/// A UI-loop post is as valid an implementation as a channel send.
pub trait Dispatch: Send + Sync {
    fn post(&self, work: WorkItem);
}

/// Channel delivery for hosts that drain their own event loop.
impl Dispatch for Sender<WorkItem> {
    fn post(&self, work: WorkItem) {
        if let Err(returned) = self.send(work) {
            // the receiving loop is gone; running the item here is the only
            // way left to resolve the episode it carries
            warn!("delivery context disconnected, running work on the posting thread");

            let work = returned.0;

            if let Err(err) = work() {
                warn!("throttled action failed: {}", err);
            }
        }
    }
}
