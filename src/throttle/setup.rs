use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use super::{Core, State, Throttle, DEFAULT_LOCK_TIMEOUT_MILLIS};
use crate::dispatch::Dispatch;
use crate::errors::Error;
use crate::lock::GuardedLock;

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;

    Ok(Duration::from_millis(millis))
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Quiescence window in milliseconds. A burst fires once no submission
    /// has arrived for this long.
    #[serde(deserialize_with = "deserialize_duration")]
    pub window: Duration,

    /// Set to `false` to bypass throttling entirely; submissions then run
    /// synchronously inside `handle`. Intended for deterministic testing or
    /// explicit opt-out. Defaults to `true`.
    pub enabled: Option<bool>,

    /// Administrative bound on internal lock waits, in milliseconds.
    pub lock_timeout_millis: Option<u64>,
}

impl Config {
    pub fn new(window: Duration) -> Self {
        Config {
            window,
            enabled: None,
            lock_timeout_millis: None,
        }
    }

    pub fn build(self, dispatcher: Option<Box<dyn Dispatch>>) -> Result<Throttle, Error> {
        if self.window.is_zero() {
            return Err(Error::config("throttle window must be greater than zero"));
        }

        let lock_timeout = Duration::from_millis(
            self.lock_timeout_millis
                .unwrap_or(DEFAULT_LOCK_TIMEOUT_MILLIS),
        );

        let core = Core {
            state: GuardedLock::new(State { pending: None }, lock_timeout),
            window: self.window,
            dispatcher,
        };

        Ok(Throttle {
            core: Arc::new(core),
            enabled: self.enabled.unwrap_or(true),
        })
    }
}
