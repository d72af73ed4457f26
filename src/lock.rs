//! Mutual exclusion with a bounded acquisition wait
//!
//! Shared throttle state is only ever touched through a [`GuardedLock`]. A
//! caller that can't get the mutex within the configured bound walks away with
//! [`AcquireTimeout`] instead of blocking indefinitely, so a slow holder can
//! degrade a single operation but never stall the whole controller.

use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

const ACQUIRE_POLL_MILLIS: u64 = 1;

/// The mutex was still held when the acquisition bound expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireTimeout;

pub struct GuardedLock<T> {
    inner: Mutex<T>,
    timeout: Duration,
}

impl<T> GuardedLock<T> {
    pub fn new(value: T, timeout: Duration) -> Self {
        GuardedLock {
            inner: Mutex::new(value),
            timeout,
        }
    }

    /// Blocks up to the configured bound waiting for the mutex.
    ///
    /// The returned guard releases the mutex on every exit path once it goes
    /// out of scope.
    pub fn acquire(&self) -> Result<MutexGuard<'_, T>, AcquireTimeout> {
        let deadline = Instant::now() + self.timeout;

        loop {
            match self.inner.try_lock() {
                Ok(guard) => return Ok(guard),
                // a poisoned mutex means a holder panicked mid-section; the
                // protected record is always written whole, so keep using it
                Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) if Instant::now() >= deadline => {
                    return Err(AcquireTimeout);
                }
                Err(TryLockError::WouldBlock) => {
                    thread::sleep(Duration::from_millis(ACQUIRE_POLL_MILLIS));
                }
            }
        }
    }
}
