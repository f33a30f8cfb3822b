//! Exactly-once wake lock bookkeeping.
//!
//! Acquiring a wake lock is an expensive call into the power subsystem, so the guard
//! tracks whether it currently holds the lock and turns repeated holds and releases
//! into no-ops. The lock itself may be wired up after the controller was built; until
//! then holds are logged and skipped.

use crate::backend::WakeLock;
use crate::common::constants::WAKE_LOCK_TAG;

pub struct WakeLockGuard {
    lock: Option<Box<dyn WakeLock>>,
    held: bool,
}

impl WakeLockGuard {
    pub fn new(lock: Option<Box<dyn WakeLock>>) -> Self {
        Self { lock, held: false }
    }

    /// Provide the wake lock once it becomes available.
    pub fn set_wake_lock(&mut self, lock: Box<dyn WakeLock>) {
        self.lock = Some(lock);
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Acquire the lock unless it is already held.
    pub fn hold(&mut self) {
        if self.held {
            return;
        }
        match self.lock.as_mut() {
            Some(lock) => {
                self.held = true;
                lock.acquire(WAKE_LOCK_TAG);
                log_debug!("Wake lock acquired");
            }
            None => {
                log_warning!("Cannot hold wake lock, it has not been set yet");
            }
        }
    }

    /// Release the lock if it is held.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        if let Some(lock) = self.lock.as_mut() {
            lock.release(WAKE_LOCK_TAG);
            log_debug!("Wake lock released");
        }
    }
}

impl std::fmt::Debug for WakeLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeLockGuard")
            .field("configured", &self.lock.is_some())
            .field("held", &self.held)
            .finish()
    }
}
