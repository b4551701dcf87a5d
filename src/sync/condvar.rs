//! A 32-bit key attached to a mutex, implementing wait / wake-one /
//! wake-all via the process-wide-key SVCs.
//!
//! The key word is best modeled as kernel-owned storage: userspace only
//! initializes it to `0` and passes its address. It is incremented by the
//! kernel as part of the wait/wake protocol and must not be read as a
//! logical counter by callers (beyond "zero means no parked waiters").

use super::mutex::Mutex;
use super::mutex::MutexGuard;
use crate::result::SvcResult;
use crate::svc;
use crate::thread_local::self_tag;
use core::sync::atomic::AtomicU32;

/// A condition variable, to be used together with a [`Mutex`].
pub struct CondVar {
    key: AtomicU32,
}

impl Default for CondVar {
    fn default() -> Self {
        Self::new()
    }
}

impl CondVar {
    pub const fn new() -> Self {
        Self {
            key: AtomicU32::new(0),
        }
    }

    fn key_ptr(&self) -> *mut u32 {
        self.key.as_ptr()
    }

    /// Blocks until woken. The caller must hold `guard`'s mutex; it is
    /// atomically released for the duration of the wait and re-acquired
    /// before this returns.
    ///
    /// Spurious wakeups are possible: callers must re-test their
    /// predicate in a loop.
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        let (res, mutex) = self.wait_raw(guard, u64::MAX);
        debug_assert!(res.is_success());
        mutex
    }

    /// Like [`wait`](Self::wait), but returns once `timeout_ns` elapses
    /// even without a wake. Returns `true` if the wait ended due to
    /// timeout rather than a signaled wake.
    pub fn wait_timeout<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout_ns: u64,
    ) -> (MutexGuard<'a, T>, bool) {
        let (res, guard) = self.wait_raw(guard, timeout_ns);
        (guard, res.is_timeout())
    }

    fn wait_raw<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout_ns: u64,
    ) -> (SvcResult, MutexGuard<'a, T>) {
        let mutex: &'a Mutex<T> = guard.mutex;
        // The wait SVC takes ownership of the "unlock, park, relock"
        // sequence; forgetting the guard avoids a double-unlock on drop.
        core::mem::forget(guard);
        log::trace!("condvar {:p}: parking", self);
        // SAFETY: `key` is a live condvar word; `mutex.raw`'s word is a
        // live mutex word currently held by this thread (guard proves it).
        let res = unsafe {
            svc::wait_key(self.key_ptr(), mutex.raw.word_ptr(), self_tag(), timeout_ns)
        };
        (res, MutexGuard { mutex })
    }

    /// Wakes up to `n` waiters (`n = -1` wakes all).
    pub fn wake(&self, n: i32) {
        log::trace!("condvar {:p}: waking {}", self, n);
        // SAFETY: `key` is a live condvar word.
        unsafe {
            svc::signal_key(self.key_ptr(), n);
        }
    }

    pub fn wake_one(&self) {
        self.wake(1);
    }

    pub fn wake_all(&self) {
        self.wake(-1);
    }

    /// Raw key word value, for tests that assert on the waiter count.
    #[cfg(test)]
    pub(crate) fn raw_key(&self) -> u32 {
        self.key.load(core::sync::atomic::Ordering::Acquire)
    }
}
