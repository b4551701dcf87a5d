//! Owner-tagged exclusive lock with a contention bit.
//!
//! The 32-bit word encodes: bit 30 (`HAS_LISTENERS`) is the
//! contention bit, bits 29..0 hold the owner tag (`0` = unlocked).
//! Userspace never clears `HAS_LISTENERS` itself — only the kernel
//! arbiter does, when its wait queue for this word transitions between
//! empty and non-empty.

use crate::svc;
use crate::thread_local::self_tag;
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Bit 30: set by the kernel arbiter while one or more threads are
/// parked on this word.
pub const HAS_LISTENERS: u32 = 1 << 30;

/// Bits 29..0: the owner tag.
pub const OWNER_MASK: u32 = !HAS_LISTENERS;

/// The bare 32-bit mutex word, with no payload.
///
/// Tied 1:1 to a [`CondVar`](super::condvar::CondVar) via
/// [`CondVar::wait`](super::condvar::CondVar::wait), which needs access to
/// this word's address to hand it to `wait_process_wide_key_atomic`.
pub(crate) struct RawMutex {
    word: AtomicU32,
}

impl RawMutex {
    pub const fn new() -> Self {
        Self {
            word: AtomicU32::new(0),
        }
    }

    pub(crate) fn word_ptr(&self) -> *mut u32 {
        self.word.as_ptr()
    }

    /// Attempts a CAS `0 -> self_tag`. Never blocks, never enters the
    /// kernel.
    pub fn try_lock(&self) -> bool {
        self.word
            .compare_exchange(0, self_tag(), Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Acquires the lock, blocking via the kernel arbiter if contended.
    pub fn lock(&self) {
        let tag = self_tag();
        if self
            .word
            .compare_exchange(0, tag, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            return;
        }
        log::trace!("mutex {:p}: contended, entering arbiter", self);
        // SAFETY: `word` is a live mutex word for the lifetime of `self`.
        unsafe {
            svc::arbitrate_lock_word(self.word_ptr(), tag);
        }
    }

    /// Releases the lock.
    ///
    /// # Safety
    /// The caller must currently hold the lock (own the word). Unlocking
    /// by a non-owner, or double-unlocking, is undefined behavior,
    /// matching the platform primitive's contract.
    pub unsafe fn unlock(&self) {
        let tag = self_tag();
        let cur = self.word.load(Ordering::Acquire);
        debug_assert_eq!(
            cur & OWNER_MASK,
            tag,
            "unlock called by thread that does not own the mutex"
        );
        if cur & HAS_LISTENERS == 0
            && self
                .word
                .compare_exchange(tag, 0, Ordering::Release, Ordering::Relaxed)
                .is_ok()
        {
            return;
        }
        log::trace!("mutex {:p}: waking a waiter", self);
        // SAFETY: `word` is a live mutex word for the lifetime of `self`.
        unsafe {
            svc::arbitrate_unlock_word(self.word_ptr());
        }
    }

    pub fn is_locked_by_current_thread(&self) -> bool {
        self.word.load(Ordering::Acquire) & OWNER_MASK == self_tag()
    }

    /// Raw word value, for tests that assert on the exact bit pattern.
    #[cfg(test)]
    pub(crate) fn raw_word(&self) -> u32 {
        self.word.load(Ordering::Acquire)
    }
}

// SAFETY: the arbiter protocol is the synchronization; the word itself is
// safe to share and mutate from any thread through atomics.
unsafe impl Send for RawMutex {}
unsafe impl Sync for RawMutex {}

/// An owner-tagged exclusive lock guarding a `T`.
pub struct Mutex<T> {
    pub(crate) raw: RawMutex,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for Mutex<T> {}
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    pub const fn new(val: T) -> Self {
        Self {
            raw: RawMutex::new(),
            data: UnsafeCell::new(val),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.raw.lock();
        MutexGuard { mutex: self }
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        if self.raw.try_lock() {
            Some(MutexGuard { mutex: self })
        } else {
            None
        }
    }

    pub fn is_locked_by_current_thread(&self) -> bool {
        self.raw.is_locked_by_current_thread()
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// RAII guard for [`Mutex`]. Releases the lock when dropped.
pub struct MutexGuard<'a, T> {
    pub(crate) mutex: &'a Mutex<T>,
}

impl<T> core::ops::Deref for MutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> core::ops::DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: holding a `MutexGuard` is proof the current thread owns
        // the lock.
        unsafe {
            self.mutex.raw.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn init_lock_unlock_returns_word_to_zero() {
        let m = Mutex::new(0u32);
        {
            let _g = m.lock();
            assert_ne!(m.raw.raw_word(), 0);
        }
        assert_eq!(m.raw.raw_word(), 0);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let m = Mutex::new(());
        let g = m.lock();
        assert!(m.try_lock().is_none());
        drop(g);
        assert!(m.try_lock().is_some());
    }

    #[test]
    fn mutual_exclusion_under_contention() {
        let m = Arc::new(Mutex::new(0i64));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let m = Arc::clone(&m);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    let mut g = m.lock();
                    *g += 1;
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*m.lock(), 8000);
    }

    #[test]
    fn randomized_hold_durations_preserve_mutual_exclusion() {
        use rand::Rng;

        struct Counter {
            value: u64,
            in_section: bool,
        }
        let m = Arc::new(Mutex::new(Counter {
            value: 0,
            in_section: false,
        }));
        let mut handles = Vec::new();
        for _ in 0..6 {
            let m = Arc::clone(&m);
            handles.push(thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..200 {
                    let mut g = m.lock();
                    assert!(!g.in_section, "overlapping critical sections");
                    g.in_section = true;
                    g.value += 1;
                    let spin = rng.gen_range(0..50);
                    for _ in 0..spin {
                        core::hint::spin_loop();
                    }
                    g.in_section = false;
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(m.lock().value, 1200);
    }

    #[test]
    fn contention_bit_set_while_a_waiter_is_parked() {
        let m = Arc::new(Mutex::new(()));
        let g = m.lock();
        let m2 = Arc::clone(&m);
        let t = thread::spawn(move || {
            let _g = m2.lock();
        });
        // Give the second thread time to park and set HAS_LISTENERS.
        while m.raw.raw_word() & HAS_LISTENERS == 0 {
            thread::yield_now();
        }
        assert_ne!(m.raw.raw_word() & OWNER_MASK, 0);
        drop(g);
        t.join().unwrap();
        assert_eq!(m.raw.raw_word(), 0);
    }
}
