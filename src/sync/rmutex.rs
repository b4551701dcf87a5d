//! Reentrant mutex: a [`Mutex`] plus owner-handle comparison and a
//! recursion counter.

use super::mutex::Mutex;
use crate::thread_local::self_tag;
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// A mutex that the owning thread may lock more than once.
///
/// `counter > 0 <=> inner mutex locked <=> owner_tag == holder's handle`.
pub struct RMutex<T> {
    mutex: Mutex<()>,
    owner_tag: AtomicU32,
    counter: UnsafeCell<u32>,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for RMutex<T> {}
unsafe impl<T: Send> Sync for RMutex<T> {}

impl<T> RMutex<T> {
    pub const fn new(val: T) -> Self {
        Self {
            mutex: Mutex::new(()),
            owner_tag: AtomicU32::new(0),
            counter: UnsafeCell::new(0),
            data: UnsafeCell::new(val),
        }
    }

    /// Locks the mutex, blocking if another thread holds it. The owning
    /// thread may call this again without deadlocking; each call must be
    /// matched by an `unlock` (dropping the guard).
    pub fn lock(&self) -> RMutexGuard<'_, T> {
        let tag = self_tag();
        // Reading owner_tag without the inner lock is safe: it is only
        // ever meaningful when compared against self_tag, and no other
        // thread can write our own tag into the field.
        if self.owner_tag.load(Ordering::Acquire) == tag {
            self.bump_counter();
            return RMutexGuard { lock: self };
        }
        let guard = self.mutex.lock();
        core::mem::forget(guard);
        self.owner_tag.store(tag, Ordering::Release);
        // SAFETY: we just took the inner lock, counter was 0.
        unsafe {
            *self.counter.get() = 1;
        }
        RMutexGuard { lock: self }
    }

    /// Attempts to lock without blocking. Returns `false` on contention
    /// by another thread.
    pub fn try_lock(&self) -> bool {
        let tag = self_tag();
        if self.owner_tag.load(Ordering::Acquire) == tag {
            self.bump_counter();
            return true;
        }
        if let Some(guard) = self.mutex.try_lock() {
            core::mem::forget(guard);
            self.owner_tag.store(tag, Ordering::Release);
            unsafe {
                *self.counter.get() = 1;
            }
            true
        } else {
            false
        }
    }

    fn bump_counter(&self) {
        // SAFETY: only the owning thread reaches here (tag matched), and
        // only the owning thread ever writes `counter`.
        unsafe {
            *self.counter.get() += 1;
        }
    }

    /// Current recursion depth; `0` means unlocked.
    pub fn recursion_count(&self) -> u32 {
        if self.owner_tag.load(Ordering::Acquire) == self_tag() {
            unsafe { *self.counter.get() }
        } else {
            0
        }
    }

    fn unlock(&self) {
        // SAFETY: only called from `RMutexGuard::drop`, which only exists
        // while the current thread owns the lock.
        let remaining = unsafe {
            let c = &mut *self.counter.get();
            *c -= 1;
            *c
        };
        if remaining > 0 {
            return;
        }
        self.owner_tag.store(0, Ordering::Release);
        // SAFETY: counter reached zero, so we are releasing the inner
        // mutex for the first time since it was last acquired.
        unsafe {
            self.mutex.raw.unlock();
        }
    }
}

pub struct RMutexGuard<'a, T> {
    lock: &'a RMutex<T>,
}

impl<T> core::ops::Deref for RMutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> core::ops::DerefMut for RMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for RMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn single_thread_recursion() {
        let r = RMutex::new(0u32);
        let g1 = r.lock();
        assert_eq!(r.recursion_count(), 1);
        let g2 = r.lock();
        assert_eq!(r.recursion_count(), 2);
        let g3 = r.lock();
        assert_eq!(r.recursion_count(), 3);
        drop(g3);
        assert_eq!(r.recursion_count(), 2);
        drop(g2);
        assert_eq!(r.recursion_count(), 1);
        drop(g1);
        assert_eq!(r.recursion_count(), 0);
    }

    #[test]
    fn other_thread_blocked_until_final_unlock() {
        let r = Arc::new(RMutex::new(0u32));
        let g1 = r.lock();
        let g2 = r.lock();
        assert_eq!(r.recursion_count(), 2);

        let r2 = Arc::clone(&r);
        let acquired = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let acquired2 = Arc::clone(&acquired);
        let t = thread::spawn(move || {
            let _g = r2.lock();
            acquired2.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(20));
        assert!(!acquired.load(std::sync::atomic::Ordering::SeqCst));

        drop(g2);
        thread::sleep(Duration::from_millis(20));
        assert!(
            !acquired.load(std::sync::atomic::Ordering::SeqCst),
            "still held once after releasing one of two recursive locks"
        );

        drop(g1);
        t.join().unwrap();
        assert!(acquired.load(std::sync::atomic::Ordering::SeqCst));
    }
}
