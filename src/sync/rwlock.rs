//! Multi-reader, single-writer lock with nested-on-write reentrancy and
//! writer preference.
//!
//! All scalar bookkeeping lives behind an inner [`Mutex`]; two
//! [`CondVar`]s split waiting readers from waiting writers so a
//! `write_unlock` wakes exactly the right class instead of causing a
//! thundering herd.

use super::condvar::CondVar;
use super::mutex::Mutex;
use crate::thread_local::self_tag;
use core::cell::UnsafeCell;

struct RwLockState {
    read_lock_count: u32,
    read_waiter_count: u32,
    write_lock_count: u32,
    write_waiter_count: u32,
    /// Handle of the write-lock holder, `0` when not write-locked.
    write_owner_tag: u32,
}

impl RwLockState {
    const fn new() -> Self {
        Self {
            read_lock_count: 0,
            read_waiter_count: 0,
            write_lock_count: 0,
            write_waiter_count: 0,
            write_owner_tag: 0,
        }
    }
}

/// A reader/writer lock guarding a `T`.
///
/// Readers and a writer cannot coexist, except that the thread currently
/// holding the write lock may recursively take read locks (reentrant
/// read-on-write), which simply bumps `read_lock_count` without blocking.
pub struct RwLock<T> {
    state: Mutex<RwLockState>,
    cv_reader_wait: CondVar,
    cv_writer_wait: CondVar,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for RwLock<T> {}
unsafe impl<T: Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    pub const fn new(val: T) -> Self {
        Self {
            state: Mutex::new(RwLockState::new()),
            cv_reader_wait: CondVar::new(),
            cv_writer_wait: CondVar::new(),
            data: UnsafeCell::new(val),
        }
    }

    /// Acquires a read lock, blocking while a writer holds or is waiting
    /// for the lock (writer preference: a reader cannot pass a writer
    /// that is already waiting).
    pub fn read(&self) -> ReadGuard<'_, T> {
        let tag = self_tag();
        let mut g = self.state.lock();
        if g.write_owner_tag == tag {
            // Reentrant read on a held write lock.
            g.read_lock_count += 1;
            return ReadGuard { lock: self };
        }
        while g.write_lock_count > 0 || g.write_waiter_count > 0 {
            g.read_waiter_count += 1;
            g = self.cv_reader_wait.wait(g);
            g.read_waiter_count -= 1;
        }
        g.read_lock_count += 1;
        ReadGuard { lock: self }
    }

    /// Attempts to acquire a read lock without blocking.
    pub fn try_read(&self) -> Option<ReadGuard<'_, T>> {
        let tag = self_tag();
        let mut g = self.state.lock();
        if g.write_owner_tag == tag {
            g.read_lock_count += 1;
            return Some(ReadGuard { lock: self });
        }
        if g.write_lock_count > 0 || g.write_waiter_count > 0 {
            return None;
        }
        g.read_lock_count += 1;
        Some(ReadGuard { lock: self })
    }

    /// Acquires the write lock, blocking while any reader or writer holds
    /// it. Reentrant: the current write-lock holder may call this again.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let tag = self_tag();
        let mut g = self.state.lock();
        if g.write_owner_tag == tag {
            g.write_lock_count += 1;
            return WriteGuard { lock: self };
        }
        while g.read_lock_count > 0 || g.write_lock_count > 0 {
            g.write_waiter_count += 1;
            g = self.cv_writer_wait.wait(g);
            g.write_waiter_count -= 1;
        }
        g.write_owner_tag = tag;
        g.write_lock_count = 1;
        WriteGuard { lock: self }
    }

    /// Attempts to acquire the write lock without blocking.
    pub fn try_write(&self) -> Option<WriteGuard<'_, T>> {
        let tag = self_tag();
        let mut g = self.state.lock();
        if g.write_owner_tag == tag {
            g.write_lock_count += 1;
            return Some(WriteGuard { lock: self });
        }
        if g.read_lock_count > 0 || g.write_lock_count > 0 {
            return None;
        }
        g.write_owner_tag = tag;
        g.write_lock_count = 1;
        Some(WriteGuard { lock: self })
    }

    /// True iff the current thread holds the write lock.
    ///
    /// Because non-owning read locks are anonymous (the source cannot
    /// distinguish owner-held reads from other threads' reads), this is
    /// also what `is_owned_by_current_thread` reduces to: true only when
    /// the current thread currently holds the write lock.
    pub fn is_write_locked_by_current_thread(&self) -> bool {
        let g = self.state.lock();
        g.write_owner_tag == self_tag() && g.write_lock_count > 0
    }

    /// Alias of [`is_write_locked_by_current_thread`](Self::is_write_locked_by_current_thread).
    pub fn is_owned_by_current_thread(&self) -> bool {
        self.is_write_locked_by_current_thread()
    }

    fn read_unlock(&self) {
        let mut g = self.state.lock();
        g.read_lock_count -= 1;
        // A read_lock_count drop to zero while write_owner_tag is set can
        // only be the write owner's own reentrant read unwinding (plain
        // readers never coexist with a writer); the write lock itself
        // still guards exclusion, so no wake is needed in that case.
        if g.read_lock_count == 0 && g.write_waiter_count > 0 && g.write_owner_tag == 0 {
            self.cv_writer_wait.wake_one();
        }
    }

    fn write_unlock(&self) {
        let mut g = self.state.lock();
        g.write_lock_count -= 1;
        if g.write_lock_count > 0 {
            return;
        }
        g.write_owner_tag = 0;
        if g.write_waiter_count > 0 {
            self.cv_writer_wait.wake_one();
        } else if g.read_waiter_count > 0 {
            self.cv_reader_wait.wake_all();
        }
    }
}

/// RAII read guard for [`RwLock`].
pub struct ReadGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> core::ops::Deref for ReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.read_unlock();
    }
}

/// RAII write guard for [`RwLock`].
pub struct WriteGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> core::ops::Deref for WriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> core::ops::DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.write_unlock();
    }
}
