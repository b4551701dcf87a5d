//! Counting semaphore built from a [`Mutex`] and a [`CondVar`].

use super::condvar::CondVar;
use super::mutex::Mutex;

/// A counting semaphore.
///
/// `signal` increments the count and wakes a waiter; `wait` blocks while
/// the count is zero, then decrements it.
pub struct Semaphore {
    count: Mutex<u64>,
    cv: CondVar,
}

impl Semaphore {
    /// Creates a semaphore with `initial` available permits.
    pub const fn new(initial: u64) -> Self {
        Self {
            count: Mutex::new(initial),
            cv: CondVar::new(),
        }
    }

    /// Releases `n` permits, waking waiters as needed.
    pub fn signal(&self, n: u64) {
        if n == 0 {
            return;
        }
        let mut g = self.count.lock();
        *g += n;
        drop(g);
        if n == 1 {
            self.cv.wake_one();
        } else {
            self.cv.wake_all();
        }
    }

    /// Blocks until a permit is available, then takes it.
    pub fn wait(&self) {
        let mut g = self.count.lock();
        while *g == 0 {
            g = self.cv.wait(g);
        }
        *g -= 1;
    }

    /// Takes a permit if one is immediately available, without blocking.
    pub fn try_wait(&self) -> bool {
        let mut g = self.count.lock();
        if *g == 0 {
            return false;
        }
        *g -= 1;
        true
    }

    /// Current number of available permits.
    pub fn count(&self) -> u64 {
        *self.count.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_consumes_a_permit_signal_adds_one_back() {
        let sem = Semaphore::new(1);
        sem.wait();
        assert_eq!(sem.count(), 0);
        assert!(!sem.try_wait());
        sem.signal(1);
        assert_eq!(sem.count(), 1);
        assert!(sem.try_wait());
    }

    #[test]
    fn blocked_waiter_is_released_by_signal() {
        let sem = Arc::new(Semaphore::new(0));
        let sem2 = Arc::clone(&sem);
        let t = thread::spawn(move || {
            sem2.wait();
        });
        thread::sleep(std::time::Duration::from_millis(20));
        sem.signal(1);
        t.join().unwrap();
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn producers_and_consumers_balance_out() {
        const PERMITS: u64 = 100;
        let sem = Arc::new(Semaphore::new(0));
        let mut handles = Vec::new();
        for _ in 0..PERMITS {
            let sem = Arc::clone(&sem);
            handles.push(thread::spawn(move || sem.signal(1)));
        }
        for _ in 0..PERMITS {
            let sem = Arc::clone(&sem);
            handles.push(thread::spawn(move || sem.wait()));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sem.count(), 0);
    }
}
