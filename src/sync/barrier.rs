//! Cyclic rendezvous barrier built from a [`Mutex`] and a [`CondVar`].

use super::condvar::CondVar;
use super::mutex::Mutex;

struct BarrierState {
    /// Threads still to arrive in the current generation.
    remaining: u64,
    /// Bumped each time the barrier releases, so a thread that wraps
    /// around into the next generation's wait doesn't race a straggler
    /// from the previous one.
    generation: u64,
}

/// A barrier that releases all waiters once `total` threads have called
/// [`wait`](Barrier::wait), then resets for reuse.
pub struct Barrier {
    state: Mutex<BarrierState>,
    cv: CondVar,
    total: u64,
}

impl Barrier {
    pub const fn new(total: u64) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                remaining: total,
                generation: 0,
            }),
            cv: CondVar::new(),
            total,
        }
    }

    /// Blocks until `total` threads (across all generations) have called
    /// `wait`. Returns `true` to exactly one caller per generation — the
    /// thread that observed the last arrival and performed the release.
    pub fn wait(&self) -> bool {
        let mut g = self.state.lock();
        let my_generation = g.generation;
        g.remaining -= 1;
        if g.remaining == 0 {
            g.remaining = self.total;
            g.generation += 1;
            drop(g);
            self.cv.wake_all();
            return true;
        }
        while g.generation == my_generation {
            g = self.cv.wait(g);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn releases_only_after_all_threads_arrive() {
        const N: usize = 8;
        let barrier = Arc::new(Barrier::new(N as u64));
        let arrived = Arc::new(AtomicUsize::new(0));
        let past = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..N {
            let barrier = Arc::clone(&barrier);
            let arrived = Arc::clone(&arrived);
            let past = Arc::clone(&past);
            handles.push(thread::spawn(move || {
                arrived.fetch_add(1, Ordering::SeqCst);
                barrier.wait();
                // Every thread observes that all N had arrived by the
                // time any thread resumes past the barrier.
                assert_eq!(arrived.load(Ordering::SeqCst), N);
                past.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(past.load(Ordering::SeqCst), N);
    }

    #[test]
    fn exactly_one_leader_per_generation() {
        const N: usize = 4;
        let barrier = Arc::new(Barrier::new(N as u64));
        let leaders = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..N {
            let barrier = Arc::clone(&barrier);
            let leaders = Arc::clone(&leaders);
            handles.push(thread::spawn(move || {
                if barrier.wait() {
                    leaders.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(leaders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reusable_across_generations() {
        let barrier = Arc::new(Barrier::new(2));
        for _ in 0..3 {
            let barrier = Arc::clone(&barrier);
            let t = thread::spawn(move || barrier.wait());
            barrier.wait();
            t.join().unwrap();
        }
    }
}
