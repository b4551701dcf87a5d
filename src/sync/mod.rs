//! The synchronization primitives proper.
//!
//! Dependency order (leaves first): [`mutex`] and [`condvar`] are built
//! directly on the kernel arbiter SVCs; [`rmutex`], [`semaphore`] and
//! [`barrier`] are built on a `Mutex` (+ `CondVar`); [`rwlock`] is built
//! on a `Mutex` and two `CondVar`s; [`oneshot`] is built on a `Mutex` +
//! `CondVar` plus a shared heap allocation.

pub mod barrier;
pub mod condvar;
pub mod mutex;
pub mod oneshot;
pub mod rmutex;
pub mod rwlock;
pub mod semaphore;

pub use barrier::Barrier;
pub use condvar::CondVar;
pub use mutex::Mutex;
pub use rmutex::RMutex;
pub use rwlock::RwLock;
pub use semaphore::Semaphore;
