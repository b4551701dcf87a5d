//! Yield-type enum and sleep wrapper.
//!
//! Thread creation, stack allocation, TLS setup and the scheduler are out
//! of scope for this crate (see the crate docs); only the *yield*
//! primitive is consumed here, and even then none of the synchronization
//! primitives in [`crate::sync`] call it. It is exposed because users of
//! this crate building spin-then-park style code need it, the same way
//! `psp::thread` exposes `sleep_ms` / `sleep_thread` alongside its kernel
//! wait primitives even though the PSP's own sync objects don't use them.

/// How `sleep_thread` should treat the calling thread when `ns <= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldType {
    /// Do not migrate to another core; yield only if another thread of
    /// equal or higher priority is runnable on this core.
    WithoutCoreMigration,
    /// Allow migrating to another core.
    WithCoreMigration,
    /// Yield unconditionally to any other runnable thread.
    ToAnyThread,
}

impl YieldType {
    pub(crate) fn as_raw(self) -> i64 {
        match self {
            YieldType::WithoutCoreMigration => 0,
            YieldType::WithCoreMigration => -1,
            YieldType::ToAnyThread => -2,
        }
    }
}

/// Sleep the current thread for `ns` nanoseconds.
pub fn sleep_ns(ns: u64) {
    crate::svc::sleep_ns(ns);
}

/// Yield the current thread without sleeping, per `kind`.
pub fn yield_now(kind: YieldType) {
    crate::svc::yield_now(kind);
}

/// The current thread's kernel handle.
pub fn current_thread_handle() -> u32 {
    crate::thread_local::self_tag()
}
