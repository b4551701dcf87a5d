//! Raw bindings to the kernel address-arbitration SVCs.
//!
//! These six calls are the entire surface the rest of this crate is built
//! on. The actual `svc` trampolines and the linker-time `__wrap_svc*`
//! shim are out of scope here (assumed provided by the linked runtime);
//! this module only declares the signatures the protocols in [`crate::sync`]
//! rely on.
//!
//! Declared with a small macro (rather than six hand-written `extern`
//! blocks) so the signature and the doc live next to each other once.

use crate::result::SvcResult;

macro_rules! svc_extern {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?;
    )*) => {
        paste::paste! {
            unsafe extern "C" {
                $(
                    $(#[$meta])*
                    #[link_name = concat!("__nx_svc_", stringify!($name))]
                    pub fn [<$name>]($($arg: $ty),*) $(-> $ret)?;
                )*
            }
        }
    };
}

#[cfg(not(test))]
svc_extern! {
    /// Syscall 0x1A. If `*tag_location == 0`, atomically stores `self_tag`
    /// and returns success; otherwise sets the contention bit on the word
    /// and parks the caller until woken as owner.
    fn arbitrate_lock(wait_tag: u32, tag_location: *mut u32, self_tag: u32) -> u32;

    /// Syscall 0x1B. Hands ownership of `*tag_location` to the
    /// highest-priority waiter, or clears it if none.
    fn arbitrate_unlock(tag_location: *mut u32) -> u32;

    /// Syscall 0x1C. Atomically unlocks `*mutex_word`, parks the caller on
    /// `*key`, and re-acquires the mutex on wake or timeout.
    fn wait_process_wide_key_atomic(
        key: *mut u32,
        mutex_word: *mut u32,
        self_tag: u32,
        timeout_ns: u64,
    ) -> u32;

    /// Syscall 0x1D. Wakes up to `count` waiters parked on `*key`;
    /// `count = -1` wakes all.
    fn signal_process_wide_key(key: *mut u32, count: i32);

    /// Yields/sleeps the current thread for `ns` nanoseconds. `ns < 0`
    /// selects one of the `YieldType` variants instead of sleeping.
    fn sleep_thread(ns: i64);

    /// Returns the kernel thread ID associated with a thread handle.
    fn get_thread_id(handle: u32) -> u64;
}

/// Atomically locks `*tag_location` for `self_tag`, blocking if contended.
///
/// # Safety
/// `tag_location` must point to a valid, live `u32` mutex word for the
/// duration of the call.
#[cfg(not(test))]
pub unsafe fn arbitrate_lock_word(tag_location: *mut u32, self_tag: u32) -> SvcResult {
    SvcResult(unsafe { arbitrate_lock(0, tag_location, self_tag) })
}

/// Hands off or clears `*tag_location`.
///
/// # Safety
/// `tag_location` must point to a valid, live `u32` mutex word.
#[cfg(not(test))]
pub unsafe fn arbitrate_unlock_word(tag_location: *mut u32) -> SvcResult {
    SvcResult(unsafe { arbitrate_unlock(tag_location) })
}

/// Atomically releases `*mutex_word`, parks on `*key`, and re-acquires
/// `*mutex_word` before returning.
///
/// `timeout_ns == u64::MAX` waits indefinitely.
///
/// # Safety
/// Both pointers must point to valid, live `u32` words for the duration
/// of the call; the caller must currently hold the mutex at `mutex_word`.
#[cfg(not(test))]
pub unsafe fn wait_key(
    key: *mut u32,
    mutex_word: *mut u32,
    self_tag: u32,
    timeout_ns: u64,
) -> SvcResult {
    SvcResult(unsafe { wait_process_wide_key_atomic(key, mutex_word, self_tag, timeout_ns) })
}

/// Wakes up to `count` waiters parked on `*key` (`count = -1` wakes all).
///
/// # Safety
/// `key` must point to a valid, live `u32` condvar word.
#[cfg(not(test))]
pub unsafe fn signal_key(key: *mut u32, count: i32) {
    unsafe { signal_process_wide_key(key, count) }
}

#[cfg(not(test))]
pub fn yield_now(kind: crate::thread::YieldType) {
    unsafe { sleep_thread(kind.as_raw()) }
}

#[cfg(not(test))]
pub fn sleep_ns(ns: u64) {
    unsafe { sleep_thread(ns as i64) }
}


#[cfg(test)]
pub use sim::{arbitrate_lock_word, arbitrate_unlock_word, sleep_ns, signal_key, wait_key, yield_now};
