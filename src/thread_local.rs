//! The thread-local record every primitive's owner-tag protocol reads
//! from.
//!
//! On the real target this is the Horizon `ThreadVars` structure: a
//! fixed 0x20-byte record reachable from `tpidrro_el0`, holding (at
//! minimum) a magic value, the kernel thread handle, and pointers
//! consumed by surrounding modules (thread spawn, newlib reentrancy) that
//! are out of scope here. Only the handle read is in scope: every
//! primitive in [`crate::sync`] needs `self_tag()` as its owner tag.

use static_assertions::const_assert_eq;

/// Magic value marking an initialized thread-local record (`"!TV$"`).
pub const MAGIC: u32 = 0x2154_5624;

/// The thread-local record. Exactly 0x20 bytes on the real target: magic,
/// handle, and three reserved pointers used by surrounding modules (the
/// current `Thread` object, the newlib reentrancy struct, and the TLS
/// segment pointer) that this crate does not interpret.
#[repr(C)]
pub struct ThreadVars {
    pub magic: u32,
    pub handle: u32,
    pub thread_ptr: *mut core::ffi::c_void,
    pub reent: *mut core::ffi::c_void,
    pub tls_tp: *mut core::ffi::c_void,
}

const_assert_eq!(core::mem::size_of::<ThreadVars>(), 0x20);

impl ThreadVars {
    pub fn is_initialized(&self) -> bool {
        self.magic == MAGIC
    }
}

#[cfg(not(test))]
mod platform {
    use super::ThreadVars;

    /// Reads the Horizon TLS pointer and returns the thread-local record.
    ///
    /// # Safety
    /// Must only be called on a thread whose TLS region has already been
    /// set up (out of scope here — see `crate` docs).
    unsafe fn thread_vars() -> *mut ThreadVars {
        let tls: *mut u8;
        unsafe {
            core::arch::asm!("mrs {0}, tpidrro_el0", out(reg) tls);
        }
        // ThreadVars lives at a fixed negative offset from the user TLS
        // pointer on the real target; the exact offset is part of the
        // linked runtime's layout and is out of scope to re-derive here.
        tls.cast::<ThreadVars>()
    }

    /// The current thread's kernel handle, used as the owner tag in every
    /// primitive's protocol.
    pub fn self_tag() -> u32 {
        unsafe { (*thread_vars()).handle }
    }
}

#[cfg(test)]
mod platform {
    use core::sync::atomic::{AtomicU32, Ordering};

    // Host builds have no Horizon TLS region. Hand out a stable,
    // unique, non-zero tag per OS thread instead, satisfying the same
    // invariant (`thread_handle` non-zero and unique per live thread)
    // the real target gives us for free.
    static NEXT_TAG: AtomicU32 = AtomicU32::new(1);

    std::thread_local! {
        static SELF_TAG: u32 = NEXT_TAG.fetch_add(1, Ordering::Relaxed);
    }

    pub fn self_tag() -> u32 {
        SELF_TAG.with(|tag| *tag)
    }
}

/// The current thread's kernel handle.
///
/// Non-zero and unique among live threads; used as the owner tag in every
/// primitive's protocol.
pub fn self_tag() -> u32 {
    platform::self_tag()
}
