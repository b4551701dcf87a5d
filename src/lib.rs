//! Userspace synchronization primitives for the Horizon kernel (AArch64).
//!
//! The target environment exposes a small set of address-arbitration SVCs
//! (an owner-tagged futex-style mutex, a process-wide condition-variable
//! key) on top of which this crate builds a standard library of
//! higher-level synchronization objects: [`sync::Mutex`],
//! [`sync::RMutex`], [`sync::CondVar`], [`sync::RwLock`],
//! [`sync::Semaphore`], [`sync::Barrier`] and [`sync::oneshot`].
//!
//! # Layout
//!
//! - [`svc`]: raw bindings to the kernel arbiter SVCs.
//! - [`thread_local`]: the per-thread handle (`self_tag`) used as the
//!   owner tag in every primitive below.
//! - [`thread`]: yield-type enum and sleep wrapper, exposed but unused by
//!   the primitives themselves.
//! - [`sync`]: the primitives proper.
//!
//! Every operation here is synchronous: it either returns immediately or
//! parks the calling thread inside a kernel arbiter call. There is no
//! internal scheduler and no background thread.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod result;
pub mod svc;
pub mod sync;
pub mod thread;
pub mod thread_local;

pub use result::SvcResult;
