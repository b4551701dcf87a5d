//! Result codes returned at the SVC boundary.
//!
//! The kernel arbiter SVCs return a raw 32-bit `Result` code: `0` on
//! success, a nonzero module/description-encoded value otherwise. This
//! wraps that code the way `psp::sync::SyncError` wraps the PSP's raw SCE
//! error codes.

/// Raw result code returned by a kernel arbiter SVC.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SvcResult(pub u32);

impl SvcResult {
    /// The success code (`0`).
    pub const SUCCESS: SvcResult = SvcResult(0);

    /// Condvar wait timeout, libnx-style module/description encoding.
    ///
    /// Exposed as a concrete value so callers and tests can distinguish
    /// a timeout from a spurious wake; not guaranteed stable across
    /// kernel revisions.
    pub const TIMEOUT: SvcResult = SvcResult(0xEA01);

    pub fn code(self) -> u32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    pub fn is_timeout(self) -> bool {
        self == Self::TIMEOUT
    }
}

impl core::fmt::Debug for SvcResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SvcResult({:#010x})", self.0)
    }
}

impl core::fmt::Display for SvcResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "svc result {:#010x}", self.0)
    }
}
