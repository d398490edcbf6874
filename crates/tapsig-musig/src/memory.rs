//! Process-level protection for resident secret material.
//!
//! Zeroization erases a [`crate::SecNonce`] or [`crate::Keypair`] when it
//! dies; these helpers keep secrets from leaking while alive. A core dump
//! writes a live secret nonce to disk, and a swapped-out page can persist
//! one long after the process exits. Both protections are best-effort:
//! containers and unprivileged users are routinely denied them, and a
//! refusal is not a reason to abort signing.

use std::sync::atomic::{AtomicBool, Ordering};

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process.
///
/// Call once at startup, before any keypair or secret nonce exists.
/// Returns `true` if dumps are known to be disabled.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.swap(true, Ordering::SeqCst) {
        return true;
    }

    #[cfg(unix)]
    {
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit with a stack-local rlimit struct is plain POSIX.
        unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Lock `len` bytes at `ptr` into RAM so they cannot be swapped out.
///
/// # Safety
///
/// `ptr` must point to a live allocation of at least `len` bytes, and the
/// region must stay allocated until [`munlock`] or process exit.
pub unsafe fn mlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        libc::mlock(ptr as *const libc::c_void, len) == 0
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        false
    }
}

/// Unlock a region previously locked with [`mlock`].
///
/// # Safety
///
/// `ptr` and `len` must match a prior [`mlock`] call.
pub unsafe fn munlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        libc::munlock(ptr as *const libc::c_void, len) == 0
    }

    #[cfg(not(unix))]
    {
        let _ = (ptr, len);
        true
    }
}
