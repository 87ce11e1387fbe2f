//! Flush-to-zero control for the floating-point unit.
//!
//! Recursive filters decay toward zero through subnormal values, which are
//! very slow on most FPUs. With flush-to-zero enabled those values read as
//! zero instead. The setting lives in a per-thread control register, so it
//! must be enabled on every thread that runs DSP code, before processing.

/// FTZ bit in the x86 MXCSR register.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const MXCSR_FTZ: u32 = 0x8000;

/// DAZ bit in the x86 MXCSR register.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const MXCSR_DAZ: u32 = 0x0040;

/// FZ bit in the aarch64 FPCR register.
#[cfg(target_arch = "aarch64")]
const FPCR_FZ: u64 = 1 << 24;

/// Enables flush-to-zero on the calling thread.
///
/// Idempotent. Returns `false` on targets without a supported control
/// register, where this is a no-op.
pub fn enable_flush_to_zero() -> bool {
    if flush_to_zero_enabled() {
        return true;
    }

    let supported = set_flush_to_zero();
    if supported {
        log::debug!("flush-to-zero enabled on {:?}", std::thread::current().id());
    }
    supported
}

/// Whether flush-to-zero is active on the calling thread.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[allow(deprecated)]
pub fn flush_to_zero_enabled() -> bool {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::_mm_getcsr;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::_mm_getcsr;

    // SAFETY: reading MXCSR has no side effects; SSE is baseline here.
    let csr = unsafe { _mm_getcsr() };
    csr & (MXCSR_FTZ | MXCSR_DAZ) == (MXCSR_FTZ | MXCSR_DAZ)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[allow(deprecated)]
fn set_flush_to_zero() -> bool {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::{_mm_getcsr, _mm_setcsr};
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::{_mm_getcsr, _mm_setcsr};

    // SAFETY: only the FTZ and DAZ bits change; rounding and exception
    // masks are preserved.
    unsafe {
        let csr = _mm_getcsr();
        _mm_setcsr(csr | MXCSR_FTZ | MXCSR_DAZ);
    }
    true
}

/// Whether flush-to-zero is active on the calling thread.
#[cfg(target_arch = "aarch64")]
pub fn flush_to_zero_enabled() -> bool {
    let fpcr: u64;
    // SAFETY: reading FPCR has no side effects.
    unsafe {
        std::arch::asm!("mrs {}, fpcr", out(reg) fpcr);
    }
    fpcr & FPCR_FZ != 0
}

#[cfg(target_arch = "aarch64")]
fn set_flush_to_zero() -> bool {
    // SAFETY: only the FZ bit changes.
    unsafe {
        let fpcr: u64;
        std::arch::asm!("mrs {}, fpcr", out(reg) fpcr);
        std::arch::asm!("msr fpcr, {}", in(reg) fpcr | FPCR_FZ);
    }
    true
}

/// Whether flush-to-zero is active on the calling thread.
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
pub fn flush_to_zero_enabled() -> bool {
    false
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn set_flush_to_zero() -> bool {
    false
}
