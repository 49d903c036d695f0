// SPDX-License-Identifier: MIT
//
// RDRAND Writer: Hardware Random Number Dump Tool
//
// https://github.com/rdrand-writer/rdrand-writer

//! CPU feature detection for the RDRAND instruction
//!
//! Support is read from the processor feature flags (CPUID leaf 1, ECX bit 30)
//! through the standard library's runtime detection. The instruction is never
//! executed to find out: on hardware without it the result is an invalid-opcode
//! fault, not an error value.

use tracing::debug;

/// Report whether the RDRAND instruction is available on this processor
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn rdrand_supported() -> bool {
    let supported = std::arch::is_x86_feature_detected!("rdrand");
    debug!(supported, "Checked CPUID for RDRAND");
    supported
}

/// Report whether the RDRAND instruction is available on this processor
///
/// Always `false` outside x86.
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub fn rdrand_supported() -> bool {
    debug!("RDRAND unavailable on non-x86 target");
    false
}
