//! Runtime selection of the scalar or SIMD kernel tier.
//!
//! Capability probing runs once per process; the tier decision also folds in
//! the modulus bit-width, since the 52-bit IFMA kernels only admit small
//! enough moduli.

use std::sync::OnceLock;

/// Largest modulus (exclusive) admitted by the 52-bit IFMA NTT kernels.
pub(crate) const MAX_IFMA_NTT_MODULUS: u64 = 1 << 50;

/// Largest modulus (exclusive) admitted by the 52-bit IFMA element-wise
/// kernels: 2q must stay below 2^52 for the 52-bit lazy product extraction.
pub(crate) const MAX_IFMA_ELTWISE_MODULUS: u64 = 1 << 51;

/// SIMD instruction tiers available on the executing CPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub avx512dq: bool,
    pub avx512ifma: bool,
}

static CAPABILITIES: OnceLock<Capabilities> = OnceLock::new();

/// Returns the detected SIMD tiers, probing the CPU on first call.
pub fn capabilities() -> Capabilities {
    *CAPABILITIES.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        {
            Capabilities {
                avx512dq: std::arch::is_x86_feature_detected!("avx512f")
                    && std::arch::is_x86_feature_detected!("avx512dq"),
                avx512ifma: std::arch::is_x86_feature_detected!("avx512f")
                    && std::arch::is_x86_feature_detected!("avx512ifma"),
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            Capabilities::default()
        }
    })
}

/// The kernel implementation an operation dispatches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// 52-bit AVX-512 IFMA lanes; requires a small enough modulus.
    Ifma52,
    /// 64-bit AVX-512 (F + DQ) lanes.
    Avx512,
    /// Scalar 64-bit reference path.
    Scalar64,
}

impl Backend {
    /// Selects the forward-NTT backend for modulus q.
    pub fn for_ntt_forward(q: u64) -> Backend {
        let caps: Capabilities = capabilities();
        if caps.avx512ifma && q < MAX_IFMA_NTT_MODULUS {
            Backend::Ifma52
        } else if caps.avx512dq {
            Backend::Avx512
        } else {
            Backend::Scalar64
        }
    }

    /// Selects the inverse-NTT backend for modulus q. The IFMA tier stays
    /// disabled until the scaled-inverse twiddles are range-verified
    /// against 2^52.
    pub fn for_ntt_backward(_q: u64) -> Backend {
        if capabilities().avx512dq {
            Backend::Avx512
        } else {
            Backend::Scalar64
        }
    }

    /// Selects the element-wise kernel backend for modulus q.
    pub fn for_eltwise(q: u64) -> Backend {
        let caps: Capabilities = capabilities();
        if caps.avx512ifma && q < MAX_IFMA_ELTWISE_MODULUS {
            Backend::Ifma52
        } else if caps.avx512dq {
            Backend::Avx512
        } else {
            Backend::Scalar64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_consistency() {
        let caps: Capabilities = capabilities();
        // A large modulus must never land on the 52-bit tier.
        let backend: Backend = Backend::for_ntt_forward(1u64 << 61);
        assert_ne!(backend, Backend::Ifma52);
        if !caps.avx512dq {
            assert_eq!(backend, Backend::Scalar64);
            assert_eq!(Backend::for_ntt_backward(17), Backend::Scalar64);
            assert_eq!(Backend::for_eltwise(17), Backend::Scalar64);
        }
        // The inverse path never selects IFMA.
        assert_ne!(Backend::for_ntt_backward(17), Backend::Ifma52);
    }
}
