//! Modular arithmetic and negacyclic NTT kernels over prime fields `Z/qZ`
//! with `2 < q < 2^62`, as used by RLWE-based homomorphic encryption.
//!
//! The crate provides three layers:
//!
//! - [`modulus`]: word-level primitives, Barrett precomputations, lazy
//!   modular multiplication, and prime / root-of-unity utilities.
//! - [`dft`]: the in-place negacyclic NTT ([`dft::ntt::Table`]) with a
//!   scalar reference path and AVX-512 (64-bit DQ and 52-bit IFMA)
//!   accelerated paths selected at table construction.
//! - [`eltwise`]: element-wise vector kernels, notably the fused
//!   multiply-add `out[i] = (arg1[i] * arg2 + arg3[i]) mod q`.
//!
//! All kernels operate on caller-owned `u64` buffers in place or
//! out-of-place; values at API boundaries are canonical representatives in
//! `[0, q)`. Internal lazy ranges (`[0, 2q)`, `[0, 4q)`) are documented per
//! function and checked with debug assertions.
//!
//! Nothing in this crate spawns threads or holds hidden state: an NTT table
//! is immutable after construction and can be shared across threads for
//! concurrent transforms of disjoint buffers.

pub mod dft;
pub mod dispatch;
pub mod eltwise;
pub mod error;
pub mod modulus;

#[cfg(target_arch = "x86_64")]
pub(crate) mod simd;

pub use error::Error;
