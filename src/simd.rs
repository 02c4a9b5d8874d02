//! Shared AVX-512 arithmetic helpers for the NTT and element-wise kernels.
//!
//! Each helper operates on 8 independent 64-bit lanes. All functions are
//! `#[inline(always)] unsafe fn`: the caller is a `#[target_feature]`
//! kernel whose backend was selected only after runtime capability
//! detection, so the required instruction sets are known to be present.

use crate::modulus::ReduceOnce;
use core::arch::x86_64::{
    __m512i, _mm512_add_epi64, _mm512_and_si512, _mm512_loadu_epi64, _mm512_madd52hi_epu64,
    _mm512_madd52lo_epu64, _mm512_min_epu64, _mm512_mul_epu32, _mm512_mullo_epi64,
    _mm512_set1_epi64, _mm512_setzero_si512, _mm512_srli_epi64, _mm512_storeu_epi64,
    _mm512_sub_epi64,
};

/// Single conditional subtract: per lane, `x - q` if `x >= q` else `x`.
/// Valid whenever 2q fits in 64 bits.
#[inline(always)]
pub(crate) unsafe fn reduce_once_epu64(x: __m512i, q: __m512i) -> __m512i {
    unsafe { _mm512_min_epu64(x, _mm512_sub_epi64(x, q)) }
}

/// High 64 bits of the unsigned 64x64 product, per lane, built from four
/// 32x32 partial products (AVX-512 has no 64-bit high multiply).
#[inline(always)]
pub(crate) unsafe fn mul_hi_epu64(a: __m512i, b: __m512i) -> __m512i {
    unsafe {
        let lo_mask: __m512i = _mm512_set1_epi64(0xffffffff);
        let a_hi: __m512i = _mm512_srli_epi64(a, 32);
        let b_hi: __m512i = _mm512_srli_epi64(b, 32);
        let ll: __m512i = _mm512_mul_epu32(a, b);
        let lh: __m512i = _mm512_mul_epu32(a, b_hi);
        let hl: __m512i = _mm512_mul_epu32(a_hi, b);
        let hh: __m512i = _mm512_mul_epu32(a_hi, b_hi);
        let cross: __m512i = _mm512_add_epi64(
            _mm512_add_epi64(_mm512_srli_epi64(ll, 32), _mm512_and_si512(lh, lo_mask)),
            _mm512_and_si512(hl, lo_mask),
        );
        _mm512_add_epi64(
            _mm512_add_epi64(hh, _mm512_srli_epi64(lh, 32)),
            _mm512_add_epi64(_mm512_srli_epi64(hl, 32), _mm512_srli_epi64(cross, 32)),
        )
    }
}

/// Shoup lazy product at shift 64: `x*w - hi64(x*w_quo)*q`, per lane, in
/// `[0, 2q)`. Requires `w < q` and the DQ 64-bit low multiply.
#[inline(always)]
pub(crate) unsafe fn mul_lazy_epu64(x: __m512i, w: __m512i, w_quo: __m512i, q: __m512i) -> __m512i {
    unsafe {
        let t: __m512i = mul_hi_epu64(x, w_quo);
        _mm512_sub_epi64(_mm512_mullo_epi64(x, w), _mm512_mullo_epi64(t, q))
    }
}

/// Reduces every element from the lazy [0, 4q) range to [0, q); the tail
/// below 8 lanes runs scalar.
#[inline(always)]
pub(crate) unsafe fn normalize_epu64(a: &mut [u64], q: u64, two_q: u64) {
    unsafe {
        let vq: __m512i = _mm512_set1_epi64(q as i64);
        let v2q: __m512i = _mm512_set1_epi64(two_q as i64);
        let mut chunks = a.chunks_exact_mut(8);
        for x in &mut chunks {
            let mut v: __m512i = _mm512_loadu_epi64(x.as_ptr() as *const i64);
            v = reduce_once_epu64(v, v2q);
            v = reduce_once_epu64(v, vq);
            _mm512_storeu_epi64(x.as_mut_ptr() as *mut i64, v);
        }
        chunks.into_remainder().iter_mut().for_each(|x| {
            x.reduce_once_assign(two_q);
            x.reduce_once_assign(q);
        });
    }
}

/// Shoup lazy product at shift 52 via IFMA: `(x*w - hi52(x*w_quo)*q) mod
/// 2^52`, per lane, in `[0, 2q)`. Requires `w < q`, `x < 2^52` and
/// `2q < 2^52` so the 52-bit extraction of the difference is exact.
#[inline(always)]
pub(crate) unsafe fn mul_lazy_epu52(
    x: __m512i,
    w: __m512i,
    w_quo: __m512i,
    q: __m512i,
    mask52: __m512i,
) -> __m512i {
    unsafe {
        let zero: __m512i = _mm512_setzero_si512();
        let q_hat: __m512i = _mm512_madd52hi_epu64(zero, x, w_quo);
        _mm512_and_si512(
            _mm512_sub_epi64(
                _mm512_madd52lo_epu64(zero, x, w),
                _mm512_madd52lo_epu64(zero, q_hat, q),
            ),
            mask52,
        )
    }
}
