//! 52-bit AVX-512 IFMA butterflies for the forward NTT.
//!
//! Restricted to moduli below 2^50 so every intermediate (inputs in
//! [0, 4q), lazy products in [0, 2q)) stays below 2^52 and the
//! `madd52lo/hi` product halves are exact. The inverse transform has no
//! IFMA path; see the backend selection in [`crate::dispatch`].

use crate::dft::ntt::Table;
use crate::simd::{mul_lazy_epu52, normalize_epu64, reduce_once_epu64};
use core::arch::x86_64::{
    _mm512_add_epi64, _mm512_loadu_epi64, _mm512_set1_epi64, _mm512_storeu_epi64,
    _mm512_sub_epi64,
};
use itertools::izip;

#[target_feature(enable = "avx512f,avx512ifma")]
pub(crate) unsafe fn forward_inplace<const LAZY: bool>(tbl: &Table<u64>, a: &mut [u64]) {
    unsafe {
        debug_assert!(tbl.q < (1u64 << 50), "q = {} too large for IFMA", tbl.q);
        let q = _mm512_set1_epi64(tbl.q as i64);
        let two_q = _mm512_set1_epi64(tbl.two_q as i64);
        let mask52 = _mm512_set1_epi64((1i64 << 52) - 1);
        for layer in 0..tbl.log_n {
            let (m, size) = (1usize << layer, 1usize << (tbl.log_n - layer - 1));
            if size >= 8 {
                izip!(
                    a.chunks_exact_mut(2 * size),
                    &tbl.psi_rev[m..],
                    &tbl.psi_rev_quo52[m..]
                )
                .for_each(|(blk, wb, quo52)| {
                    let (x, y) = blk.split_at_mut(size);
                    let w = _mm512_set1_epi64(wb.0 as i64);
                    let w_quo = _mm512_set1_epi64(*quo52 as i64);
                    izip!(x.chunks_exact_mut(8), y.chunks_exact_mut(8)).for_each(|(x, y)| {
                        let vx = _mm512_loadu_epi64(x.as_ptr() as *const i64);
                        let vy = _mm512_loadu_epi64(y.as_ptr() as *const i64);
                        let tx = reduce_once_epu64(vx, two_q);
                        let t = mul_lazy_epu52(vy, w, w_quo, q, mask52);
                        _mm512_storeu_epi64(x.as_mut_ptr() as *mut i64, _mm512_add_epi64(tx, t));
                        _mm512_storeu_epi64(
                            y.as_mut_ptr() as *mut i64,
                            _mm512_add_epi64(tx, _mm512_sub_epi64(two_q, t)),
                        );
                    });
                });
            } else {
                izip!(a.chunks_exact_mut(2 * size), &tbl.psi_rev[m..]).for_each(|(blk, w)| {
                    let (x, y) = blk.split_at_mut(size);
                    izip!(x, y).for_each(|(x, y)| tbl.dit(x, y, *w));
                });
            }
        }
        if !LAZY {
            normalize_epu64(a, tbl.q, tbl.two_q);
        }
    }
}
