//! 64-bit AVX-512 (F + DQ) butterflies for the forward and inverse NTT.
//!
//! The algorithm and twiddle tables are identical to the scalar path in
//! [`super::ntt`]; levels whose block half-size reaches 8 lanes run
//! vectorized with broadcast twiddles, the short tail levels reuse the
//! scalar butterflies. Outputs are bit-identical to the scalar path after
//! normalization.

use crate::dft::ntt::Table;
use crate::simd::{mul_lazy_epu64, normalize_epu64, reduce_once_epu64};
use core::arch::x86_64::{
    _mm512_add_epi64, _mm512_loadu_epi64, _mm512_set1_epi64, _mm512_storeu_epi64,
    _mm512_sub_epi64,
};
use itertools::izip;

#[target_feature(enable = "avx512f,avx512dq")]
pub(crate) unsafe fn forward_inplace<const LAZY: bool>(tbl: &Table<u64>, a: &mut [u64]) {
    unsafe {
        let q = _mm512_set1_epi64(tbl.q as i64);
        let two_q = _mm512_set1_epi64(tbl.two_q as i64);
        for layer in 0..tbl.log_n {
            let (m, size) = (1usize << layer, 1usize << (tbl.log_n - layer - 1));
            if size >= 8 {
                izip!(a.chunks_exact_mut(2 * size), &tbl.psi_rev[m..]).for_each(|(blk, wb)| {
                    let (x, y) = blk.split_at_mut(size);
                    let w = _mm512_set1_epi64(wb.0 as i64);
                    let w_quo = _mm512_set1_epi64(wb.1 as i64);
                    izip!(x.chunks_exact_mut(8), y.chunks_exact_mut(8)).for_each(|(x, y)| {
                        let vx = _mm512_loadu_epi64(x.as_ptr() as *const i64);
                        let vy = _mm512_loadu_epi64(y.as_ptr() as *const i64);
                        let tx = reduce_once_epu64(vx, two_q);
                        let t = mul_lazy_epu64(vy, w, w_quo, q);
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

#[target_feature(enable = "avx512f,avx512dq")]
pub(crate) unsafe fn backward_inplace<const LAZY: bool>(tbl: &Table<u64>, a: &mut [u64]) {
    unsafe {
        let q = _mm512_set1_epi64(tbl.q as i64);
        let two_q = _mm512_set1_epi64(tbl.two_q as i64);
        for layer in (1..tbl.log_n).rev() {
            let (m, size) = (1usize << layer, 1usize << (tbl.log_n - layer - 1));
            if size >= 8 {
                izip!(a.chunks_exact_mut(2 * size), &tbl.psi_inv_rev[m..]).for_each(|(blk, wb)| {
                    let (x, y) = blk.split_at_mut(size);
                    let w = _mm512_set1_epi64(wb.0 as i64);
                    let w_quo = _mm512_set1_epi64(wb.1 as i64);
                    izip!(x.chunks_exact_mut(8), y.chunks_exact_mut(8)).for_each(|(x, y)| {
                        let vx = _mm512_loadu_epi64(x.as_ptr() as *const i64);
                        let vy = _mm512_loadu_epi64(y.as_ptr() as *const i64);
                        let tx = _mm512_add_epi64(vx, vy);
                        let ty = _mm512_add_epi64(vx, _mm512_sub_epi64(two_q, vy));
                        _mm512_storeu_epi64(
                            x.as_mut_ptr() as *mut i64,
                            reduce_once_epu64(tx, two_q),
                        );
                        _mm512_storeu_epi64(
                            y.as_mut_ptr() as *mut i64,
                            mul_lazy_epu64(ty, w, w_quo, q),
                        );
                    });
                });
            } else {
                izip!(a.chunks_exact_mut(2 * size), &tbl.psi_inv_rev[m..]).for_each(|(blk, w)| {
                    let (x, y) = blk.split_at_mut(size);
                    izip!(x, y).for_each(|(x, y)| tbl.dif(x, y, *w));
                });
            }
        }
        // Last level fused with the 1/n scaling.
        let half: usize = tbl.n >> 1;
        let (x, y) = a.split_at_mut(half);
        if half >= 8 {
            let inv_n = _mm512_set1_epi64(tbl.inv_n.0 as i64);
            let inv_n_quo = _mm512_set1_epi64(tbl.inv_n.1 as i64);
            let inv_n_psi = _mm512_set1_epi64(tbl.inv_n_psi.0 as i64);
            let inv_n_psi_quo = _mm512_set1_epi64(tbl.inv_n_psi.1 as i64);
            izip!(x.chunks_exact_mut(8), y.chunks_exact_mut(8)).for_each(|(x, y)| {
                let vx = _mm512_loadu_epi64(x.as_ptr() as *const i64);
                let vy = _mm512_loadu_epi64(y.as_ptr() as *const i64);
                let tx = reduce_once_epu64(_mm512_add_epi64(vx, vy), two_q);
                let ty = _mm512_add_epi64(vx, _mm512_sub_epi64(two_q, vy));
                _mm512_storeu_epi64(
                    x.as_mut_ptr() as *mut i64,
                    mul_lazy_epu64(tx, inv_n, inv_n_quo, q),
                );
                _mm512_storeu_epi64(
                    y.as_mut_ptr() as *mut i64,
                    mul_lazy_epu64(ty, inv_n_psi, inv_n_psi_quo, q),
                );
            });
        } else {
            izip!(x, y).for_each(|(x, y)| tbl.dif_last(x, y));
        }
        if !LAZY {
            normalize_epu64(a, tbl.q, tbl.two_q);
        }
    }
}
