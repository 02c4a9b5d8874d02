//! Element-wise vector kernels mod q.
//!
//! The fused multiply-add computes `out[i] = (arg1[i] * arg2 + arg3[i]) mod
//! q` (vector times scalar plus vector), with the same scalar/AVX-512
//! tiering as the NTT. Every output element depends only on the same index
//! of the inputs, so the in-place variant is equivalent to the
//! out-of-place one.

use crate::dispatch::Backend;
use crate::error::Error;
use crate::modulus::barrett::{Barrett, BarrettPrecomp};
use crate::modulus::{ReduceOnce, ONCE};
use itertools::izip;
use tracing::trace;

#[cfg(target_arch = "x86_64")]
use crate::modulus::mul_u64_hi;
#[cfg(target_arch = "x86_64")]
use crate::simd::{mul_lazy_epu52, mul_lazy_epu64, reduce_once_epu64};
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::{
    _mm512_add_epi64, _mm512_loadu_epi64, _mm512_set1_epi64, _mm512_storeu_epi64,
};

/// Assigns `(arg1[i] * arg2 + arg3[i]) mod q` to `out[i]`, dropping the
/// addend when arg3 is None.
///
/// Fails with InvalidArguments unless `1 < q < 2^62` and all slices share
/// one length. Requires `arg2 < q` and every element of arg1 and arg3
/// below q.
pub fn fma_mod(
    arg1: &[u64],
    arg2: u64,
    arg3: Option<&[u64]>,
    out: &mut [u64],
    q: u64,
) -> Result<(), Error> {
    if q <= 1 || q >= (1u64 << 62) {
        return Err(Error::InvalidArguments(format!(
            "modulus q = {} out of range (1, 2^62)",
            q
        )));
    }
    if arg1.len() != out.len() {
        return Err(Error::InvalidArguments(format!(
            "length mismatch: arg1.len() = {} != out.len() = {}",
            arg1.len(),
            out.len()
        )));
    }
    if let Some(arg3) = arg3 {
        if arg3.len() != out.len() {
            return Err(Error::InvalidArguments(format!(
                "length mismatch: arg3.len() = {} != out.len() = {}",
                arg3.len(),
                out.len()
            )));
        }
    }
    debug_assert!(arg2 < q, "arg2 = {} >= q = {}", arg2, q);
    debug_assert!(arg1.iter().all(|&x| x < q), "arg1 out of [0, q)");
    debug_assert!(
        arg3.map_or(true, |a| a.iter().all(|&x| x < q)),
        "arg3 out of [0, q)"
    );

    let bp: BarrettPrecomp<u64> = BarrettPrecomp::new(q);
    match Backend::for_eltwise(q) {
        #[cfg(target_arch = "x86_64")]
        Backend::Ifma52 => {
            trace!("52-bit AVX-512 IFMA eltwise FMA");
            let w: Barrett<u64> = bp.prepare::<52>(arg2);
            unsafe {
                fma_mod_ifma(
                    arg1.as_ptr(),
                    arg3.map(|a| a.as_ptr()),
                    out.as_mut_ptr(),
                    out.len(),
                    arg2,
                    *w.quotient(),
                    q,
                )
            }
        }
        #[cfg(target_arch = "x86_64")]
        Backend::Avx512 => {
            trace!("64-bit AVX-512 eltwise FMA");
            let w: Barrett<u64> = bp.prepare::<64>(arg2);
            unsafe {
                fma_mod_avx512(
                    arg1.as_ptr(),
                    arg3.map(|a| a.as_ptr()),
                    out.as_mut_ptr(),
                    out.len(),
                    arg2,
                    *w.quotient(),
                    q,
                )
            }
        }
        _ => {
            trace!("64-bit scalar eltwise FMA");
            fma_mod_scalar(&bp, bp.prepare::<64>(arg2), arg1, arg3, out)
        }
    }
    Ok(())
}

/// In-place form of [`fma_mod`]: `arg1[i] = (arg1[i] * arg2 + arg3[i]) mod q`.
pub fn fma_mod_assign(
    arg1: &mut [u64],
    arg2: u64,
    arg3: Option<&[u64]>,
    q: u64,
) -> Result<(), Error> {
    if q <= 1 || q >= (1u64 << 62) {
        return Err(Error::InvalidArguments(format!(
            "modulus q = {} out of range (1, 2^62)",
            q
        )));
    }
    if let Some(arg3) = arg3 {
        if arg3.len() != arg1.len() {
            return Err(Error::InvalidArguments(format!(
                "length mismatch: arg3.len() = {} != arg1.len() = {}",
                arg3.len(),
                arg1.len()
            )));
        }
    }
    debug_assert!(arg2 < q, "arg2 = {} >= q = {}", arg2, q);
    debug_assert!(arg1.iter().all(|&x| x < q), "arg1 out of [0, q)");
    debug_assert!(
        arg3.map_or(true, |a| a.iter().all(|&x| x < q)),
        "arg3 out of [0, q)"
    );

    let bp: BarrettPrecomp<u64> = BarrettPrecomp::new(q);
    match Backend::for_eltwise(q) {
        #[cfg(target_arch = "x86_64")]
        Backend::Ifma52 => {
            trace!("52-bit AVX-512 IFMA eltwise FMA");
            let w: Barrett<u64> = bp.prepare::<52>(arg2);
            let data: *mut u64 = arg1.as_mut_ptr();
            unsafe {
                fma_mod_ifma(
                    data,
                    arg3.map(|a| a.as_ptr()),
                    data,
                    arg1.len(),
                    arg2,
                    *w.quotient(),
                    q,
                )
            }
        }
        #[cfg(target_arch = "x86_64")]
        Backend::Avx512 => {
            trace!("64-bit AVX-512 eltwise FMA");
            let w: Barrett<u64> = bp.prepare::<64>(arg2);
            let data: *mut u64 = arg1.as_mut_ptr();
            unsafe {
                fma_mod_avx512(
                    data,
                    arg3.map(|a| a.as_ptr()),
                    data,
                    arg1.len(),
                    arg2,
                    *w.quotient(),
                    q,
                )
            }
        }
        _ => {
            trace!("64-bit scalar eltwise FMA");
            fma_mod_scalar_assign(&bp, bp.prepare::<64>(arg2), arg1, arg3)
        }
    }
    Ok(())
}

fn fma_mod_scalar(
    bp: &BarrettPrecomp<u64>,
    w: Barrett<u64>,
    arg1: &[u64],
    arg3: Option<&[u64]>,
    out: &mut [u64],
) {
    let q: u64 = *bp.q();
    match arg3 {
        Some(arg3) => izip!(arg1, arg3, out.iter_mut()).for_each(|(a, c, o)| {
            let t: u64 = bp.mul_external::<ONCE>(w, *a);
            *o = (t + *c).reduce_once(q);
        }),
        None => izip!(arg1, out.iter_mut()).for_each(|(a, o)| {
            *o = bp.mul_external::<ONCE>(w, *a);
        }),
    }
}

fn fma_mod_scalar_assign(
    bp: &BarrettPrecomp<u64>,
    w: Barrett<u64>,
    arg1: &mut [u64],
    arg3: Option<&[u64]>,
) {
    let q: u64 = *bp.q();
    match arg3 {
        Some(arg3) => izip!(arg1.iter_mut(), arg3).for_each(|(a, c)| {
            let t: u64 = bp.mul_external::<ONCE>(w, *a);
            *a = (t + *c).reduce_once(q);
        }),
        None => arg1
            .iter_mut()
            .for_each(|a| bp.mul_external_assign::<ONCE>(w, a)),
    }
}

/// 64-bit AVX-512 kernel. Raw pointers so `out` may alias `arg1`; each
/// output lane is computed from the same input index before the store.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f,avx512dq")]
unsafe fn fma_mod_avx512(
    arg1: *const u64,
    arg3: Option<*const u64>,
    out: *mut u64,
    n: usize,
    arg2: u64,
    quo64: u64,
    q: u64,
) {
    unsafe {
        let vq = _mm512_set1_epi64(q as i64);
        let vw = _mm512_set1_epi64(arg2 as i64);
        let vquo = _mm512_set1_epi64(quo64 as i64);
        let mut i: usize = 0;
        match arg3 {
            Some(arg3) => {
                while i + 8 <= n {
                    let va = _mm512_loadu_epi64(arg1.add(i) as *const i64);
                    let vc = _mm512_loadu_epi64(arg3.add(i) as *const i64);
                    let t = reduce_once_epu64(mul_lazy_epu64(va, vw, vquo, vq), vq);
                    let r = reduce_once_epu64(_mm512_add_epi64(t, vc), vq);
                    _mm512_storeu_epi64(out.add(i) as *mut i64, r);
                    i += 8;
                }
                while i < n {
                    let t: u64 = lazy_tail(*arg1.add(i), arg2, quo64, q).reduce_once(q);
                    *out.add(i) = (t + *arg3.add(i)).reduce_once(q);
                    i += 1;
                }
            }
            None => {
                while i + 8 <= n {
                    let va = _mm512_loadu_epi64(arg1.add(i) as *const i64);
                    let t = reduce_once_epu64(mul_lazy_epu64(va, vw, vquo, vq), vq);
                    _mm512_storeu_epi64(out.add(i) as *mut i64, t);
                    i += 8;
                }
                while i < n {
                    *out.add(i) = lazy_tail(*arg1.add(i), arg2, quo64, q).reduce_once(q);
                    i += 1;
                }
            }
        }
    }
}

/// 52-bit AVX-512 IFMA kernel; requires q < 2^51 (enforced by the backend
/// selection) so the lazy products stay below 2^52.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f,avx512ifma")]
unsafe fn fma_mod_ifma(
    arg1: *const u64,
    arg3: Option<*const u64>,
    out: *mut u64,
    n: usize,
    arg2: u64,
    quo52: u64,
    q: u64,
) {
    unsafe {
        let vq = _mm512_set1_epi64(q as i64);
        let vw = _mm512_set1_epi64(arg2 as i64);
        let vquo = _mm512_set1_epi64(quo52 as i64);
        let mask52 = _mm512_set1_epi64((1i64 << 52) - 1);
        // The scalar tail reuses the 64-bit quotient path; the canonical
        // result is identical.
        let quo64: u64 = (((arg2 as u128) << 64) / q as u128) as u64;
        let mut i: usize = 0;
        match arg3 {
            Some(arg3) => {
                while i + 8 <= n {
                    let va = _mm512_loadu_epi64(arg1.add(i) as *const i64);
                    let vc = _mm512_loadu_epi64(arg3.add(i) as *const i64);
                    let t = reduce_once_epu64(mul_lazy_epu52(va, vw, vquo, vq, mask52), vq);
                    let r = reduce_once_epu64(_mm512_add_epi64(t, vc), vq);
                    _mm512_storeu_epi64(out.add(i) as *mut i64, r);
                    i += 8;
                }
                while i < n {
                    let t: u64 = lazy_tail(*arg1.add(i), arg2, quo64, q).reduce_once(q);
                    *out.add(i) = (t + *arg3.add(i)).reduce_once(q);
                    i += 1;
                }
            }
            None => {
                while i + 8 <= n {
                    let va = _mm512_loadu_epi64(arg1.add(i) as *const i64);
                    let t = reduce_once_epu64(mul_lazy_epu52(va, vw, vquo, vq, mask52), vq);
                    _mm512_storeu_epi64(out.add(i) as *mut i64, t);
                    i += 8;
                }
                while i < n {
                    *out.add(i) = lazy_tail(*arg1.add(i), arg2, quo64, q).reduce_once(q);
                    i += 1;
                }
            }
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn lazy_tail(x: u64, w: u64, quo64: u64, q: u64) -> u64 {
    let t: u64 = mul_u64_hi::<64>(x, quo64);
    x.wrapping_mul(w).wrapping_sub(t.wrapping_mul(q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_fma_seed_case() {
        let mut out: Vec<u64> = vec![0; 4];
        fma_mod(&[1, 2, 3, 4], 5, Some(&[10, 20, 30, 40]), &mut out, 97).unwrap();
        assert_eq!(out, vec![15, 30, 45, 60]);
    }

    #[test]
    fn test_fma_without_addend() {
        let mut out: Vec<u64> = vec![0; 4];
        fma_mod(&[30, 40, 50, 60], 5, None, &mut out, 97).unwrap();
        assert_eq!(out, vec![150 % 97, 200 % 97, 250 % 97, 300 % 97]);
    }

    #[test]
    fn test_fma_random_against_reference() {
        let mut rng = rand::thread_rng();
        for &q in &[97u64, 0xffffee001, 0x1fffffffffe00001] {
            // An odd length exercises the SIMD tail.
            let n: usize = 100;
            let arg1: Vec<u64> = (0..n).map(|_| rng.gen_range(0..q)).collect();
            let arg3: Vec<u64> = (0..n).map(|_| rng.gen_range(0..q)).collect();
            let arg2: u64 = rng.gen_range(0..q);
            let mut out: Vec<u64> = vec![0; n];
            fma_mod(&arg1, arg2, Some(&arg3), &mut out, q).unwrap();
            izip!(&arg1, &arg3, &out).for_each(|(a, c, o)| {
                let expected: u128 =
                    (*a as u128 * arg2 as u128 + *c as u128) % q as u128;
                assert_eq!(*o as u128, expected);
            });
            let mut out: Vec<u64> = vec![0; n];
            fma_mod(&arg1, arg2, None, &mut out, q).unwrap();
            izip!(&arg1, &out).for_each(|(a, o)| {
                assert_eq!(*o as u128, *a as u128 * arg2 as u128 % q as u128);
            });
        }
    }

    #[test]
    fn test_fma_assign_matches() {
        let mut rng = rand::thread_rng();
        let q: u64 = 0xffffee001;
        let n: usize = 37;
        let arg1: Vec<u64> = (0..n).map(|_| rng.gen_range(0..q)).collect();
        let arg3: Vec<u64> = (0..n).map(|_| rng.gen_range(0..q)).collect();
        let arg2: u64 = rng.gen_range(0..q);

        let mut out: Vec<u64> = vec![0; n];
        fma_mod(&arg1, arg2, Some(&arg3), &mut out, q).unwrap();
        let mut aliased: Vec<u64> = arg1.clone();
        fma_mod_assign(&mut aliased, arg2, Some(&arg3), q).unwrap();
        assert_eq!(out, aliased);

        let mut out: Vec<u64> = vec![0; n];
        fma_mod(&arg1, arg2, None, &mut out, q).unwrap();
        let mut aliased: Vec<u64> = arg1.clone();
        fma_mod_assign(&mut aliased, arg2, None, q).unwrap();
        assert_eq!(out, aliased);
    }

    #[test]
    fn test_fma_dispatch_matches_scalar() {
        let mut rng = rand::thread_rng();
        let q: u64 = 0xffffee001;
        let n: usize = 64;
        let arg1: Vec<u64> = (0..n).map(|_| rng.gen_range(0..q)).collect();
        let arg3: Vec<u64> = (0..n).map(|_| rng.gen_range(0..q)).collect();
        let arg2: u64 = rng.gen_range(0..q);
        let mut dispatched: Vec<u64> = vec![0; n];
        fma_mod(&arg1, arg2, Some(&arg3), &mut dispatched, q).unwrap();
        let bp: BarrettPrecomp<u64> = BarrettPrecomp::new(q);
        let mut scalar: Vec<u64> = vec![0; n];
        fma_mod_scalar(&bp, bp.prepare::<64>(arg2), &arg1, Some(&arg3), &mut scalar);
        assert_eq!(dispatched, scalar);
    }

    #[test]
    fn test_fma_invalid_arguments() {
        let mut out: Vec<u64> = vec![0; 3];
        assert!(matches!(
            fma_mod(&[1, 2, 3, 4], 5, None, &mut out, 97),
            Err(Error::InvalidArguments(_))
        ));
        let mut out: Vec<u64> = vec![0; 4];
        assert!(matches!(
            fma_mod(&[1, 2, 3, 4], 5, Some(&[10, 20]), &mut out, 97),
            Err(Error::InvalidArguments(_))
        ));
        let mut out: Vec<u64> = vec![0; 1];
        assert!(matches!(
            fma_mod(&[0], 0, None, &mut out, 0),
            Err(Error::InvalidArguments(_))
        ));
        assert!(matches!(
            fma_mod_assign(&mut out, 0, Some(&[1, 2]), 97),
            Err(Error::InvalidArguments(_))
        ));
    }
}
