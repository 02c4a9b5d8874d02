use crate::dft::DFT;
use crate::dispatch::Backend;
use crate::error::Error;
use crate::modulus::barrett::Barrett;
use crate::modulus::prime::Prime;
use crate::modulus::{ReduceOnce, WordOps, ONCE};
use itertools::izip;
use tracing::trace;

/// Per-modulus negacyclic NTT state: the prime, the canonical 2n-th root of
/// unity psi, and the twiddle tables in bit-reversed order at both Barrett
/// shifts (64 for the scalar/DQ paths, 52 for the IFMA path).
///
/// Immutable after construction; a table can be shared across threads for
/// concurrent transforms of disjoint buffers. The backend tier is fixed at
/// construction so the butterfly loops stay monomorphic.
#[allow(dead_code)]
pub struct Table<O> {
    pub(crate) prime: Prime<O>,
    pub(crate) n: usize,
    pub(crate) log_n: u32,
    pub(crate) psi: O,
    pub(crate) q: O,
    pub(crate) two_q: O,
    pub(crate) four_q: O,
    // Forward and inverse twiddles, bit-reversed order, entry 0 unused.
    pub(crate) psi_rev: Vec<Barrett<O>>,
    pub(crate) psi_rev_quo52: Vec<O>,
    pub(crate) psi_inv_rev: Vec<Barrett<O>>,
    pub(crate) psi_inv_rev_quo52: Vec<O>,
    // Last inverse level fused with the 1/n scaling.
    pub(crate) inv_n: Barrett<O>,
    pub(crate) inv_n_quo52: O,
    pub(crate) inv_n_psi: Barrett<O>,
    pub(crate) inv_n_psi_quo52: O,
    pub(crate) fwd_backend: Backend,
    pub(crate) bwd_backend: Backend,
}

impl Table<u64> {
    /// Returns the NTT table for `Z_q[X]/(X^n + 1)` with the canonical
    /// (minimal) primitive 2n-th root of unity.
    /// Requires n a power of two >= 2 and q an NTT-friendly prime:
    /// `2 < q < 2^62` with `q = 1 mod 2n`.
    pub fn new(n: u64, q: u64) -> Result<Table<u64>, Error> {
        let prime: Prime<u64> = Self::check_arguments(n, q)?;
        let psi: u64 = prime.minimal_primitive_root(n << 1)?;
        Self::build(prime, n as usize, psi)
    }

    /// Returns the NTT table using the caller-provided primitive 2n-th root
    /// of unity psi.
    pub fn new_with_root(n: u64, q: u64, psi: u64) -> Result<Table<u64>, Error> {
        let prime: Prime<u64> = Self::check_arguments(n, q)?;
        if psi >= q || !prime.is_primitive_root(psi, n << 1)? {
            return Err(Error::InvalidArguments(format!(
                "psi = {} is not a primitive {}-th root of unity mod {}",
                psi,
                n << 1,
                q
            )));
        }
        Self::build(prime, n as usize, psi)
    }

    fn check_arguments(n: u64, q: u64) -> Result<Prime<u64>, Error> {
        if n < 2 || n & (n - 1) != 0 {
            return Err(Error::InvalidArguments(format!(
                "n = {} is not a power of two >= 2",
                n
            )));
        }
        let prime: Prime<u64> = Prime::<u64>::new(q)?;
        if q % (n << 1) != 1 {
            return Err(Error::InvalidArguments(format!(
                "q = {} does not satisfy q = 1 mod 2n = {}",
                q,
                n << 1
            )));
        }
        Ok(prime)
    }

    fn build(prime: Prime<u64>, n: usize, psi: u64) -> Result<Table<u64>, Error> {
        let log_n: u32 = n.log2() as u32;
        let bp = prime.barrett;
        let psi_inv: u64 = prime.inv(psi)?;

        let mut psi_rev: Vec<Barrett<u64>> = vec![Barrett(0, 0); n];
        let mut psi_rev_quo52: Vec<u64> = vec![0; n];
        let mut psi_inv_rev: Vec<Barrett<u64>> = vec![Barrett(0, 0); n];
        let mut psi_inv_rev_quo52: Vec<u64> = vec![0; n];

        psi_rev[0] = bp.prepare::<64>(1);
        psi_rev_quo52[0] = *bp.prepare::<52>(1).quotient();
        psi_inv_rev[0] = bp.prepare::<64>(1);
        psi_inv_rev_quo52[0] = *bp.prepare::<52>(1).quotient();

        let psi_b: Barrett<u64> = bp.prepare::<64>(psi);
        let psi_inv_b: Barrett<u64> = bp.prepare::<64>(psi_inv);
        let mut fwd: u64 = 1;
        let mut bwd: u64 = 1;
        for i in 1..n {
            let i_rev: usize = i.reverse_bits_msb(log_n);
            fwd = bp.mul_external::<ONCE>(psi_b, fwd);
            bwd = bp.mul_external::<ONCE>(psi_inv_b, bwd);
            psi_rev[i_rev] = bp.prepare::<64>(fwd);
            psi_rev_quo52[i_rev] = *bp.prepare::<52>(fwd).quotient();
            psi_inv_rev[i_rev] = bp.prepare::<64>(bwd);
            psi_inv_rev_quo52[i_rev] = *bp.prepare::<52>(bwd).quotient();
        }

        let inv_n_value: u64 = prime.inv(n as u64)?;
        let inv_n_psi_value: u64 = prime.mul(inv_n_value, *psi_inv_rev[1].value());

        let q: u64 = *prime.q();
        Ok(Self {
            prime,
            n,
            log_n,
            psi,
            q,
            two_q: q << 1,
            four_q: q << 2,
            psi_rev,
            psi_rev_quo52,
            psi_inv_rev,
            psi_inv_rev_quo52,
            inv_n: bp.prepare::<64>(inv_n_value),
            inv_n_quo52: *bp.prepare::<52>(inv_n_value).quotient(),
            inv_n_psi: bp.prepare::<64>(inv_n_psi_value),
            inv_n_psi_quo52: *bp.prepare::<52>(inv_n_psi_value).quotient(),
            fwd_backend: Backend::for_ntt_forward(q),
            bwd_backend: Backend::for_ntt_backward(q),
        })
    }

    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn q(&self) -> u64 {
        self.q
    }

    /// Returns the primitive 2n-th root of unity the tables were built from.
    #[inline(always)]
    pub fn psi(&self) -> u64 {
        self.psi
    }

    #[inline(always)]
    pub fn prime(&self) -> &Prime<u64> {
        &self.prime
    }

    /// In-place forward negacyclic NTT, natural order in, bit-reversed
    /// order out; input and output values in [0, q).
    pub fn forward_inplace(&self, a: &mut [u64]) {
        self.forward_dispatch::<false>(a)
    }

    /// As [`Table::forward_inplace`] but skips the final normalization:
    /// outputs are lazy, in [0, 4q).
    pub fn forward_inplace_lazy(&self, a: &mut [u64]) {
        self.forward_dispatch::<true>(a)
    }

    /// In-place inverse negacyclic NTT, bit-reversed order in, natural
    /// order out; the 1/n scaling is fused into the last level. Input and
    /// output values in [0, q).
    pub fn backward_inplace(&self, a: &mut [u64]) {
        self.backward_dispatch::<false>(a)
    }

    /// As [`Table::backward_inplace`] but with lazy outputs in [0, 2q).
    pub fn backward_inplace_lazy(&self, a: &mut [u64]) {
        self.backward_dispatch::<true>(a)
    }

    fn forward_dispatch<const LAZY: bool>(&self, a: &mut [u64]) {
        assert_eq!(
            a.len(),
            self.n,
            "invalid a.len() = {}: must be n = {}",
            a.len(),
            self.n
        );
        // The lazy variant admits lazy inputs up to the butterfly tolerance.
        let bound: u64 = if LAZY { self.four_q } else { self.q };
        debug_assert!(a.iter().all(|&x| x < bound), "input out of range");
        match self.fwd_backend {
            #[cfg(target_arch = "x86_64")]
            Backend::Ifma52 => {
                trace!("52-bit AVX-512 IFMA forward NTT");
                unsafe { crate::dft::ntt_ifma::forward_inplace::<LAZY>(self, a) }
            }
            #[cfg(target_arch = "x86_64")]
            Backend::Avx512 => {
                trace!("64-bit AVX-512 forward NTT");
                unsafe { crate::dft::ntt_avx512::forward_inplace::<LAZY>(self, a) }
            }
            _ => {
                trace!("64-bit scalar forward NTT");
                self.forward_scalar::<LAZY>(a)
            }
        }
    }

    fn backward_dispatch<const LAZY: bool>(&self, a: &mut [u64]) {
        assert_eq!(
            a.len(),
            self.n,
            "invalid a.len() = {}: must be n = {}",
            a.len(),
            self.n
        );
        let bound: u64 = if LAZY { self.two_q } else { self.q };
        debug_assert!(a.iter().all(|&x| x < bound), "input out of range");
        match self.bwd_backend {
            #[cfg(target_arch = "x86_64")]
            Backend::Avx512 => {
                trace!("64-bit AVX-512 inverse NTT");
                unsafe { crate::dft::ntt_avx512::backward_inplace::<LAZY>(self, a) }
            }
            _ => {
                trace!("64-bit scalar inverse NTT");
                self.backward_scalar::<LAZY>(a)
            }
        }
    }

    /// Scalar Cooley-Tukey forward pass; butterflies stay lazy in [0, 4q)
    /// throughout, with one normalization sweep at the end.
    pub(crate) fn forward_scalar<const LAZY: bool>(&self, a: &mut [u64]) {
        for layer in 0..self.log_n {
            let (m, size) = (1usize << layer, 1usize << (self.log_n - layer - 1));
            if size >= 8 {
                izip!(a.chunks_exact_mut(2 * size), &self.psi_rev[m..]).for_each(|(blk, w)| {
                    let (x, y) = blk.split_at_mut(size);
                    izip!(x.chunks_exact_mut(8), y.chunks_exact_mut(8)).for_each(|(x, y)| {
                        self.dit(&mut x[0], &mut y[0], *w);
                        self.dit(&mut x[1], &mut y[1], *w);
                        self.dit(&mut x[2], &mut y[2], *w);
                        self.dit(&mut x[3], &mut y[3], *w);
                        self.dit(&mut x[4], &mut y[4], *w);
                        self.dit(&mut x[5], &mut y[5], *w);
                        self.dit(&mut x[6], &mut y[6], *w);
                        self.dit(&mut x[7], &mut y[7], *w);
                    });
                });
            } else {
                izip!(a.chunks_exact_mut(2 * size), &self.psi_rev[m..]).for_each(|(blk, w)| {
                    let (x, y) = blk.split_at_mut(size);
                    izip!(x, y).for_each(|(x, y)| self.dit(x, y, *w));
                });
            }
        }
        if !LAZY {
            self.normalize(a);
        }
    }

    /// The Harvey forward butterfly: maps (x, y) in [0, 4q)^2 to
    /// (x + w*y, x - w*y) mod q, both in [0, 4q).
    #[inline(always)]
    pub(crate) fn dit(&self, x: &mut u64, y: &mut u64, w: Barrett<u64>) {
        debug_assert!(*x < self.four_q, "x = {} >= 4q = {}", x, self.four_q);
        debug_assert!(*y < self.four_q, "y = {} >= 4q = {}", y, self.four_q);
        let tx: u64 = x.reduce_once(self.two_q);
        let t: u64 = self.prime.barrett.mul_lazy::<64>(*y, w.0, w.1);
        *x = tx + t;
        *y = tx + self.two_q - t;
        debug_assert!(*x < self.four_q && *y < self.four_q);
    }

    /// Scalar Gentleman-Sande inverse pass; the last level is fused with
    /// the 1/n scaling.
    pub(crate) fn backward_scalar<const LAZY: bool>(&self, a: &mut [u64]) {
        for layer in (1..self.log_n).rev() {
            let (m, size) = (1usize << layer, 1usize << (self.log_n - layer - 1));
            if size >= 8 {
                izip!(a.chunks_exact_mut(2 * size), &self.psi_inv_rev[m..]).for_each(|(blk, w)| {
                    let (x, y) = blk.split_at_mut(size);
                    izip!(x.chunks_exact_mut(8), y.chunks_exact_mut(8)).for_each(|(x, y)| {
                        self.dif(&mut x[0], &mut y[0], *w);
                        self.dif(&mut x[1], &mut y[1], *w);
                        self.dif(&mut x[2], &mut y[2], *w);
                        self.dif(&mut x[3], &mut y[3], *w);
                        self.dif(&mut x[4], &mut y[4], *w);
                        self.dif(&mut x[5], &mut y[5], *w);
                        self.dif(&mut x[6], &mut y[6], *w);
                        self.dif(&mut x[7], &mut y[7], *w);
                    });
                });
            } else {
                izip!(a.chunks_exact_mut(2 * size), &self.psi_inv_rev[m..]).for_each(|(blk, w)| {
                    let (x, y) = blk.split_at_mut(size);
                    izip!(x, y).for_each(|(x, y)| self.dif(x, y, *w));
                });
            }
        }
        let (x, y) = a.split_at_mut(self.n >> 1);
        if self.n >> 1 >= 8 {
            izip!(x.chunks_exact_mut(8), y.chunks_exact_mut(8)).for_each(|(x, y)| {
                self.dif_last(&mut x[0], &mut y[0]);
                self.dif_last(&mut x[1], &mut y[1]);
                self.dif_last(&mut x[2], &mut y[2]);
                self.dif_last(&mut x[3], &mut y[3]);
                self.dif_last(&mut x[4], &mut y[4]);
                self.dif_last(&mut x[5], &mut y[5]);
                self.dif_last(&mut x[6], &mut y[6]);
                self.dif_last(&mut x[7], &mut y[7]);
            });
        } else {
            izip!(x, y).for_each(|(x, y)| self.dif_last(x, y));
        }
        if !LAZY {
            self.normalize(a);
        }
    }

    /// The Harvey inverse butterfly: maps (x, y) in [0, 2q)^2 to
    /// (x + y, w*(x - y)) mod q, both in [0, 2q).
    #[inline(always)]
    pub(crate) fn dif(&self, x: &mut u64, y: &mut u64, w: Barrett<u64>) {
        debug_assert!(*x < self.two_q, "x = {} >= 2q = {}", x, self.two_q);
        debug_assert!(*y < self.two_q, "y = {} >= 2q = {}", y, self.two_q);
        let tx: u64 = *x + *y;
        let ty: u64 = *x + self.two_q - *y;
        *x = tx.reduce_once(self.two_q);
        *y = self.prime.barrett.mul_lazy::<64>(ty, w.0, w.1);
    }

    /// Last inverse level, fused with the 1/n scaling:
    /// (x, y) -> ((x + y)/n, psi^-1 * (x - y)/n) mod q, both in [0, 2q).
    #[inline(always)]
    pub(crate) fn dif_last(&self, x: &mut u64, y: &mut u64) {
        debug_assert!(*x < self.two_q && *y < self.two_q);
        let tx: u64 = (*x + *y).reduce_once(self.two_q);
        let ty: u64 = *x + self.two_q - *y;
        *x = self
            .prime
            .barrett
            .mul_lazy::<64>(tx, self.inv_n.0, self.inv_n.1);
        *y = self
            .prime
            .barrett
            .mul_lazy::<64>(ty, self.inv_n_psi.0, self.inv_n_psi.1);
    }

    /// Reduces every element from the lazy [0, 4q) range to [0, q).
    #[inline(always)]
    pub(crate) fn normalize(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|x| {
            x.reduce_once_assign(self.two_q);
            x.reduce_once_assign(self.q);
            debug_assert!(*x < self.q, "normalization left {} >= q = {}", x, self.q);
        });
    }

    /// Textbook forward transform over fully reduced modular arithmetic,
    /// for cross-validation of the lazy paths.
    pub fn forward_inplace_reference(&self, a: &mut [u64]) {
        assert_eq!(
            a.len(),
            self.n,
            "invalid a.len() = {}: must be n = {}",
            a.len(),
            self.n
        );
        for layer in 0..self.log_n {
            let (m, size) = (1usize << layer, 1usize << (self.log_n - layer - 1));
            izip!(a.chunks_exact_mut(2 * size), &self.psi_rev[m..]).for_each(|(blk, w)| {
                let (x, y) = blk.split_at_mut(size);
                izip!(x, y).for_each(|(x, y)| {
                    let t: u64 = self.prime.mul(*y, w.0);
                    let tx: u64 = *x;
                    *x = self.prime.add(tx, t);
                    *y = self.prime.sub(tx, t);
                });
            });
        }
    }
}

impl DFT<u64> for Table<u64> {
    fn forward_inplace(&self, a: &mut [u64]) {
        self.forward_inplace(a)
    }

    fn forward_inplace_lazy(&self, a: &mut [u64]) {
        self.forward_inplace_lazy(a)
    }

    fn backward_inplace(&self, a: &mut [u64]) {
        self.backward_inplace(a)
    }

    fn backward_inplace_lazy(&self, a: &mut [u64]) {
        self.backward_inplace_lazy(a)
    }
}
