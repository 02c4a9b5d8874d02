use crate::error::Error;
use crate::modulus::barrett::{Barrett, BarrettPrecomp};
use crate::modulus::impl_u64::prime::is_prime;
use crate::modulus::prime::Prime;
use crate::modulus::{ReduceOnce, ONCE, REDUCEMOD};
use itertools::izip;

impl Prime<u64> {
    /// Returns a new instance of Prime<u64>.
    /// Fails if q is not a prime with 2 < q < 2^62.
    pub fn new(q: u64) -> Result<Self, Error> {
        if q <= 2 || q >= (1u64 << 62) {
            return Err(Error::InvalidArguments(format!(
                "modulus q = {} out of range (2, 2^62)",
                q
            )));
        }
        if !is_prime(q) {
            return Err(Error::InvalidArguments(format!(
                "modulus q = {} is not prime",
                q
            )));
        }
        Ok(Self::new_unchecked(q))
    }

    /// Returns a new instance of Prime<u64> without checking primality.
    pub fn new_unchecked(q: u64) -> Self {
        debug_assert!(q > 2 && q < (1u64 << 62), "invalid modulus q = {}", q);
        Self {
            q,
            barrett: BarrettPrecomp::new(q),
        }
    }

    /// Returns (x + y) mod q. Requires x, y < q.
    #[inline(always)]
    pub fn add(&self, x: u64, y: u64) -> u64 {
        debug_assert!(x < self.q && y < self.q);
        (x + y).reduce_once(self.q)
    }

    /// Returns (x - y) mod q. Requires x, y < q.
    #[inline(always)]
    pub fn sub(&self, x: u64, y: u64) -> u64 {
        debug_assert!(x < self.q && y < self.q);
        (x + self.q - y).reduce_once(self.q)
    }

    /// Returns -x mod q. Requires x < q.
    #[inline(always)]
    pub fn neg(&self, x: u64) -> u64 {
        debug_assert!(x < self.q);
        (self.q - x).reduce_once(self.q)
    }

    /// Returns (x * y) mod q via reduction of the full 128-bit product.
    /// Requires x, y < q.
    #[inline(always)]
    pub fn mul(&self, x: u64, y: u64) -> u64 {
        debug_assert!(x < self.q && y < self.q);
        self.barrett.reduce_u128(x as u128 * y as u128)
    }

    /// Returns (x * y.value()) mod q using the prepared Barrett pair.
    #[inline(always)]
    pub fn mul_prepared(&self, x: u64, y: Barrett<u64>) -> u64 {
        self.barrett.mul_external::<ONCE>(y, x)
    }

    /// Returns base^exp mod q by square-and-multiply. Requires base < q.
    pub fn pow(&self, base: u64, exp: u64) -> u64 {
        debug_assert!(base < self.q);
        let mut y: u64 = 1;
        let mut b: u64 = base;
        let mut e: u64 = exp;
        while e > 0 {
            if e & 1 == 1 {
                y = self.mul(y, b);
            }
            b = self.mul(b, b);
            e >>= 1;
        }
        y
    }

    /// Returns x^-1 mod q by the extended Euclidean algorithm.
    /// Fails if gcd(x, q) != 1.
    pub fn inv(&self, x: u64) -> Result<u64, Error> {
        let (mut t, mut new_t): (i128, i128) = (0, 1);
        let (mut r, mut new_r): (i128, i128) = (self.q as i128, (x % self.q) as i128);
        while new_r != 0 {
            let quotient: i128 = r / new_r;
            (t, new_t) = (new_t, t - quotient * new_t);
            (r, new_r) = (new_r, r - quotient * new_r);
        }
        if r != 1 {
            return Err(Error::NoInverse {
                value: x,
                modulus: self.q,
            });
        }
        if t < 0 {
            t += self.q as i128;
        }
        Ok(t as u64)
    }

    /// Applies a parameterized modular reduction on x; see
    /// [`BarrettPrecomp::reduce_assign`].
    #[inline(always)]
    pub fn reduce<const REDUCE: REDUCEMOD>(&self, x: u64) -> u64 {
        self.barrett.reduce::<REDUCE>(x)
    }

    /// Assigns a[i] + b[i] mod q to b[i]. Requires elements < q.
    pub fn add_vec_assign(&self, a: &[u64], b: &mut [u64]) {
        let n: usize = a.len();
        debug_assert_eq!(n, b.len(), "length mismatch: {} != {}", n, b.len());
        izip!(a.chunks_exact(8), b.chunks_exact_mut(8)).for_each(|(a, b)| {
            b[0] = self.add(a[0], b[0]);
            b[1] = self.add(a[1], b[1]);
            b[2] = self.add(a[2], b[2]);
            b[3] = self.add(a[3], b[3]);
            b[4] = self.add(a[4], b[4]);
            b[5] = self.add(a[5], b[5]);
            b[6] = self.add(a[6], b[6]);
            b[7] = self.add(a[7], b[7]);
        });
        let m: usize = n - (n & 7);
        izip!(&a[m..], &mut b[m..]).for_each(|(a, b)| *b = self.add(*a, *b));
    }

    /// Assigns a[i] - b[i] mod q to b[i]. Requires elements < q.
    pub fn sub_vec_assign(&self, a: &[u64], b: &mut [u64]) {
        let n: usize = a.len();
        debug_assert_eq!(n, b.len(), "length mismatch: {} != {}", n, b.len());
        izip!(a.chunks_exact(8), b.chunks_exact_mut(8)).for_each(|(a, b)| {
            b[0] = self.sub(a[0], b[0]);
            b[1] = self.sub(a[1], b[1]);
            b[2] = self.sub(a[2], b[2]);
            b[3] = self.sub(a[3], b[3]);
            b[4] = self.sub(a[4], b[4]);
            b[5] = self.sub(a[5], b[5]);
            b[6] = self.sub(a[6], b[6]);
            b[7] = self.sub(a[7], b[7]);
        });
        let m: usize = n - (n & 7);
        izip!(&a[m..], &mut b[m..]).for_each(|(a, b)| *b = self.sub(*a, *b));
    }

    /// Assigns -a[i] mod q to a[i]. Requires elements < q.
    pub fn neg_vec_assign(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|a| *a = self.neg(*a));
    }
}
