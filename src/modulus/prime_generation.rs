use crate::error::Error;
use crate::modulus::impl_u64::prime::is_prime;

/// Scans for NTT-friendly primes, i.e. primes `p = 1 mod 2N`, within the
/// bit-size band `(2^bit_size, 2^(bit_size+1))`.
///
/// Candidates step by `2N` so every candidate already satisfies the
/// congruence; only primality is tested.
pub struct NttPrimeGenerator {
    bit_size: u32,
    nth_root: u64,
    next_candidate: u64,
    prev_candidate: u64,
}

impl NttPrimeGenerator {
    /// Returns a generator of primes `p = 1 mod nth_root` with
    /// `2^bit_size < p < 2^(bit_size+1)`.
    /// Requires nth_root a power of two with `nth_root <= 2^bit_size`, and
    /// `bit_size <= 61` so every emitted prime stays below 2^62.
    pub fn new(bit_size: u32, nth_root: u64) -> Result<Self, Error> {
        if nth_root < 2 || nth_root & (nth_root - 1) != 0 {
            return Err(Error::InvalidArguments(format!(
                "nth_root = {} is not a power of two >= 2",
                nth_root
            )));
        }
        if bit_size < 2 || bit_size > 61 {
            return Err(Error::InvalidArguments(format!(
                "bit_size = {} out of range [2, 61]",
                bit_size
            )));
        }
        if nth_root > (1u64 << bit_size) {
            return Err(Error::InvalidArguments(format!(
                "nth_root = {} exceeds 2^bit_size = {}",
                nth_root,
                1u64 << bit_size
            )));
        }
        Ok(Self {
            bit_size,
            nth_root,
            next_candidate: (1u64 << bit_size) + 1,
            prev_candidate: (1u64 << (bit_size + 1)) + 1 - nth_root,
        })
    }

    /// Returns the next prime scanning upward from 2^bit_size, or
    /// NotEnoughPrimes once the band is exhausted.
    pub fn next_upstream_prime(&mut self) -> Result<u64, Error> {
        let bound: u64 = 1u64 << (self.bit_size + 1);
        while self.next_candidate < bound {
            let candidate: u64 = self.next_candidate;
            self.next_candidate += self.nth_root;
            if is_prime(candidate) {
                return Ok(candidate);
            }
        }
        Err(Error::NotEnoughPrimes { found: 0, count: 1 })
    }

    /// Returns the next prime scanning downward from 2^(bit_size+1), or
    /// NotEnoughPrimes once the band is exhausted.
    pub fn next_downstream_prime(&mut self) -> Result<u64, Error> {
        let bound: u64 = 1u64 << self.bit_size;
        while self.prev_candidate > bound {
            let candidate: u64 = self.prev_candidate;
            self.prev_candidate -= self.nth_root;
            if is_prime(candidate) {
                return Ok(candidate);
            }
        }
        Err(Error::NotEnoughPrimes { found: 0, count: 1 })
    }
}

/// Returns `count` distinct primes `p = 1 mod 2n` of exactly `bit_size`
/// bits, scanning upward from 2^bit_size when `prefer_small` and downward
/// from 2^(bit_size+1) otherwise.
/// Fails with NotEnoughPrimes if the band holds fewer than `count` such
/// primes.
pub fn generate_primes(
    count: usize,
    bit_size: u32,
    prefer_small: bool,
    n: u64,
) -> Result<Vec<u64>, Error> {
    if n < 1 || n & (n - 1) != 0 {
        return Err(Error::InvalidArguments(format!(
            "n = {} is not a power of two >= 1",
            n
        )));
    }
    let mut generator: NttPrimeGenerator = NttPrimeGenerator::new(bit_size, n << 1)?;
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    for _ in 0..count {
        let next = if prefer_small {
            generator.next_upstream_prime()
        } else {
            generator.next_downstream_prime()
        };
        match next {
            Ok(p) => primes.push(p),
            Err(_) => {
                return Err(Error::NotEnoughPrimes {
                    found: primes.len(),
                    count,
                })
            }
        }
    }
    Ok(primes)
}
