use crate::error::Error;
use crate::modulus::prime::Prime;
use rand::Rng;

/// Witnesses proving 64-bit primality deterministically.
const MILLER_RABIN_WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Attempt budget for the random primitive-root search; each random trial
/// succeeds with probability 1/2.
const PRIMITIVE_ROOT_ATTEMPTS: usize = 256;

#[inline(always)]
fn mul_mod_u64(x: u64, y: u64, n: u64) -> u64 {
    (x as u128 * y as u128 % n as u128) as u64
}

fn pow_mod_u64(base: u64, exp: u64, n: u64) -> u64 {
    let mut y: u64 = 1;
    let mut b: u64 = base % n;
    let mut e: u64 = exp;
    while e > 0 {
        if e & 1 == 1 {
            y = mul_mod_u64(y, b, n);
        }
        b = mul_mod_u64(b, b, n);
        e >>= 1;
    }
    y
}

/// Returns whether n is prime, by Miller-Rabin with a witness set that is
/// deterministic for all 64-bit inputs.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &MILLER_RABIN_WITNESSES {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }
    let s: u32 = (n - 1).trailing_zeros();
    let d: u64 = (n - 1) >> s;
    'witness: for &a in &MILLER_RABIN_WITNESSES {
        let mut x: u64 = pow_mod_u64(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod_u64(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn check_degree(degree: u64) -> Result<(), Error> {
    if degree < 2 || degree & (degree - 1) != 0 {
        return Err(Error::InvalidArguments(format!(
            "degree = {} is not a power of two >= 2",
            degree
        )));
    }
    Ok(())
}

impl Prime<u64> {
    /// Returns whether root is a primitive degree-th root of unity mod q,
    /// i.e. root^(degree/2) = -1 mod q.
    /// Fails if degree is not a power of two >= 2.
    pub fn is_primitive_root(&self, root: u64, degree: u64) -> Result<bool, Error> {
        check_degree(degree)?;
        Ok(root != 0 && self.pow(root, degree >> 1) == self.q - 1)
    }

    /// Returns a primitive degree-th root of unity mod q by random trial of
    /// x^((q-1)/degree).
    /// Fails if degree is not a power of two >= 2.
    pub fn generate_primitive_root(&self, degree: u64) -> Result<u64, Error> {
        check_degree(degree)?;
        if (self.q - 1) % degree != 0 {
            return Err(Error::NoPrimitiveRoot {
                degree,
                modulus: self.q,
            });
        }
        let exp: u64 = (self.q - 1) / degree;
        let mut rng = rand::thread_rng();
        for _ in 0..PRIMITIVE_ROOT_ATTEMPTS {
            let candidate: u64 = self.pow(rng.gen_range(1..self.q), exp);
            if self.is_primitive_root(candidate, degree)? {
                return Ok(candidate);
            }
        }
        Err(Error::NoPrimitiveRoot {
            degree,
            modulus: self.q,
        })
    }

    /// Returns the smallest primitive degree-th root of unity mod q.
    ///
    /// The primitive degree-th roots are exactly the odd powers of any one
    /// of them; all degree/2 of them are scanned.
    pub fn minimal_primitive_root(&self, degree: u64) -> Result<u64, Error> {
        let root: u64 = self.generate_primitive_root(degree)?;
        let root_sq: u64 = self.mul(root, root);
        let mut candidate: u64 = root;
        let mut min: u64 = root;
        for _ in 0..(degree >> 1) {
            candidate = self.mul(candidate, root_sq);
            if candidate < min {
                min = candidate;
            }
        }
        Ok(min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prime_against_sieve() {
        const LIMIT: usize = 1 << 20;
        let mut composite = vec![false; LIMIT];
        for i in 2..LIMIT {
            if !composite[i] {
                let mut j: usize = i * i;
                while j < LIMIT {
                    composite[j] = true;
                    j += i;
                }
            }
        }
        for n in 0..LIMIT {
            assert_eq!(
                is_prime(n as u64),
                n >= 2 && !composite[n],
                "disagreement at n = {}",
                n
            );
        }
    }

    #[test]
    fn test_is_prime_large() {
        assert!(is_prime(0x1fffffffffe00001));
        assert!(is_prime(0xffffee001));
        assert!(is_prime(1_000_000_007));
        assert!(!is_prime(0x1fffffffffe00001 - 2));
        assert!(!is_prime(u64::MAX));
        // Carmichael number 561 = 3 * 11 * 17.
        assert!(!is_prime(561));
    }

    #[test]
    fn test_primitive_root_small() {
        let prime: Prime<u64> = Prime::<u64>::new(17).unwrap();
        assert!(prime.is_primitive_root(3, 16).unwrap());
        assert!(!prime.is_primitive_root(2, 16).unwrap());
        assert!(!prime.is_primitive_root(0, 16).unwrap());
        assert_eq!(prime.minimal_primitive_root(16).unwrap(), 3);
        // 16th roots of unity that are primitive mod 17: {3,5,6,7,10,11,12,14}.
        let root: u64 = prime.generate_primitive_root(16).unwrap();
        assert!(prime.is_primitive_root(root, 16).unwrap());
    }

    #[test]
    fn test_invalid_degree() {
        let prime: Prime<u64> = Prime::<u64>::new(17).unwrap();
        assert!(matches!(
            prime.is_primitive_root(3, 12),
            Err(Error::InvalidArguments(_))
        ));
        assert!(matches!(
            prime.is_primitive_root(3, 1),
            Err(Error::InvalidArguments(_))
        ));
        assert!(matches!(
            prime.generate_primitive_root(0),
            Err(Error::InvalidArguments(_))
        ));
        assert!(matches!(
            prime.minimal_primitive_root(24),
            Err(Error::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_primitive_root_large() {
        let q: u64 = 0xffffee001;
        let prime: Prime<u64> = Prime::<u64>::new(q).unwrap();
        let degree: u64 = 2048;
        let root: u64 = prime.minimal_primitive_root(degree).unwrap();
        assert!(prime.is_primitive_root(root, degree).unwrap());
        assert_eq!(prime.pow(root, degree), 1);
        // Minimality: the primitive roots are the odd powers of any one of
        // them; rescan them from an independently generated root.
        let other: u64 = prime.generate_primitive_root(degree).unwrap();
        let other_sq: u64 = prime.mul(other, other);
        let mut candidate: u64 = other;
        let mut min: u64 = other;
        for _ in 0..(degree >> 1) {
            candidate = prime.mul(candidate, other_sq);
            min = min.min(candidate);
        }
        assert_eq!(root, min);
    }

    #[test]
    fn test_no_primitive_root() {
        // 17 - 1 = 16 admits no 32nd roots of unity.
        let prime: Prime<u64> = Prime::<u64>::new(17).unwrap();
        assert!(matches!(
            prime.generate_primitive_root(32),
            Err(Error::NoPrimitiveRoot { .. })
        ));
    }
}
