use crate::modulus::barrett::{Barrett, BarrettPrecomp};
use crate::modulus::{div_u128_u64_lo, max_word, mul_u64_hi, ReduceOnce};
use crate::modulus::{BARRETT, BARRETTLAZY, NONE, ONCE, REDUCEMOD, THRICE, TWICE};

use num_bigint::BigUint;
use num_traits::cast::ToPrimitive;

impl BarrettPrecomp<u64> {
    /// Returns a new instance of BarrettPrecomp<u64>.
    /// Requires 1 < q < 2^62.
    pub fn new(q: u64) -> BarrettPrecomp<u64> {
        debug_assert!(q > 1 && q < (1u64 << 62), "invalid modulus q = {}", q);
        let big_r: BigUint =
            (BigUint::from(1usize) << ((u64::BITS << 1) as usize)) / BigUint::from(q);
        let lo: u64 = (&big_r & BigUint::from(u64::MAX)).to_u64().unwrap();
        let hi: u64 = (big_r >> u64::BITS).to_u64().unwrap();
        let mut precomp: BarrettPrecomp<u64> = Self {
            q,
            two_q: q << 1,
            four_q: q << 2,
            lo,
            hi,
            one: Barrett(0, 0),
        };
        precomp.one = precomp.prepare::<64>(1);
        precomp
    }

    /// Applies a modular reduction on x based on REDUCE:
    /// - NONE: no reduction, x already in [0, q).
    /// - ONCE: subtracts q if x >= q; x must be in [0, 2q).
    /// - TWICE: subtracts 2q then q conditionally; x must be in [0, 4q).
    /// - THRICE: subtracts 4q, 2q then q conditionally; x must be in [0, 8q).
    /// - BARRETT: maps any x to x mod q.
    /// - BARRETTLAZY: maps any x into [0, 2q) congruent to x mod q.
    #[inline(always)]
    pub fn reduce_assign<const REDUCE: REDUCEMOD>(&self, x: &mut u64) {
        match REDUCE {
            NONE => {}
            ONCE => x.reduce_once_assign(self.q),
            TWICE => {
                x.reduce_once_assign(self.two_q);
                x.reduce_once_assign(self.q);
            }
            THRICE => {
                x.reduce_once_assign(self.four_q);
                x.reduce_once_assign(self.two_q);
                x.reduce_once_assign(self.q);
            }
            BARRETT => {
                let t: u64 = mul_u64_hi::<64>(*x, self.hi);
                *x = x.wrapping_sub(t.wrapping_mul(self.q));
                x.reduce_once_assign(self.q);
            }
            BARRETTLAZY => {
                let t: u64 = mul_u64_hi::<64>(*x, self.hi);
                *x = x.wrapping_sub(t.wrapping_mul(self.q));
            }
            _ => unreachable!("invalid REDUCE argument"),
        }
        debug_assert!(
            REDUCE == NONE || REDUCE == BARRETTLAZY || *x < self.q,
            "reduction left {} >= q = {}",
            x,
            self.q
        );
    }

    #[inline(always)]
    pub fn reduce<const REDUCE: REDUCEMOD>(&self, x: u64) -> u64 {
        let mut r: u64 = x;
        self.reduce_assign::<REDUCE>(&mut r);
        r
    }

    /// Returns x mod q for a full 128-bit x.
    /// Requires x < q * 2^64.
    #[inline(always)]
    pub fn reduce_u128(&self, x: u128) -> u64 {
        let xl: u64 = x as u64;
        let xh: u64 = (x >> 64) as u64;
        debug_assert!(xh < self.q, "x = {} >= q * 2^64", x);
        // Quotient estimate floor(x * floor(2^128/q) / 2^128), off by at
        // most 2 from floor(x/q).
        let mid: u128 = xh as u128 * self.lo as u128
            + ((xl as u128 * self.lo as u128) >> 64)
            + xl as u128 * self.hi as u128;
        let t: u128 = xh as u128 * self.hi as u128 + (mid >> 64);
        let mut r: u64 = x.wrapping_sub(t.wrapping_mul(self.q as u128)) as u64;
        self.reduce_assign::<TWICE>(&mut r);
        r
    }

    /// Returns (operand, floor((operand << S) / q)) for S in {32, 52, 64}.
    /// Requires operand <= q.
    #[inline(always)]
    pub fn prepare<const S: u8>(&self, operand: u64) -> Barrett<u64> {
        debug_assert!(
            operand <= self.q,
            "operand {} exceeds modulus {}",
            operand,
            self.q
        );
        debug_assert!(S == 32 || S == 52 || S == 64, "unsupported shift {}", S);
        let op_hi: u64 = operand >> (64 - S as u32);
        let op_lo: u64 = if S == 64 { 0 } else { operand << S };
        Barrett(operand, div_u128_u64_lo(op_hi, op_lo, self.q))
    }

    /// Returns a value congruent to x * y mod q in [0, 2q), given the
    /// quotient floor((y << S) / q).
    /// Requires y < q, and for S < 64 both x and q at most S bits.
    #[inline(always)]
    pub fn mul_lazy<const S: u8>(&self, x: u64, y: u64, y_quotient: u64) -> u64 {
        debug_assert!(y < self.q, "y = {} >= q = {}", y, self.q);
        debug_assert!(x <= max_word(S as u32), "x = {} exceeds {} bits", x, S);
        debug_assert!(
            self.q <= max_word(S as u32),
            "q = {} exceeds {} bits",
            self.q,
            S
        );
        let t: u64 = mul_u64_hi::<S>(x, y_quotient);
        let r: u64 = x.wrapping_mul(y).wrapping_sub(t.wrapping_mul(self.q));
        debug_assert!(r < self.two_q, "lazy product {} >= 2q = {}", r, self.two_q);
        r
    }

    /// Returns lhs.value() * rhs mod q, reduced according to REDUCE
    /// (ONCE for a canonical result, NONE to keep the lazy [0, 2q) range).
    #[inline(always)]
    pub fn mul_external<const REDUCE: REDUCEMOD>(&self, lhs: Barrett<u64>, rhs: u64) -> u64 {
        let mut r: u64 = rhs;
        self.mul_external_assign::<REDUCE>(lhs, &mut r);
        r
    }

    /// Assigns lhs.value() * rhs mod q to rhs.
    #[inline(always)]
    pub fn mul_external_assign<const REDUCE: REDUCEMOD>(&self, lhs: Barrett<u64>, rhs: &mut u64) {
        *rhs = self.mul_lazy::<64>(*rhs, lhs.0, lhs.1);
        self.reduce_assign::<REDUCE>(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_reduce_tags() {
        let q: u64 = 0xffffee001;
        let bp: BarrettPrecomp<u64> = BarrettPrecomp::new(q);
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let x: u64 = rng.gen_range(0..q);
            assert_eq!(bp.reduce::<NONE>(x), x);
            let x2: u64 = rng.gen_range(0..2 * q);
            assert_eq!(bp.reduce::<ONCE>(x2), x2 % q);
            let x4: u64 = rng.gen_range(0..4 * q);
            assert_eq!(bp.reduce::<TWICE>(x4), x4 % q);
            let x8: u64 = rng.gen_range(0..8 * q);
            assert_eq!(bp.reduce::<THRICE>(x8), x8 % q);
            let any: u64 = rng.gen();
            assert_eq!(bp.reduce::<BARRETT>(any), any % q);
            let lazy: u64 = bp.reduce::<BARRETTLAZY>(any);
            assert!(lazy < 2 * q);
            assert_eq!(lazy % q, any % q);
        }
    }

    #[test]
    fn test_reduce_u128() {
        let q: u64 = 0x1fffffffffe00001;
        let bp: BarrettPrecomp<u64> = BarrettPrecomp::new(q);
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let x: u64 = rng.gen_range(0..q);
            let y: u64 = rng.gen_range(0..q);
            let prod: u128 = x as u128 * y as u128;
            assert_eq!(bp.reduce_u128(prod), (prod % q as u128) as u64);
        }
        assert_eq!(bp.reduce_u128(0), 0);
        assert_eq!(
            bp.reduce_u128((q - 1) as u128 * (q - 1) as u128),
            ((q - 1) as u128 * (q - 1) as u128 % q as u128) as u64
        );
    }

    #[test]
    fn test_prepare_exact() {
        let q: u64 = 0xffffee001;
        let bp: BarrettPrecomp<u64> = BarrettPrecomp::new(q);
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let v: u64 = rng.gen_range(0..q);
            assert_eq!(
                *bp.prepare::<64>(v).quotient() as u128,
                ((v as u128) << 64) / q as u128
            );
            assert_eq!(
                *bp.prepare::<52>(v).quotient() as u128,
                ((v as u128) << 52) / q as u128
            );
            assert_eq!(
                *bp.prepare::<32>(v).quotient() as u128,
                ((v as u128) << 32) / q as u128
            );
        }
        assert_eq!(*bp.one().quotient() as u128, (1u128 << 64) / q as u128);
    }

    #[test]
    fn test_mul_lazy_congruence_and_range() {
        let mut rng = rand::thread_rng();

        let q64: u64 = 0x1fffffffffe00001;
        let bp64: BarrettPrecomp<u64> = BarrettPrecomp::new(q64);
        for _ in 0..1000 {
            let x: u64 = rng.gen_range(0..q64);
            let y: u64 = rng.gen_range(0..q64);
            let w: Barrett<u64> = bp64.prepare::<64>(y);
            let r: u64 = bp64.mul_lazy::<64>(x, *w.value(), *w.quotient());
            assert!(r < 2 * q64);
            assert_eq!(
                r as u128 % q64 as u128,
                x as u128 * y as u128 % q64 as u128
            );
        }

        let q52: u64 = 0xffffee001;
        let bp52: BarrettPrecomp<u64> = BarrettPrecomp::new(q52);
        for _ in 0..1000 {
            let x: u64 = rng.gen_range(0..q52);
            let y: u64 = rng.gen_range(0..q52);
            let w: Barrett<u64> = bp52.prepare::<52>(y);
            let r: u64 = bp52.mul_lazy::<52>(x, *w.value(), *w.quotient());
            assert!(r < 2 * q52);
            assert_eq!(
                r as u128 % q52 as u128,
                x as u128 * y as u128 % q52 as u128
            );
        }
    }

    #[test]
    fn test_mul_external() {
        let q: u64 = 0x1fffffffffe00001;
        let bp: BarrettPrecomp<u64> = BarrettPrecomp::new(q);
        let x: u64 = 0x5f876e514845cc8b % q;
        let y: u64 = 0xad726f98f24a761a % q;
        let w: Barrett<u64> = bp.prepare::<64>(y);
        assert_eq!(
            bp.mul_external::<ONCE>(w, x),
            (x as u128 * y as u128 % q as u128) as u64
        );
    }
}
