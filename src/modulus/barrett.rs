/// An operand together with its precomputed Barrett quotient
/// `floor((operand << S) / q)`, enabling division-free modular
/// multiplication by the operand.
///
/// The shift S is fixed when the pair is built by
/// [`BarrettPrecomp::prepare`](crate::modulus::barrett::BarrettPrecomp);
/// callers route each pair to the kernel expecting that shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Barrett<O>(pub(crate) O, pub(crate) O);

impl<O> Barrett<O> {
    #[inline(always)]
    pub fn value(&self) -> &O {
        &self.0
    }

    #[inline(always)]
    pub fn quotient(&self) -> &O {
        &self.1
    }
}

/// Per-modulus Barrett state: q, its small multiples, and the two words of
/// `floor(2^128 / q)` used for 64-bit and 128-bit reductions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrettPrecomp<O> {
    pub(crate) q: O,
    pub(crate) two_q: O,
    pub(crate) four_q: O,
    pub(crate) lo: O,
    pub(crate) hi: O,
    pub(crate) one: Barrett<O>,
}

impl<O> BarrettPrecomp<O> {
    #[inline(always)]
    pub fn q(&self) -> &O {
        &self.q
    }

    #[inline(always)]
    pub fn two_q(&self) -> &O {
        &self.two_q
    }

    #[inline(always)]
    pub fn four_q(&self) -> &O {
        &self.four_q
    }

    /// Returns the prepared pair for the operand 1, whose quotient is
    /// `floor(2^64 / q)`.
    #[inline(always)]
    pub fn one(&self) -> &Barrett<O> {
        &self.one
    }
}
