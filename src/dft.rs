pub mod ntt;

#[cfg(target_arch = "x86_64")]
pub(crate) mod ntt_avx512;
#[cfg(target_arch = "x86_64")]
pub(crate) mod ntt_ifma;

/// In-place forward/backward transforms between the coefficient and
/// evaluation domains of `Z_q[X]/(X^n + 1)`.
///
/// The non-lazy methods take and return canonical values in `[0, q)`; the
/// lazy variants skip the final normalization sweep and leave outputs in
/// the documented lazy range of the implementation.
pub trait DFT<O> {
    fn forward_inplace(&self, a: &mut [O]);
    fn forward_inplace_lazy(&self, a: &mut [O]);
    fn backward_inplace(&self, a: &mut [O]);
    fn backward_inplace_lazy(&self, a: &mut [O]);
}
