//! The per-instruction-set counting kernels and the handle that selects
//! among them.
//!
//! Every kernel answers the same question: given one cell's points and a
//! probe location, how many points fall into each squared-separation bin
//! (optionally also accumulating a per-pair weight). The vectorized
//! variants process points in SIMD-width chunks with a scalar remainder
//! tail, and every variant must make *identical* in/out decisions and
//! bin assignments for identical inputs: the squared separations are
//! computed with plain multiplies and adds (no fused contractions, which
//! round differently lane-by-lane), and lanes that pass the radius mask
//! are binned by the same scalar lookup the fallback uses. Only weighted
//! sums are allowed to differ in floating summation order, and in
//! practice even those accumulate in index order here.
//!
//! The kernels mutate caller-supplied counters in place and never
//! allocate.

pub(crate) mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx;
#[cfg(target_arch = "x86_64")]
pub(crate) mod avx2;
#[cfg(all(target_arch = "x86_64", feature = "avx512"))]
pub(crate) mod avx512;
#[cfg(target_arch = "x86_64")]
pub(crate) mod sse42;

use crate::coord::Coordinate;
use crate::grid::CellView;
use core::marker::PhantomData;

/// The compiled-in kernel implementations, tagged by the instruction set
/// they require.
///
/// `Fallback` is always present; the x86-64 tiers exist only on that
/// architecture (and `Avx512` only when its kernels are compiled in).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KernelVariant {
    Fallback,
    #[cfg(target_arch = "x86_64")]
    Sse42,
    #[cfg(target_arch = "x86_64")]
    Avx,
    #[cfg(target_arch = "x86_64")]
    Avx2,
    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    Avx512,
}

/// A resolved counting kernel for one element type.
///
/// This is a plain tag plus a dispatch `match`; it is `Copy` and costs
/// nothing to hold. Construction is the safety boundary: a handle
/// wrapping a vectorized variant promises the running CPU supports that
/// variant's instruction set.
#[derive(Clone, Copy)]
pub struct Kernel<T> {
    variant: KernelVariant,
    marker: PhantomData<T>,
}

impl<T: Coordinate> Kernel<T> {
    /// the always-available scalar kernel
    pub fn fallback() -> Kernel<T> {
        Kernel {
            variant: KernelVariant::Fallback,
            marker: PhantomData,
        }
    }

    /// wrap a specific variant
    ///
    /// # Safety
    /// The caller must guarantee that the running CPU supports the
    /// instruction set `variant` is compiled against. The dispatcher in
    /// the public crate is the intended caller; it checks the detected
    /// capability first.
    pub unsafe fn with_variant_unchecked(variant: KernelVariant) -> Kernel<T> {
        Kernel {
            variant,
            marker: PhantomData,
        }
    }

    pub fn variant(&self) -> KernelVariant {
        self.variant
    }

    /// every compiled-in variant, ordered best first; the fallback is
    /// always the last entry
    pub fn compiled_variants() -> &'static [KernelVariant] {
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        {
            &[
                KernelVariant::Avx512,
                KernelVariant::Avx2,
                KernelVariant::Avx,
                KernelVariant::Sse42,
                KernelVariant::Fallback,
            ]
        }
        #[cfg(all(target_arch = "x86_64", not(feature = "avx512")))]
        {
            &[
                KernelVariant::Avx2,
                KernelVariant::Avx,
                KernelVariant::Sse42,
                KernelVariant::Fallback,
            ]
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            &[KernelVariant::Fallback]
        }
    }

    /// Count the cell's points into squared-separation bins.
    ///
    /// `counts[b]` is incremented for every point whose squared
    /// separation from `probe` lands in bin `b` of `sq_edges`.
    pub fn count_within(
        &self,
        cell: CellView<'_, T>,
        probe: [T; 3],
        sq_edges: &[T],
        counts: &mut [u64],
    ) -> Result<(), &'static str> {
        if sq_edges.len() < 2 {
            return Err("a counting kernel needs at least two bin edges");
        }
        if counts.len() < sq_edges.len() - 1 {
            return Err("the count buffer is smaller than the number of bins");
        }

        match self.variant {
            KernelVariant::Fallback => scalar::count_within(cell, probe, sq_edges, counts),
            #[cfg(target_arch = "x86_64")]
            KernelVariant::Sse42 => unsafe {
                T::count_within_sse42(cell, probe, sq_edges, counts)
            },
            #[cfg(target_arch = "x86_64")]
            KernelVariant::Avx => unsafe { T::count_within_avx(cell, probe, sq_edges, counts) },
            #[cfg(target_arch = "x86_64")]
            KernelVariant::Avx2 => unsafe { T::count_within_avx2(cell, probe, sq_edges, counts) },
            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            KernelVariant::Avx512 => unsafe {
                T::count_within_avx512(cell, probe, sq_edges, counts)
            },
        }
        Ok(())
    }

    /// Like [`Self::count_within`], additionally accumulating the
    /// product of `probe_weight` and each in-range point's weight into
    /// `weight_sums[b]`.
    pub fn count_within_weighted(
        &self,
        cell: CellView<'_, T>,
        cell_weights: &[T],
        probe: [T; 3],
        probe_weight: T,
        sq_edges: &[T],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) -> Result<(), &'static str> {
        if sq_edges.len() < 2 {
            return Err("a counting kernel needs at least two bin edges");
        }
        if counts.len() < sq_edges.len() - 1 {
            return Err("the count buffer is smaller than the number of bins");
        }
        if weight_sums.len() < sq_edges.len() - 1 {
            return Err("the weight-sum buffer is smaller than the number of bins");
        }
        if cell_weights.len() != cell.len() {
            return Err("the cell's weights and coordinates disagree in length");
        }

        match self.variant {
            KernelVariant::Fallback => scalar::count_within_weighted(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            ),
            #[cfg(target_arch = "x86_64")]
            KernelVariant::Sse42 => unsafe {
                T::count_within_weighted_sse42(
                    cell,
                    cell_weights,
                    probe,
                    probe_weight,
                    sq_edges,
                    counts,
                    weight_sums,
                )
            },
            #[cfg(target_arch = "x86_64")]
            KernelVariant::Avx => unsafe {
                T::count_within_weighted_avx(
                    cell,
                    cell_weights,
                    probe,
                    probe_weight,
                    sq_edges,
                    counts,
                    weight_sums,
                )
            },
            #[cfg(target_arch = "x86_64")]
            KernelVariant::Avx2 => unsafe {
                T::count_within_weighted_avx2(
                    cell,
                    cell_weights,
                    probe,
                    probe_weight,
                    sq_edges,
                    counts,
                    weight_sums,
                )
            },
            #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
            KernelVariant::Avx512 => unsafe {
                T::count_within_weighted_avx512(
                    cell,
                    cell_weights,
                    probe,
                    probe_weight,
                    sq_edges,
                    counts,
                    weight_sums,
                )
            },
        }
        Ok(())
    }
}
