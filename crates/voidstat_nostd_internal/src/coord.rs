//! The numeric-precision seam of the crate.
//!
//! A whole counting call runs at one fixed precision. Rather than
//! duplicating the grid/driver source per floating-point type, everything
//! is generic over [`Coordinate`] and the two instantiations (`f32`,
//! `f64`) are provided here. The trait also carries the hooks that route
//! a generic caller to the concrete per-instruction-set kernel for its
//! element type (SIMD intrinsics cannot be written generically, so each
//! precision supplies its own).

#[cfg(target_arch = "x86_64")]
use crate::grid::CellView;

/// The two floating-point precisions a counting call can run at.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    /// stable index for per-precision tables (e.g. the kernel cache)
    pub fn index(self) -> usize {
        match self {
            Precision::Single => 0,
            Precision::Double => 1,
        }
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// A floating-point element type that points, probes, and bin edges can
/// be expressed in.
///
/// This trait is sealed: the counting kernels exist only for `f32` and
/// `f64`, and a foreign implementation could not supply them.
///
/// # Safety of the kernel hooks
/// The `count_within_*` methods compile against a specific instruction
/// set via `#[target_feature]`. Calling one on hardware that lacks the
/// instruction set is undefined behavior; they are only ever reached
/// through a [`Kernel`](crate::Kernel) handle whose constructor contract
/// guarantees hardware support.
pub trait Coordinate:
    private::Sealed
    + Copy
    + PartialOrd
    + core::ops::Add<Output = Self>
    + core::ops::Sub<Output = Self>
    + core::ops::Mul<Output = Self>
    + core::fmt::Debug
    + 'static
{
    const PRECISION: Precision;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_sse42(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    );

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_sse42(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    );

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_avx(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    );

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_avx(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    );

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_avx2(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    );

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_avx2(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    );

    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    unsafe fn count_within_avx512(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    );

    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    unsafe fn count_within_weighted_avx512(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    );
}

impl Coordinate for f64 {
    const PRECISION: Precision = Precision::Double;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_sse42(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    ) {
        unsafe { crate::kernels::sse42::count_within_f64(cell, probe, sq_edges, counts) }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_sse42(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) {
        unsafe {
            crate::kernels::sse42::count_within_weighted_f64(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            )
        }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_avx(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    ) {
        unsafe { crate::kernels::avx::count_within_f64(cell, probe, sq_edges, counts) }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_avx(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) {
        unsafe {
            crate::kernels::avx::count_within_weighted_f64(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            )
        }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_avx2(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    ) {
        unsafe { crate::kernels::avx2::count_within_f64(cell, probe, sq_edges, counts) }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_avx2(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) {
        unsafe {
            crate::kernels::avx2::count_within_weighted_f64(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            )
        }
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    unsafe fn count_within_avx512(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    ) {
        unsafe { crate::kernels::avx512::count_within_f64(cell, probe, sq_edges, counts) }
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    unsafe fn count_within_weighted_avx512(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) {
        unsafe {
            crate::kernels::avx512::count_within_weighted_f64(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            )
        }
    }
}

impl Coordinate for f32 {
    const PRECISION: Precision = Precision::Single;

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_sse42(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    ) {
        unsafe { crate::kernels::sse42::count_within_f32(cell, probe, sq_edges, counts) }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_sse42(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) {
        unsafe {
            crate::kernels::sse42::count_within_weighted_f32(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            )
        }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_avx(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    ) {
        unsafe { crate::kernels::avx::count_within_f32(cell, probe, sq_edges, counts) }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_avx(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) {
        unsafe {
            crate::kernels::avx::count_within_weighted_f32(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            )
        }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_avx2(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    ) {
        unsafe { crate::kernels::avx2::count_within_f32(cell, probe, sq_edges, counts) }
    }

    #[cfg(target_arch = "x86_64")]
    unsafe fn count_within_weighted_avx2(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) {
        unsafe {
            crate::kernels::avx2::count_within_weighted_f32(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            )
        }
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    unsafe fn count_within_avx512(
        cell: CellView<'_, Self>,
        probe: [Self; 3],
        sq_edges: &[Self],
        counts: &mut [u64],
    ) {
        unsafe { crate::kernels::avx512::count_within_f32(cell, probe, sq_edges, counts) }
    }

    #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
    unsafe fn count_within_weighted_avx512(
        cell: CellView<'_, Self>,
        cell_weights: &[Self],
        probe: [Self; 3],
        probe_weight: Self,
        sq_edges: &[Self],
        counts: &mut [u64],
        weight_sums: &mut [f64],
    ) {
        unsafe {
            crate::kernels::avx512::count_within_weighted_f32(
                cell,
                cell_weights,
                probe,
                probe_weight,
                sq_edges,
                counts,
                weight_sums,
            )
        }
    }
}
