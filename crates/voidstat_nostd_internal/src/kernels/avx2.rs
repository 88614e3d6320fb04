//! AVX2 counting kernels (256-bit, two-chunk unrolled main loop).
//!
//! Same vector width as the AVX kernels; the gain here comes from
//! keeping two independent distance computations in flight per
//! iteration, which hides the multiply latency on cores with wider
//! execution. The arithmetic itself stays sub/mul/add so the per-lane
//! roundings (and therefore the counts) match every other variant.

use crate::bins::bin_of;
use crate::grid::CellView;
use core::arch::x86_64::*;

/// bin the lanes of `dsq` that passed the radius mask
///
/// Shared epilogue of the loops below; lanes are visited in index order
/// so even weighted sums accumulate exactly like the scalar path. When
/// `weighted` is false the weight arguments are unused dummies.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn apply_lanes_f64(
    dsq: __m256d,
    mask: i32,
    base: usize,
    sq_edges: &[f64],
    counts: &mut [u64],
    weighted: bool,
    cell_weights: &[f64],
    probe_weight: f64,
    weight_sums: &mut [f64],
) {
    let mut lanes = [0.0_f64; 4];
    unsafe { _mm256_storeu_pd(lanes.as_mut_ptr(), dsq) };
    for (lane, &d) in lanes.iter().enumerate() {
        if mask & (1 << lane) != 0 {
            if let Some(b) = bin_of(d, sq_edges) {
                counts[b] += 1;
                if weighted {
                    weight_sums[b] += probe_weight * cell_weights[base + lane];
                }
            }
        }
    }
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn apply_lanes_f32(
    dsq: __m256,
    mask: i32,
    base: usize,
    sq_edges: &[f32],
    counts: &mut [u64],
    weighted: bool,
    cell_weights: &[f32],
    probe_weight: f32,
    weight_sums: &mut [f64],
) {
    let mut lanes = [0.0_f32; 8];
    unsafe { _mm256_storeu_ps(lanes.as_mut_ptr(), dsq) };
    for (lane, &d) in lanes.iter().enumerate() {
        if mask & (1 << lane) != 0 {
            if let Some(b) = bin_of(d, sq_edges) {
                counts[b] += 1;
                if weighted {
                    weight_sums[b] += (probe_weight * cell_weights[base + lane]) as f64;
                }
            }
        }
    }
}

/// the full kernel body, shared between the plain and weighted entry
/// points of both precisions (`$w` is the vector width in lanes)
macro_rules! avx2_body {
    (
        $w:literal, $lanes_ty:ty, $apply:ident,
        $set1:ident, $loadu:ident, $sub:ident, $mul:ident, $add:ident,
        $cmp:ident, $movemask:ident,
        $cell:ident, $probe:ident, $sq_edges:ident, $counts:ident,
        $weighted:literal, $cell_weights:ident, $probe_weight:ident, $weight_sums:ident
    ) => {{
        const W: usize = $w;
        let n = $cell.len();
        let main = n - n % W;
        let unrolled = n - n % (2 * W);
        let px = $set1($probe[0]);
        let py = $set1($probe[1]);
        let pz = $set1($probe[2]);
        let rmax_sq = $set1($sq_edges[$sq_edges.len() - 1]);

        let mut i = 0;
        while i < unrolled {
            let (dsq_a, dsq_b) = unsafe {
                let dx_a = $sub($loadu($cell.x.as_ptr().add(i)), px);
                let dy_a = $sub($loadu($cell.y.as_ptr().add(i)), py);
                let dz_a = $sub($loadu($cell.z.as_ptr().add(i)), pz);
                let dx_b = $sub($loadu($cell.x.as_ptr().add(i + W)), px);
                let dy_b = $sub($loadu($cell.y.as_ptr().add(i + W)), py);
                let dz_b = $sub($loadu($cell.z.as_ptr().add(i + W)), pz);
                (
                    $add($add($mul(dx_a, dx_a), $mul(dy_a, dy_a)), $mul(dz_a, dz_a)),
                    $add($add($mul(dx_b, dx_b), $mul(dy_b, dy_b)), $mul(dz_b, dz_b)),
                )
            };
            let mask_a = $movemask($cmp::<_CMP_LT_OQ>(dsq_a, rmax_sq));
            let mask_b = $movemask($cmp::<_CMP_LT_OQ>(dsq_b, rmax_sq));
            if mask_a != 0 {
                unsafe {
                    $apply(
                        dsq_a,
                        mask_a,
                        i,
                        $sq_edges,
                        $counts,
                        $weighted,
                        $cell_weights,
                        $probe_weight,
                        $weight_sums,
                    )
                };
            }
            if mask_b != 0 {
                unsafe {
                    $apply(
                        dsq_b,
                        mask_b,
                        i + W,
                        $sq_edges,
                        $counts,
                        $weighted,
                        $cell_weights,
                        $probe_weight,
                        $weight_sums,
                    )
                };
            }
            i += 2 * W;
        }

        while i < main {
            let dsq = unsafe {
                let dx = $sub($loadu($cell.x.as_ptr().add(i)), px);
                let dy = $sub($loadu($cell.y.as_ptr().add(i)), py);
                let dz = $sub($loadu($cell.z.as_ptr().add(i)), pz);
                $add($add($mul(dx, dx), $mul(dy, dy)), $mul(dz, dz))
            };
            let mask = $movemask($cmp::<_CMP_LT_OQ>(dsq, rmax_sq));
            if mask != 0 {
                unsafe {
                    $apply(
                        dsq,
                        mask,
                        i,
                        $sq_edges,
                        $counts,
                        $weighted,
                        $cell_weights,
                        $probe_weight,
                        $weight_sums,
                    )
                };
            }
            i += W;
        }

        // scalar remainder tail
        for i in main..n {
            let dx = $cell.x[i] - $probe[0];
            let dy = $cell.y[i] - $probe[1];
            let dz = $cell.z[i] - $probe[2];
            if let Some(b) = bin_of(dx * dx + dy * dy + dz * dz, $sq_edges) {
                $counts[b] += 1;
                if $weighted {
                    $weight_sums[b] += ($probe_weight * $cell_weights[i]) as f64;
                }
            }
        }
    }};
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn count_within_f64(
    cell: CellView<'_, f64>,
    probe: [f64; 3],
    sq_edges: &[f64],
    counts: &mut [u64],
) {
    let cell_weights: &[f64] = &[];
    let probe_weight = 0.0_f64;
    let weight_sums: &mut [f64] = &mut [];
    avx2_body!(
        4, f64, apply_lanes_f64,
        _mm256_set1_pd, _mm256_loadu_pd, _mm256_sub_pd, _mm256_mul_pd, _mm256_add_pd,
        _mm256_cmp_pd, _mm256_movemask_pd,
        cell, probe, sq_edges, counts,
        false, cell_weights, probe_weight, weight_sums
    );
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn count_within_weighted_f64(
    cell: CellView<'_, f64>,
    cell_weights: &[f64],
    probe: [f64; 3],
    probe_weight: f64,
    sq_edges: &[f64],
    counts: &mut [u64],
    weight_sums: &mut [f64],
) {
    avx2_body!(
        4, f64, apply_lanes_f64,
        _mm256_set1_pd, _mm256_loadu_pd, _mm256_sub_pd, _mm256_mul_pd, _mm256_add_pd,
        _mm256_cmp_pd, _mm256_movemask_pd,
        cell, probe, sq_edges, counts,
        true, cell_weights, probe_weight, weight_sums
    );
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn count_within_f32(
    cell: CellView<'_, f32>,
    probe: [f32; 3],
    sq_edges: &[f32],
    counts: &mut [u64],
) {
    let cell_weights: &[f32] = &[];
    let probe_weight = 0.0_f32;
    let weight_sums: &mut [f64] = &mut [];
    avx2_body!(
        8, f32, apply_lanes_f32,
        _mm256_set1_ps, _mm256_loadu_ps, _mm256_sub_ps, _mm256_mul_ps, _mm256_add_ps,
        _mm256_cmp_ps, _mm256_movemask_ps,
        cell, probe, sq_edges, counts,
        false, cell_weights, probe_weight, weight_sums
    );
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn count_within_weighted_f32(
    cell: CellView<'_, f32>,
    cell_weights: &[f32],
    probe: [f32; 3],
    probe_weight: f32,
    sq_edges: &[f32],
    counts: &mut [u64],
    weight_sums: &mut [f64],
) {
    avx2_body!(
        8, f32, apply_lanes_f32,
        _mm256_set1_ps, _mm256_loadu_ps, _mm256_sub_ps, _mm256_mul_ps, _mm256_add_ps,
        _mm256_cmp_ps, _mm256_movemask_ps,
        cell, probe, sq_edges, counts,
        true, cell_weights, probe_weight, weight_sums
    );
}
