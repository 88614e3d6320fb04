//! AVX counting kernels (256-bit: 4 × f64 / 8 × f32).

use crate::bins::bin_of;
use crate::grid::CellView;
use core::arch::x86_64::*;

#[target_feature(enable = "avx")]
pub(crate) unsafe fn count_within_f64(
    cell: CellView<'_, f64>,
    probe: [f64; 3],
    sq_edges: &[f64],
    counts: &mut [u64],
) {
    const W: usize = 4;
    let n = cell.len();
    let main = n - n % W;
    let px = _mm256_set1_pd(probe[0]);
    let py = _mm256_set1_pd(probe[1]);
    let pz = _mm256_set1_pd(probe[2]);
    let rmax_sq = _mm256_set1_pd(sq_edges[sq_edges.len() - 1]);

    let mut i = 0;
    while i < main {
        let (dx, dy, dz) = unsafe {
            (
                _mm256_sub_pd(_mm256_loadu_pd(cell.x.as_ptr().add(i)), px),
                _mm256_sub_pd(_mm256_loadu_pd(cell.y.as_ptr().add(i)), py),
                _mm256_sub_pd(_mm256_loadu_pd(cell.z.as_ptr().add(i)), pz),
            )
        };
        let dsq = _mm256_add_pd(
            _mm256_add_pd(_mm256_mul_pd(dx, dx), _mm256_mul_pd(dy, dy)),
            _mm256_mul_pd(dz, dz),
        );
        let mask = _mm256_movemask_pd(_mm256_cmp_pd::<_CMP_LT_OQ>(dsq, rmax_sq));
        if mask != 0 {
            let mut lanes = [0.0_f64; W];
            unsafe { _mm256_storeu_pd(lanes.as_mut_ptr(), dsq) };
            for (lane, &d) in lanes.iter().enumerate() {
                if mask & (1 << lane) != 0 {
                    if let Some(b) = bin_of(d, sq_edges) {
                        counts[b] += 1;
                    }
                }
            }
        }
        i += W;
    }

    for i in main..n {
        let dx = cell.x[i] - probe[0];
        let dy = cell.y[i] - probe[1];
        let dz = cell.z[i] - probe[2];
        if let Some(b) = bin_of(dx * dx + dy * dy + dz * dz, sq_edges) {
            counts[b] += 1;
        }
    }
}

#[target_feature(enable = "avx")]
pub(crate) unsafe fn count_within_weighted_f64(
    cell: CellView<'_, f64>,
    cell_weights: &[f64],
    probe: [f64; 3],
    probe_weight: f64,
    sq_edges: &[f64],
    counts: &mut [u64],
    weight_sums: &mut [f64],
) {
    const W: usize = 4;
    let n = cell.len();
    let main = n - n % W;
    let px = _mm256_set1_pd(probe[0]);
    let py = _mm256_set1_pd(probe[1]);
    let pz = _mm256_set1_pd(probe[2]);
    let rmax_sq = _mm256_set1_pd(sq_edges[sq_edges.len() - 1]);

    let mut i = 0;
    while i < main {
        let (dx, dy, dz) = unsafe {
            (
                _mm256_sub_pd(_mm256_loadu_pd(cell.x.as_ptr().add(i)), px),
                _mm256_sub_pd(_mm256_loadu_pd(cell.y.as_ptr().add(i)), py),
                _mm256_sub_pd(_mm256_loadu_pd(cell.z.as_ptr().add(i)), pz),
            )
        };
        let dsq = _mm256_add_pd(
            _mm256_add_pd(_mm256_mul_pd(dx, dx), _mm256_mul_pd(dy, dy)),
            _mm256_mul_pd(dz, dz),
        );
        let mask = _mm256_movemask_pd(_mm256_cmp_pd::<_CMP_LT_OQ>(dsq, rmax_sq));
        if mask != 0 {
            let mut lanes = [0.0_f64; W];
            unsafe { _mm256_storeu_pd(lanes.as_mut_ptr(), dsq) };
            for (lane, &d) in lanes.iter().enumerate() {
                if mask & (1 << lane) != 0 {
                    if let Some(b) = bin_of(d, sq_edges) {
                        counts[b] += 1;
                        weight_sums[b] += probe_weight * cell_weights[i + lane];
                    }
                }
            }
        }
        i += W;
    }

    for i in main..n {
        let dx = cell.x[i] - probe[0];
        let dy = cell.y[i] - probe[1];
        let dz = cell.z[i] - probe[2];
        if let Some(b) = bin_of(dx * dx + dy * dy + dz * dz, sq_edges) {
            counts[b] += 1;
            weight_sums[b] += probe_weight * cell_weights[i];
        }
    }
}

#[target_feature(enable = "avx")]
pub(crate) unsafe fn count_within_f32(
    cell: CellView<'_, f32>,
    probe: [f32; 3],
    sq_edges: &[f32],
    counts: &mut [u64],
) {
    const W: usize = 8;
    let n = cell.len();
    let main = n - n % W;
    let px = _mm256_set1_ps(probe[0]);
    let py = _mm256_set1_ps(probe[1]);
    let pz = _mm256_set1_ps(probe[2]);
    let rmax_sq = _mm256_set1_ps(sq_edges[sq_edges.len() - 1]);

    let mut i = 0;
    while i < main {
        let (dx, dy, dz) = unsafe {
            (
                _mm256_sub_ps(_mm256_loadu_ps(cell.x.as_ptr().add(i)), px),
                _mm256_sub_ps(_mm256_loadu_ps(cell.y.as_ptr().add(i)), py),
                _mm256_sub_ps(_mm256_loadu_ps(cell.z.as_ptr().add(i)), pz),
            )
        };
        let dsq = _mm256_add_ps(
            _mm256_add_ps(_mm256_mul_ps(dx, dx), _mm256_mul_ps(dy, dy)),
            _mm256_mul_ps(dz, dz),
        );
        let mask = _mm256_movemask_ps(_mm256_cmp_ps::<_CMP_LT_OQ>(dsq, rmax_sq));
        if mask != 0 {
            let mut lanes = [0.0_f32; W];
            unsafe { _mm256_storeu_ps(lanes.as_mut_ptr(), dsq) };
            for (lane, &d) in lanes.iter().enumerate() {
                if mask & (1 << lane) != 0 {
                    if let Some(b) = bin_of(d, sq_edges) {
                        counts[b] += 1;
                    }
                }
            }
        }
        i += W;
    }

    for i in main..n {
        let dx = cell.x[i] - probe[0];
        let dy = cell.y[i] - probe[1];
        let dz = cell.z[i] - probe[2];
        if let Some(b) = bin_of(dx * dx + dy * dy + dz * dz, sq_edges) {
            counts[b] += 1;
        }
    }
}

#[target_feature(enable = "avx")]
pub(crate) unsafe fn count_within_weighted_f32(
    cell: CellView<'_, f32>,
    cell_weights: &[f32],
    probe: [f32; 3],
    probe_weight: f32,
    sq_edges: &[f32],
    counts: &mut [u64],
    weight_sums: &mut [f64],
) {
    const W: usize = 8;
    let n = cell.len();
    let main = n - n % W;
    let px = _mm256_set1_ps(probe[0]);
    let py = _mm256_set1_ps(probe[1]);
    let pz = _mm256_set1_ps(probe[2]);
    let rmax_sq = _mm256_set1_ps(sq_edges[sq_edges.len() - 1]);

    let mut i = 0;
    while i < main {
        let (dx, dy, dz) = unsafe {
            (
                _mm256_sub_ps(_mm256_loadu_ps(cell.x.as_ptr().add(i)), px),
                _mm256_sub_ps(_mm256_loadu_ps(cell.y.as_ptr().add(i)), py),
                _mm256_sub_ps(_mm256_loadu_ps(cell.z.as_ptr().add(i)), pz),
            )
        };
        let dsq = _mm256_add_ps(
            _mm256_add_ps(_mm256_mul_ps(dx, dx), _mm256_mul_ps(dy, dy)),
            _mm256_mul_ps(dz, dz),
        );
        let mask = _mm256_movemask_ps(_mm256_cmp_ps::<_CMP_LT_OQ>(dsq, rmax_sq));
        if mask != 0 {
            let mut lanes = [0.0_f32; W];
            unsafe { _mm256_storeu_ps(lanes.as_mut_ptr(), dsq) };
            for (lane, &d) in lanes.iter().enumerate() {
                if mask & (1 << lane) != 0 {
                    if let Some(b) = bin_of(d, sq_edges) {
                        counts[b] += 1;
                        weight_sums[b] += (probe_weight * cell_weights[i + lane]) as f64;
                    }
                }
            }
        }
        i += W;
    }

    for i in main..n {
        let dx = cell.x[i] - probe[0];
        let dy = cell.y[i] - probe[1];
        let dz = cell.z[i] - probe[2];
        if let Some(b) = bin_of(dx * dx + dy * dy + dz * dz, sq_edges) {
            counts[b] += 1;
            weight_sums[b] += (probe_weight * cell_weights[i]) as f64;
        }
    }
}
