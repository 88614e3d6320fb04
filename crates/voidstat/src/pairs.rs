//! The pair-counting driver.
//!
//! The structural twin of the sphere sampler: the same
//! validate → domain → mesh → kernel pipeline, but the "probes" are the
//! points themselves. Every point is played against each of its home
//! cell's walked neighbor cells, and each pair within range lands in
//! the separation bin of its squared distance.
//!
//! Two behaviors worth knowing about, both inherited from the classic
//! formulation of these counters:
//! - pairs are double-counted (the pair (a, b) is seen from a's side
//!   and again from b's);
//! - a point pairs with itself at zero separation, so with a lowest bin
//!   edge of exactly 0.0 the first bin picks up one self-pair per point.
//!   Start the edges above zero to exclude them.

use crate::cancel::CancelToken;
use crate::config::Options;
use crate::dispatch::{self, KernelCache};
use crate::error::Error;
use crate::misc::{build_grid, prepare_domain};
use crate::progress::Progress;
use std::time::{Duration, Instant};
use voidstat_nostd_internal::{Coordinate, NeighborWalk, SquaredBinEdges};

/// Per-separation-bin pair totals.
#[derive(Clone, Debug)]
pub struct PairCountResult {
    /// the radius bin edges the call was made with
    pub bin_edges: Vec<f64>,
    /// `npairs[b]` pairs had a separation in `[bin_edges[b], bin_edges[b + 1])`
    pub npairs: Vec<u64>,
    /// per-bin sums of the pair weight products, when weights were given
    pub weighted: Option<Vec<f64>>,
    /// wall-clock duration of the call, when the timing option was set
    pub elapsed: Option<Duration>,
}

/// Count point pairs by separation.
///
/// `bin_edges` are radii (not squared), strictly increasing and
/// non-negative; the outermost edge doubles as the search radius that
/// sizes the mesh. `weights`, when given, must run parallel to the
/// coordinates, and each in-range pair contributes the product of its
/// two weights to the weighted sums. `cancel` is polled once per home
/// cell; `progress` sees one tick per home cell when the verbose option
/// is on.
pub fn count_pairs<T: Coordinate>(
    x: &[T],
    y: &[T],
    z: &[T],
    weights: Option<&[T]>,
    bin_edges: &[f64],
    options: &Options,
    cache: &mut KernelCache,
    cancel: &CancelToken,
    progress: &mut dyn Progress,
) -> Result<PairCountResult, Error> {
    let timer = options.timing.then(Instant::now);

    let edges = SquaredBinEdges::<T>::from_radius_edges(bin_edges).map_err(Error::validation)?;
    let rmax = edges.rmax();
    if weights.is_some_and(|w| w.len() != x.len()) {
        return Err(Error::validation(
            "weights must have the same length as the coordinates",
        ));
    }

    let bbox = prepare_domain(x, y, z, options, rmax)?;
    let grid = build_grid(x, y, z, weights, &bbox, rmax, options)?;
    let kernel = dispatch::resolve::<T>(cache, options.isa)?;

    let n_bins = edges.n_bins();
    let mut npairs = vec![0_u64; n_bins];
    let mut weight_sums = weights.map(|_| vec![0.0_f64; n_bins]);

    let extent = bbox.extent();
    let dims = grid.dims();
    let refine = options.normalized_refine();
    let n_cells = grid.n_cells();

    if options.verbose {
        progress.start(n_cells as u64);
    }

    for flat in 0..n_cells {
        if cancel.is_cancelled() {
            return Err(Error::interrupted());
        }

        let home_cell = grid.cell(flat);
        if home_cell.is_empty() {
            if options.verbose {
                progress.advance(flat as u64 + 1);
            }
            continue;
        }
        let home = grid.unflatten(flat);

        for nb in NeighborWalk::new(home, refine, dims, options.periodic) {
            let other = grid.cell(nb.flat);
            if other.is_empty() {
                continue;
            }
            let shift = [
                nb.wrap[0] as f64 * extent[0],
                nb.wrap[1] as f64 * extent[1],
                nb.wrap[2] as f64 * extent[2],
            ];

            for a in 0..home_cell.len() {
                let probe = [
                    T::from_f64(home_cell.x[a].to_f64() + shift[0]),
                    T::from_f64(home_cell.y[a].to_f64() + shift[1]),
                    T::from_f64(home_cell.z[a].to_f64() + shift[2]),
                ];
                if let (Some(sums), Some(home_w), Some(other_w)) = (
                    weight_sums.as_mut(),
                    grid.cell_weights(flat),
                    grid.cell_weights(nb.flat),
                ) {
                    kernel
                        .count_within_weighted(
                            other,
                            other_w,
                            probe,
                            home_w[a],
                            edges.as_slice(),
                            &mut npairs,
                            sums,
                        )
                        .map_err(Error::internal)?;
                } else {
                    kernel
                        .count_within(other, probe, edges.as_slice(), &mut npairs)
                        .map_err(Error::internal)?;
                }
            }
        }

        if options.verbose {
            progress.advance(flat as u64 + 1);
        }
    }

    if options.verbose {
        progress.finish();
    }

    Ok(PairCountResult {
        bin_edges: bin_edges.to_vec(),
        npairs,
        weighted: weight_sums,
        elapsed: timer.map(|t| t.elapsed()),
    })
}
