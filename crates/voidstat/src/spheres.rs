//! The random-sphere sampling driver.
//!
//! Drops spheres of radius `r_1 < r_2 < … < rmax` at seeded-random
//! locations in the domain and tabulates, per radius, how often a
//! sphere contains exactly `k` points. The `k = 0` column of the result
//! is the void probability function.
//!
//! The pipeline per call: validate → establish the domain → build the
//! cell mesh → resolve the counting kernel → sample probes → normalize.
//! A probe's per-radius counts come from walking the neighbor cells of
//! its home cell and running the kernel against each; the per-bin
//! counts are then converted to cumulative-over-radius counts (a larger
//! sphere contains everything a smaller one does) before tabulation.

use crate::cancel::CancelToken;
use crate::config::Options;
use crate::dispatch::{self, KernelCache};
use crate::error::Error;
use crate::misc::{build_grid, prepare_domain};
use crate::progress::Progress;
use ndarray::Array2;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::{Duration, Instant};
use voidstat_nostd_internal::{BoundingBox, Coordinate, NeighborWalk, SquaredBinEdges};

/// How many draws a single probe may consume before the call reports
/// failure instead of retrying further.
///
/// Non-periodic probes are redrawn while their sphere would cross the
/// domain boundary. When the radius approaches half the smallest domain
/// side the acceptable region shrinks toward nothing, and without a
/// budget the loop would spin forever; with one, a domain that cannot
/// fit the sphere surfaces as a distinct placement error.
pub const MAX_PROBE_ATTEMPTS: usize = 10_000;

/// What to count: the sphere radii, how many probes to drop, and how
/// far out to tabulate the count orders.
#[derive(Clone, Copy, Debug)]
pub struct SphereCountParams {
    /// radius of the largest sphere
    pub rmax: f64,
    /// number of radius bins; bin `i` is the sphere of radius
    /// `rmax * (i + 1) / n_bins`
    pub n_bins: usize,
    /// number of random probe spheres to place
    pub n_spheres: usize,
    /// count orders `0..max_order` are tabulated; probes containing
    /// `max_order` or more points fall outside the table and are
    /// dropped from it (so each row sums to at most 1)
    pub max_order: usize,
    /// seed for the probe-location generator; identical seed and inputs
    /// reproduce the exact probe sequence and result
    pub seed: u64,
}

/// The tabulated sphere-count probabilities.
#[derive(Clone, Debug)]
pub struct SphereCountResult {
    pub rmax: f64,
    pub n_bins: usize,
    pub n_spheres: usize,
    pub max_order: usize,
    /// `pn[[i, k]]` is the fraction of probes whose sphere of radius
    /// `rmax * (i + 1) / n_bins` contained exactly `k` points
    pub pn: Array2<f64>,
    /// wall-clock duration of the call, when the timing option was set
    pub elapsed: Option<Duration>,
}

/// Count points inside seeded-random probe spheres.
///
/// `x`/`y`/`z` are the point coordinates (equal length, one precision
/// for the whole call). The kernel is resolved through `cache` per the
/// options' instruction-set ceiling. `cancel` is polled once per
/// accepted probe; `progress` sees one tick per accepted probe when the
/// verbose option is on.
pub fn count_spheres<T: Coordinate>(
    x: &[T],
    y: &[T],
    z: &[T],
    params: &SphereCountParams,
    options: &Options,
    cache: &mut KernelCache,
    cancel: &CancelToken,
    progress: &mut dyn Progress,
) -> Result<SphereCountResult, Error> {
    let timer = options.timing.then(Instant::now);

    if !(params.rmax > 0.0) {
        return Err(Error::non_positive("the search radius"));
    }
    if params.n_bins == 0 {
        return Err(Error::non_positive("the radius bin count"));
    }
    if params.n_spheres == 0 {
        return Err(Error::non_positive("the probe count"));
    }
    if params.max_order == 0 {
        return Err(Error::non_positive("the tabulated count order"));
    }

    let bbox = prepare_domain(x, y, z, options, params.rmax)?;
    let edges =
        SquaredBinEdges::<T>::regular(params.rmax, params.n_bins).map_err(Error::validation)?;
    let grid = build_grid(x, y, z, None, &bbox, params.rmax, options)?;
    let kernel = dispatch::resolve::<T>(cache, options.isa)?;

    let (n_bins, max_order) = (params.n_bins, params.max_order);
    let mut hist: Vec<u64> = Vec::new();
    hist.try_reserve_exact(n_bins * max_order)
        .map_err(|_| Error::allocation("the joint count histogram"))?;
    hist.resize(n_bins * max_order, 0);
    let mut counts = vec![0_u64; n_bins];

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
    let extent = bbox.extent();
    let dims = grid.dims();
    let refine = options.normalized_refine();

    if options.verbose {
        progress.start(params.n_spheres as u64);
    }

    for isphere in 0..params.n_spheres {
        if cancel.is_cancelled() {
            return Err(Error::interrupted());
        }

        let probe = draw_probe(&mut rng, &bbox, params.rmax, options.periodic)?;
        counts.fill(0);

        let home = grid.cell_index_of(probe);
        for nb in NeighborWalk::new(home, refine, dims, options.periodic) {
            let cell = grid.cell(nb.flat);
            if cell.is_empty() {
                continue;
            }
            let shifted = [
                T::from_f64(probe[0] + nb.wrap[0] as f64 * extent[0]),
                T::from_f64(probe[1] + nb.wrap[1] as f64 * extent[1]),
                T::from_f64(probe[2] + nb.wrap[2] as f64 * extent[2]),
            ];
            kernel
                .count_within(cell, shifted, edges.as_slice(), &mut counts)
                .map_err(Error::internal)?;
        }

        // a sphere contains everything the smaller spheres contain
        for i in 1..n_bins {
            counts[i] += counts[i - 1];
        }
        for (i, &c) in counts.iter().enumerate() {
            let order = c as usize;
            if order < max_order {
                hist[i * max_order + order] += 1;
            }
        }

        if options.verbose {
            progress.advance(isphere as u64 + 1);
        }
    }

    if options.verbose {
        progress.finish();
    }

    for (idx, &c) in hist.iter().enumerate() {
        if c > params.n_spheres as u64 {
            return Err(Error::invariant_violation(
                idx / max_order,
                idx % max_order,
                c,
                params.n_spheres,
            ));
        }
    }

    let denom = params.n_spheres as f64;
    let pn = Array2::from_shape_vec(
        (n_bins, max_order),
        hist.iter().map(|&c| c as f64 / denom).collect(),
    )
    .map_err(|_| Error::internal("the histogram shape disagrees with its storage"))?;

    Ok(SphereCountResult {
        rmax: params.rmax,
        n_bins,
        n_spheres: params.n_spheres,
        max_order,
        pn,
        elapsed: timer.map(|t| t.elapsed()),
    })
}

/// draw a uniform probe location from the domain
///
/// Periodic domains accept every draw. Non-periodic domains redraw
/// (without advancing the accepted-probe count) while the sphere would
/// cross a boundary, up to [`MAX_PROBE_ATTEMPTS`] draws.
fn draw_probe(
    rng: &mut Xoshiro256PlusPlus,
    bbox: &BoundingBox,
    rmax: f64,
    periodic: bool,
) -> Result<[f64; 3], Error> {
    let min = bbox.min();
    let max = bbox.max();
    let extent = bbox.extent();
    for _ in 0..MAX_PROBE_ATTEMPTS {
        let p = [
            min[0] + extent[0] * rng.random::<f64>(),
            min[1] + extent[1] * rng.random::<f64>(),
            min[2] + extent[2] * rng.random::<f64>(),
        ];
        if periodic {
            return Ok(p);
        }
        let inside = (0..3).all(|ax| p[ax] - min[ax] >= rmax && max[ax] - p[ax] >= rmax);
        if inside {
            return Ok(p);
        }
    }
    Err(Error::probe_placement(MAX_PROBE_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::progress::NullProgress;

    fn run(
        x: &[f64],
        params: &SphereCountParams,
        options: &Options,
    ) -> Result<SphereCountResult, Error> {
        let mut cache = KernelCache::new();
        count_spheres(
            x,
            x,
            x,
            params,
            options,
            &mut cache,
            &CancelToken::new(),
            &mut NullProgress,
        )
    }

    fn base_params() -> SphereCountParams {
        SphereCountParams {
            rmax: 0.25,
            n_bins: 2,
            n_spheres: 50,
            max_order: 4,
            seed: 7,
        }
    }

    #[test]
    fn parameter_validation_is_fail_fast() {
        let x = [0.0, 1.0];
        for (params, _name) in [
            (SphereCountParams { rmax: 0.0, ..base_params() }, "rmax"),
            (SphereCountParams { rmax: -1.0, ..base_params() }, "rmax"),
            (SphereCountParams { n_bins: 0, ..base_params() }, "bins"),
            (SphereCountParams { n_spheres: 0, ..base_params() }, "spheres"),
            (SphereCountParams { max_order: 0, ..base_params() }, "order"),
        ] {
            let err = run(&x, &params, &Options::default()).unwrap_err();
            assert_eq!(err.class(), ErrorClass::Validation);
        }

        // mismatched coordinate lengths
        let y = [0.0, 0.5, 1.0];
        let mut cache = KernelCache::new();
        let err = count_spheres(
            &x,
            &y,
            &x,
            &base_params(),
            &Options::default(),
            &mut cache,
            &CancelToken::new(),
            &mut NullProgress,
        )
        .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[test]
    fn pre_cancelled_token_interrupts_immediately() {
        let x = [0.0, 0.25, 0.5, 0.75, 1.0];
        let token = CancelToken::new();
        token.cancel();
        let mut cache = KernelCache::new();
        let err = count_spheres(
            &x,
            &x,
            &x,
            &base_params(),
            &Options::default(),
            &mut cache,
            &token,
            &mut NullProgress,
        )
        .unwrap_err();
        assert!(err.is_interrupted());
    }

    #[test]
    fn oversized_radius_exhausts_placement_retries() {
        // radius = half the extent: only the exact center would be
        // acceptable, which a continuous draw never hits
        let x = [0.0, 1.0];
        let params = SphereCountParams {
            rmax: 0.5,
            ..base_params()
        };
        let err = run(&x, &params, &Options::default()).unwrap_err();
        assert_eq!(err.class(), ErrorClass::ProbePlacement);
    }

    #[test]
    fn empty_domain_puts_all_mass_at_order_zero() {
        // 8 unit-cube corners; probes live in [0.25, 0.75]^3 and are
        // always farther than 0.25 from every corner
        let c = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let b = [0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0];
        let a = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let params = SphereCountParams {
            rmax: 0.25,
            n_bins: 3,
            n_spheres: 40,
            max_order: 5,
            seed: 123,
        };
        let mut cache = KernelCache::new();
        let result = count_spheres(
            &c,
            &b,
            &a,
            &params,
            &Options::default(),
            &mut cache,
            &CancelToken::new(),
            &mut NullProgress,
        )
        .unwrap();
        for i in 0..3 {
            assert_eq!(result.pn[[i, 0]], 1.0);
            for k in 1..5 {
                assert_eq!(result.pn[[i, k]], 0.0);
            }
        }
    }

    #[test]
    fn timing_flag_controls_elapsed() {
        let x = [0.0, 0.3, 0.6, 1.0];
        let result = run(&x, &base_params(), &Options::default()).unwrap();
        assert!(result.elapsed.is_none());

        let timed = Options {
            timing: true,
            ..Options::default()
        };
        let result = run(&x, &base_params(), &timed).unwrap();
        assert!(result.elapsed.is_some());
    }
}
