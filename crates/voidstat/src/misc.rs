//! Miscellaneous machinery shared by the two drivers.

use crate::config::Options;
use crate::error::Error;
use voidstat_nostd_internal::{BoundingBox, Coordinate, Grid, GridBuildError};

/// Establish the counting domain for a call: data bounds, the periodic
/// extent override, and the geometry checks both drivers share.
///
/// Everything here runs before any sizeable allocation, so a bad input
/// fails fast.
pub(crate) fn prepare_domain<T: Coordinate>(
    x: &[T],
    y: &[T],
    z: &[T],
    options: &Options,
    rmax: f64,
) -> Result<BoundingBox, Error> {
    let bbox = BoundingBox::from_points(x, y, z).map_err(Error::validation)?;
    let bbox = if options.periodic {
        bbox.with_periodic_extent(options.boxsize)
            .map_err(Error::validation)?
    } else {
        bbox
    };

    if bbox.is_degenerate() {
        return Err(Error::grid("some axis of the domain has zero extent"));
    }

    if options.periodic {
        let min_extent = bbox.extent().iter().copied().fold(f64::INFINITY, f64::min);
        if rmax > 0.5 * min_extent {
            // beyond the half-box a point and its own periodic image are
            // both in range and the counts become ambiguous
            return Err(Error::validation(
                "the search radius exceeds half the smallest periodic box side",
            ));
        }
    }

    Ok(bbox)
}

/// Build the cell mesh, translating the internal failure modes.
pub(crate) fn build_grid<'a, T: Coordinate>(
    x: &'a [T],
    y: &'a [T],
    z: &'a [T],
    weights: Option<&'a [T]>,
    bbox: &BoundingBox,
    rmax: f64,
    options: &Options,
) -> Result<Grid<T>, Error> {
    Grid::build(
        x,
        y,
        z,
        weights,
        bbox,
        rmax,
        options.normalized_refine(),
        options.effective_max_cells(),
    )
    .map_err(|err| match err {
        GridBuildError::Domain(what) => Error::grid(what),
        GridBuildError::OutOfMemory => Error::allocation("the cell mesh"),
    })
}
