//! The spatial mesh ("gridlink") that buckets points for neighbor queries.
//!
//! Points are partitioned into a uniform 3D mesh of cells sized so that
//! every true neighbor of a location lies within the walked band of
//! adjacent cells (see [`NeighborWalk`](crate::NeighborWalk)). Cells are
//! materialized with a
//! counting sort into one contiguous struct-of-arrays buffer per
//! coordinate: a cell is then just a sub-slice, and the counting kernels
//! can stream it with unit stride.

use crate::bbox::BoundingBox;
use crate::coord::Coordinate;
use alloc::vec::Vec;

/// How building the mesh can fail.
///
/// Allocation failure is kept separate from geometry problems because the
/// caller reports the two differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridBuildError {
    Domain(&'static str),
    OutOfMemory,
}

/// One cell's points, as borrowed coordinate slices.
#[derive(Clone, Copy)]
pub struct CellView<'a, T> {
    pub x: &'a [T],
    pub y: &'a [T],
    pub z: &'a [T],
}

impl<'a, T> CellView<'a, T> {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// A uniform 3D mesh of point buckets.
///
/// The mesh is built once per counting call, read concurrently with
/// nothing, and dropped with the call. Cells are flattened row-major with
/// the x index slowest: `flat = (ix * ny + iy) * nz + iz`.
pub struct Grid<T> {
    dims: [usize; 3],
    cell_widths: [f64; 3],
    bbox: BoundingBox,
    /// cell c owns the point range `offsets[c]..offsets[c + 1]`
    offsets: Vec<usize>,
    x: Vec<T>,
    y: Vec<T>,
    z: Vec<T>,
    weights: Option<Vec<T>>,
}

/// choose the cell count along one axis
///
/// The floor guarantees `extent / n >= rmax / refine`, and both clamps
/// only ever reduce `n` further or lift it to 1, so the cell width never
/// drops below that bound. The neighbor walk's capture precondition
/// (`cell_width * refine >= rmax`) therefore holds by construction.
fn cells_along(extent: f64, rmax: f64, refine: usize, max_cells_per_dim: usize) -> usize {
    let ideal = refine as f64 * extent / rmax;
    if ideal < 1.0 {
        1
    } else if ideal >= max_cells_per_dim as f64 {
        max_cells_per_dim
    } else {
        ideal as usize
    }
}

impl<T: Coordinate> Grid<T> {
    /// bucket a point set into a mesh sized for searches out to `rmax`
    ///
    /// Guarantees on success: every point is assigned to exactly one
    /// cell (chosen deterministically from its position), the cell
    /// counts sum to the number of points, and the within-cell ordering
    /// follows the input ordering (the scatter is stable).
    pub fn build(
        x: &[T],
        y: &[T],
        z: &[T],
        weights: Option<&[T]>,
        bbox: &BoundingBox,
        rmax: f64,
        refine: [usize; 3],
        max_cells_per_dim: usize,
    ) -> Result<Grid<T>, GridBuildError> {
        if !(rmax > 0.0) || !rmax.is_finite() {
            return Err(GridBuildError::Domain("the search radius must be positive"));
        }
        if refine.iter().any(|&r| r == 0) {
            return Err(GridBuildError::Domain("refine factors must be at least 1"));
        }
        if max_cells_per_dim == 0 {
            return Err(GridBuildError::Domain("max_cells_per_dim must be at least 1"));
        }
        if x.len() != y.len() || x.len() != z.len() {
            return Err(GridBuildError::Domain(
                "coordinate slices must all have the same length",
            ));
        }
        if weights.is_some_and(|w| w.len() != x.len()) {
            return Err(GridBuildError::Domain(
                "weights must have the same length as the coordinates",
            ));
        }
        if bbox.is_degenerate() {
            return Err(GridBuildError::Domain(
                "the domain has a zero-extent axis; cannot build a mesh over it",
            ));
        }

        let extent = bbox.extent();
        let dims = [
            cells_along(extent[0], rmax, refine[0], max_cells_per_dim),
            cells_along(extent[1], rmax, refine[1], max_cells_per_dim),
            cells_along(extent[2], rmax, refine[2], max_cells_per_dim),
        ];
        let cell_widths = [
            extent[0] / dims[0] as f64,
            extent[1] / dims[1] as f64,
            extent[2] / dims[2] as f64,
        ];
        let n_cells = dims[0] * dims[1] * dims[2];
        let n = x.len();

        // tally occupancy (shifted by one slot so the prefix sum below
        // leaves `offsets[c]` = start of cell c)
        let mut offsets: Vec<usize> = Vec::new();
        offsets
            .try_reserve_exact(n_cells + 1)
            .map_err(|_| GridBuildError::OutOfMemory)?;
        offsets.resize(n_cells + 1, 0);

        let min = bbox.min();
        let assign = |px: T, py: T, pz: T| -> usize {
            let p = [px.to_f64(), py.to_f64(), pz.to_f64()];
            let mut idx = [0_usize; 3];
            for ax in 0..3 {
                let scaled = dims[ax] as f64 * (p[ax] - min[ax]) / extent[ax];
                // the saturating cast handles scaled < 0 (can't happen for
                // in-domain data) and the min() guards floating-point
                // rounding exactly at the upper domain boundary
                idx[ax] = (scaled as usize).min(dims[ax] - 1);
            }
            (idx[0] * dims[1] + idx[1]) * dims[2] + idx[2]
        };

        for i in 0..n {
            offsets[assign(x[i], y[i], z[i]) + 1] += 1;
        }
        for c in 1..=n_cells {
            offsets[c] += offsets[c - 1];
        }

        let mut cursor: Vec<usize> = Vec::new();
        cursor
            .try_reserve_exact(n_cells)
            .map_err(|_| GridBuildError::OutOfMemory)?;
        cursor.extend_from_slice(&offsets[..n_cells]);

        let zero = T::from_f64(0.0);
        let alloc_coord = || -> Result<Vec<T>, GridBuildError> {
            let mut v: Vec<T> = Vec::new();
            v.try_reserve_exact(n).map_err(|_| GridBuildError::OutOfMemory)?;
            v.resize(n, zero);
            Ok(v)
        };
        let mut gx = alloc_coord()?;
        let mut gy = alloc_coord()?;
        let mut gz = alloc_coord()?;
        let mut gw = match weights {
            Some(_) => Some(alloc_coord()?),
            None => None,
        };

        for i in 0..n {
            let c = assign(x[i], y[i], z[i]);
            let dst = cursor[c];
            cursor[c] += 1;
            gx[dst] = x[i];
            gy[dst] = y[i];
            gz[dst] = z[i];
            if let (Some(gw), Some(w)) = (gw.as_mut(), weights) {
                gw[dst] = w[i];
            }
        }

        Ok(Grid {
            dims,
            cell_widths,
            bbox: *bbox,
            offsets,
            x: gx,
            y: gy,
            z: gz,
            weights: gw,
        })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn n_cells(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    pub fn n_points(&self) -> usize {
        self.x.len()
    }

    pub fn cell_widths(&self) -> [f64; 3] {
        self.cell_widths
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bbox
    }

    /// the 3D cell index a location belongs to (clamped into the mesh)
    pub fn cell_index_of(&self, p: [f64; 3]) -> [usize; 3] {
        let min = self.bbox.min();
        let extent = self.bbox.extent();
        let mut idx = [0_usize; 3];
        for ax in 0..3 {
            let scaled = self.dims[ax] as f64 * (p[ax] - min[ax]) / extent[ax];
            idx[ax] = (scaled as usize).min(self.dims[ax] - 1);
        }
        idx
    }

    pub fn flatten(&self, idx: [usize; 3]) -> usize {
        (idx[0] * self.dims[1] + idx[1]) * self.dims[2] + idx[2]
    }

    pub fn unflatten(&self, flat: usize) -> [usize; 3] {
        let nz = self.dims[2];
        let ny = self.dims[1];
        [flat / (ny * nz), (flat / nz) % ny, flat % nz]
    }

    pub fn cell(&self, flat: usize) -> CellView<'_, T> {
        let lo = self.offsets[flat];
        let hi = self.offsets[flat + 1];
        CellView {
            x: &self.x[lo..hi],
            y: &self.y[lo..hi],
            z: &self.z[lo..hi],
        }
    }

    /// the weights of one cell's points, if the mesh carries weights
    pub fn cell_weights(&self, flat: usize) -> Option<&[T]> {
        let lo = self.offsets[flat];
        let hi = self.offsets[flat + 1];
        self.weights.as_ref().map(|w| &w[lo..hi])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn uniform_points(n: usize, lo: f64, hi: f64, seed: u64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut draw = |_| lo + (hi - lo) * rng.random::<f64>();
        (
            (0..n).map(&mut draw).collect(),
            (0..n).map(&mut draw).collect(),
            (0..n).map(&mut draw).collect(),
        )
    }

    fn build_unit_cube(n: usize, rmax: f64, refine: [usize; 3]) -> Grid<f64> {
        let (x, y, z) = uniform_points(n, 0.0, 1.0, 87);
        let bbox = BoundingBox::from_points(&x, &y, &z).unwrap();
        Grid::build(&x, &y, &z, None, &bbox, rmax, refine, 100).unwrap()
    }

    #[test]
    fn occupancy_is_conserved() {
        let grid = build_unit_cube(500, 0.2, [1, 1, 1]);
        let total: usize = (0..grid.n_cells()).map(|c| grid.cell(c).len()).sum();
        assert_eq!(total, 500);
    }

    #[test]
    fn every_stored_point_maps_back_to_its_cell() {
        let grid = build_unit_cube(300, 0.15, [2, 1, 1]);
        for flat in 0..grid.n_cells() {
            let cell = grid.cell(flat);
            for i in 0..cell.len() {
                let idx = grid.cell_index_of([cell.x[i], cell.y[i], cell.z[i]]);
                assert_eq!(grid.flatten(idx), flat);
            }
        }
    }

    #[test]
    fn upper_boundary_points_land_in_the_top_cell() {
        // 1.0 scales to exactly dims, which the clamp must pull back in
        let x = [0.0_f64, 1.0];
        let y = [0.0_f64, 1.0];
        let z = [0.0_f64, 1.0];
        let bbox = BoundingBox::from_points(&x, &y, &z).unwrap();
        let grid = Grid::build(&x, &y, &z, None, &bbox, 0.25, [1, 1, 1], 100).unwrap();
        let dims = grid.dims();
        assert_eq!(
            grid.cell_index_of([1.0, 1.0, 1.0]),
            [dims[0] - 1, dims[1] - 1, dims[2] - 1]
        );
        let total: usize = (0..grid.n_cells()).map(|c| grid.cell(c).len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn builds_are_deterministic() {
        let (x, y, z) = uniform_points(200, -3.0, 7.0, 11);
        let bbox = BoundingBox::from_points(&x, &y, &z).unwrap();
        let a = Grid::build(&x, &y, &z, None, &bbox, 1.0, [1, 2, 1], 100).unwrap();
        let b = Grid::build(&x, &y, &z, None, &bbox, 1.0, [1, 2, 1], 100).unwrap();
        assert_eq!(a.dims(), b.dims());
        for flat in 0..a.n_cells() {
            assert_eq!(a.cell(flat).x, b.cell(flat).x);
            assert_eq!(a.cell(flat).y, b.cell(flat).y);
            assert_eq!(a.cell(flat).z, b.cell(flat).z);
        }
    }

    #[test]
    fn refine_scales_the_mesh_and_respects_the_cap() {
        let grid = build_unit_cube(64, 0.25, [1, 1, 1]);
        let fine = build_unit_cube(64, 0.25, [2, 2, 2]);
        for ax in 0..3 {
            // doubling refine (roughly) doubles the mesh ...
            assert!(fine.dims()[ax] >= 2 * grid.dims()[ax]);
            assert!(fine.dims()[ax] <= 2 * grid.dims()[ax] + 1);
            // ... and never lets a cell shrink below rmax / refine
            assert!(grid.cell_widths()[ax] >= 0.25);
            assert!(fine.cell_widths()[ax] >= 0.25 / 2.0);
        }

        // the per-axis cap wins over refine
        let (x, y, z) = uniform_points(64, 0.0, 1.0, 87);
        let bbox = BoundingBox::from_points(&x, &y, &z).unwrap();
        let capped = Grid::build(&x, &y, &z, None, &bbox, 0.001, [1, 1, 1], 10).unwrap();
        assert_eq!(capped.dims(), [10, 10, 10]);
    }

    #[test]
    fn weights_are_scattered_alongside_coordinates() {
        let (x, y, z) = uniform_points(100, 0.0, 1.0, 5);
        let w: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let bbox = BoundingBox::from_points(&x, &y, &z).unwrap();
        let grid = Grid::build(&x, &y, &z, Some(&w), &bbox, 0.3, [1, 1, 1], 100).unwrap();

        let mut seen = 0.0;
        for flat in 0..grid.n_cells() {
            let cell = grid.cell(flat);
            let cw = grid.cell_weights(flat).unwrap();
            assert_eq!(cw.len(), cell.len());
            // each weight must still sit next to its own point
            for i in 0..cell.len() {
                assert_eq!(x[cw[i] as usize], cell.x[i]);
            }
            seen += cw.iter().sum::<f64>();
        }
        assert_eq!(seen, (0..100).sum::<usize>() as f64);
    }

    #[test]
    fn build_errors() {
        let x = [0.0_f64, 1.0];
        let bbox = BoundingBox::from_points(&x, &x, &x).unwrap();
        assert!(matches!(
            Grid::build(&x, &x, &x, None, &bbox, 0.0, [1, 1, 1], 100),
            Err(GridBuildError::Domain(_))
        ));
        assert!(matches!(
            Grid::build(&x, &x, &x, None, &bbox, 0.5, [0, 1, 1], 100),
            Err(GridBuildError::Domain(_))
        ));
        assert!(matches!(
            Grid::build(&x, &x, &x, None, &bbox, 0.5, [1, 1, 1], 0),
            Err(GridBuildError::Domain(_))
        ));
        let w = [1.0_f64];
        assert!(matches!(
            Grid::build(&x, &x, &x, Some(&w), &bbox, 0.5, [1, 1, 1], 100),
            Err(GridBuildError::Domain(_))
        ));

        let flat = [1.0_f64, 1.0];
        let spread = [0.0_f64, 1.0];
        let degenerate = BoundingBox::from_points(&flat, &spread, &spread).unwrap();
        assert!(matches!(
            Grid::build(&flat, &spread, &spread, None, &degenerate, 0.5, [1, 1, 1], 100),
            Err(GridBuildError::Domain(_))
        ));
    }
}
