//! The axis-aligned bounding box of a point set, and its periodic variant.

use crate::coord::Coordinate;

/// Axis-aligned bounds of the counting domain.
///
/// For non-periodic calls this is exactly the extent of the data. For
/// periodic calls the caller may override the extent with the simulation
/// box size (the data must then fit inside the declared box).
///
/// All geometry here is tracked in `f64` regardless of the precision of
/// the point data; cell assignment and probe placement derive from it
/// identically for both precisions.
#[derive(Clone, Copy, Debug)]
pub struct BoundingBox {
    min: [f64; 3],
    max: [f64; 3],
}

impl BoundingBox {
    /// compute the bounds of a point set
    ///
    /// The slices must be equal-length and non-empty (the caller is
    /// expected to have validated this; we re-check the cheap parts).
    pub fn from_points<T: Coordinate>(
        x: &[T],
        y: &[T],
        z: &[T],
    ) -> Result<BoundingBox, &'static str> {
        if x.is_empty() {
            return Err("cannot compute the bounding box of an empty point set");
        }
        if x.len() != y.len() || x.len() != z.len() {
            return Err("coordinate slices must all have the same length");
        }

        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for i in 0..x.len() {
            let p = [x[i].to_f64(), y[i].to_f64(), z[i].to_f64()];
            for ax in 0..3 {
                if p[ax] < min[ax] {
                    min[ax] = p[ax];
                }
                if p[ax] > max[ax] {
                    max[ax] = p[ax];
                }
            }
        }

        // a non-finite coordinate poisons the min/max scan
        if min.iter().chain(max.iter()).any(|v| !v.is_finite()) {
            return Err("coordinates must be finite");
        }

        Ok(BoundingBox { min, max })
    }

    /// override the extent along each axis with a periodic box size
    ///
    /// A `boxsize` entry of `0.0` keeps the extent derived from the data
    /// on that axis. The data must lie inside the declared box.
    pub fn with_periodic_extent(self, boxsize: [f64; 3]) -> Result<BoundingBox, &'static str> {
        let mut max = self.max;
        for ax in 0..3 {
            if boxsize[ax] < 0.0 || !boxsize[ax].is_finite() {
                return Err("boxsize entries must be finite and non-negative");
            }
            if boxsize[ax] == 0.0 {
                continue;
            }
            if self.max[ax] - self.min[ax] > boxsize[ax] {
                return Err("the data extends beyond the declared periodic box");
            }
            max[ax] = self.min[ax] + boxsize[ax];
        }
        Ok(BoundingBox { min: self.min, max })
    }

    pub fn min(&self) -> [f64; 3] {
        self.min
    }

    pub fn max(&self) -> [f64; 3] {
        self.max
    }

    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// true when some axis has no spread at all (a degenerate domain that
    /// a mesh cannot be built over)
    pub fn is_degenerate(&self) -> bool {
        self.extent().iter().any(|&w| w <= 0.0)
    }
}
