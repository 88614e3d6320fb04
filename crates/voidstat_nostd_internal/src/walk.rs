//! Enumerates the band of mesh cells around a home cell.
//!
//! A search out to `rmax` must visit every cell within `refine` steps of
//! the probe's home cell along each axis (the mesh guarantees
//! `cell_width * refine >= rmax`, so this band captures every point that
//! can possibly be in range; the builder establishes that precondition
//! and it is not re-checked here).
//!
//! On a periodic domain a step past the edge of the mesh wraps around to
//! the far side. The stored coordinates over there are *not* shifted, so
//! the walker reports, per axis, how many domain extents the probe
//! coordinate must be displaced by for separations against that cell to
//! come out right across the seam. A narrow mesh can legitimately yield
//! the same cell more than once with different displacements: each visit
//! stands for a distinct periodic image.

/// One visited neighbor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Hash))]
pub struct Neighbor {
    /// flattened index of the cell to hand to the kernel
    pub flat: usize,
    /// per-axis multiple of the domain extent to add to the probe
    /// coordinate before computing separations against this cell
    pub wrap: [i32; 3],
}

/// Lazy enumeration of the `(2 rx + 1)(2 ry + 1)(2 rz + 1)` neighbor
/// offsets around a home cell.
pub struct NeighborWalk {
    dims: [isize; 3],
    home: [isize; 3],
    start: [isize; 3],
    stop: [isize; 3],
    periodic: bool,
    /// offset the next call to `next` will visit (odometer state)
    cursor: [isize; 3],
}

impl NeighborWalk {
    pub fn new(home: [usize; 3], refine: [usize; 3], dims: [usize; 3], periodic: bool) -> Self {
        let r = [refine[0] as isize, refine[1] as isize, refine[2] as isize];
        NeighborWalk {
            dims: [dims[0] as isize, dims[1] as isize, dims[2] as isize],
            home: [home[0] as isize, home[1] as isize, home[2] as isize],
            start: [-r[0], -r[1], -r[2]],
            stop: [r[0] + 1, r[1] + 1, r[2] + 1],
            periodic,
            cursor: [-r[0], -r[1], -r[2]],
        }
    }

    fn exhausted(&self) -> bool {
        self.cursor[0] == self.stop[0]
    }

    fn advance(&mut self) {
        self.cursor[2] += 1;
        if self.cursor[2] == self.stop[2] {
            self.cursor[2] = self.start[2];
            self.cursor[1] += 1;
            if self.cursor[1] == self.stop[1] {
                self.cursor[1] = self.start[1];
                self.cursor[0] += 1;
            }
        }
    }
}

impl Iterator for NeighborWalk {
    type Item = Neighbor;

    fn next(&mut self) -> Option<Neighbor> {
        loop {
            if self.exhausted() {
                return None;
            }
            let offset = self.cursor;
            self.advance();

            let mut idx = [0_usize; 3];
            let mut wrap = [0_i32; 3];
            let mut in_range = true;
            for ax in 0..3 {
                let raw = self.home[ax] + offset[ax];
                if self.periodic {
                    // cell = raw mod n; the probe is displaced by the
                    // opposite of however many boxes the index crossed
                    idx[ax] = raw.rem_euclid(self.dims[ax]) as usize;
                    wrap[ax] = -(raw.div_euclid(self.dims[ax])) as i32;
                } else if raw < 0 || raw >= self.dims[ax] {
                    in_range = false;
                    break;
                } else {
                    idx[ax] = raw as usize;
                }
            }
            if !in_range {
                continue;
            }

            return Some(Neighbor {
                flat: ((idx[0] * self.dims[1] as usize) + idx[1]) * self.dims[2] as usize + idx[2],
                wrap,
            });
        }
    }
}
