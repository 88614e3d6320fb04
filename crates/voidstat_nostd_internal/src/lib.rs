/*!
Core geometry and counting machinery for spatial point statistics.

This crate holds the pieces that don't require the standard library:
the bounding-box/periodic-domain handling, the uniform cell mesh
("gridlink") that buckets points for neighbor queries, the neighbor-cell
walk (with periodic wrap-around), the squared radius bins, and the
per-instruction-set counting kernels.

The public crate (`voidstat`) layers CPU-capability detection, kernel
dispatch, configuration, and the sampling/counting drivers on top.

Errors in this crate are plain `&'static str` messages; the public crate
wraps them into its structured error type.
*/

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod bbox;
mod bins;
mod coord;
mod grid;
mod kernels;
mod walk;

pub use bbox::BoundingBox;
pub use bins::SquaredBinEdges;
pub use coord::{Coordinate, Precision};
pub use grid::{CellView, Grid, GridBuildError};
pub use kernels::{Kernel, KernelVariant};
pub use walk::{Neighbor, NeighborWalk};
