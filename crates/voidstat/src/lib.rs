/*!
Spatial counting statistics for large 3D point sets (sphere counts /
void probabilities, pair counts), built on a cell mesh and
runtime-dispatched SIMD counting kernels.

# High-Level: what gets computed

Both drivers answer "how many points lie within `r` of here?" questions
over a point cloud, optionally on a periodic (toroidal) domain:

- [`count_spheres`] drops seeded-random probe spheres and tabulates the
  probability that a sphere of each radius contains exactly `k` points
  (the `k = 0` column is the void probability function used in
  clustering analysis);
- [`count_pairs`] histograms point-pair separations (the building block
  of two-point correlation estimators), optionally weighted.

Shared machinery does the heavy lifting: points are bucketed into a
uniform cell mesh sized to the search radius, neighbor cells are walked
with periodic wrap-around where configured, and the per-cell counting
runs through the widest SIMD kernel the CPU supports (every kernel
variant produces identical counts; the instruction set only changes the
speed).

# Reproducibility and control

A call is synchronous, single-threaded CPU work. Sphere sampling is
driven by a caller-supplied seed: the same seed and inputs reproduce
the same probe sequence and the same result, regardless of which kernel
variant ran. Long calls can be cancelled cooperatively through a
[`CancelToken`] (the call then reports the interrupted outcome rather
than any partial result) and observed through a [`Progress`] reporter.

# Developer Guide

See the crate-level documentation of [`voidstat_nostd_internal`] for
the mesh, walker, and kernel internals.
*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the crates in this package
mod cancel;
mod config;
mod dispatch;
mod error;
mod isa;
mod misc;
mod pairs;
mod progress;
mod spheres;

// pull in symbols that are visible outside of the package
pub use cancel::CancelToken;
pub use config::{DEFAULT_MAX_CELLS_PER_DIM, Options};
pub use dispatch::{KernelCache, resolve, resolve_for_detected};
pub use error::{Error, ErrorClass};
pub use isa::{InstructionSet, IsaRequest, detect};
pub use pairs::{PairCountResult, count_pairs};
pub use progress::{NullProgress, Progress};
pub use spheres::{MAX_PROBE_ATTEMPTS, SphereCountParams, SphereCountResult, count_spheres};
pub use voidstat_nostd_internal::{
    BoundingBox, CellView, Coordinate, Grid, Kernel, KernelVariant, Neighbor, NeighborWalk,
    Precision, SquaredBinEdges,
};
