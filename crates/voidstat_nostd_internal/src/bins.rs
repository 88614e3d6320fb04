//! Radius bins, stored squared.
//!
//! The counting kernels never take a square root: a point is binned by
//! comparing its squared separation from the probe against squared bin
//! edges. Edges are squared once at construction, in the element type of
//! the call, so the kernels and any scalar re-check see bit-identical
//! thresholds. Values equal to an edge belong to the higher bin, i.e.
//! intervals do not include the right edge.

use crate::coord::Coordinate;
use alloc::vec::Vec;

/// Strictly increasing squared radius bin edges.
#[derive(Clone)]
pub struct SquaredBinEdges<T> {
    sq_edges: Vec<T>,
    rmax: f64,
}

impl<T: Coordinate> SquaredBinEdges<T> {
    /// `n_bins` uniform radius bins spanning `[0, rmax]`
    pub fn regular(rmax: f64, n_bins: usize) -> Result<SquaredBinEdges<T>, &'static str> {
        if n_bins == 0 {
            return Err("the number of bins must be greater than zero");
        }
        if !(rmax > 0.0) || !rmax.is_finite() {
            return Err("the search radius must be positive and finite");
        }
        let step = rmax / n_bins as f64;
        let mut edges: Vec<f64> = Vec::with_capacity(n_bins + 1);
        for i in 0..=n_bins {
            edges.push(step * i as f64);
        }
        // the last edge is rmax up to rounding; pin it exactly so the
        // kernels' outermost threshold is the caller's radius
        edges[n_bins] = rmax;
        Self::from_radius_edges(&edges)
    }

    /// caller-supplied radius bin edges (e.g. logarithmic separation bins)
    pub fn from_radius_edges(edges: &[f64]) -> Result<SquaredBinEdges<T>, &'static str> {
        if edges.len() < 2 {
            return Err("a minimum of two bin edges are required");
        }
        if edges.iter().any(|&e| !e.is_finite() || e < 0.0) {
            return Err("bin edges must be finite and non-negative");
        }
        for i in 1..edges.len() {
            if edges[i] <= edges[i - 1] {
                return Err("bin edges must be in strictly increasing order");
            }
        }

        let mut sq_edges: Vec<T> = Vec::with_capacity(edges.len());
        for &e in edges {
            let e_t = T::from_f64(e);
            sq_edges.push(e_t * e_t);
        }
        // narrowing to f32 can collapse edges that were distinct in f64
        for i in 1..sq_edges.len() {
            if sq_edges[i] <= sq_edges[i - 1] {
                return Err("bin edges are too closely spaced for this precision");
            }
        }

        Ok(SquaredBinEdges {
            sq_edges,
            rmax: edges[edges.len() - 1],
        })
    }

    pub fn n_bins(&self) -> usize {
        self.sq_edges.len() - 1
    }

    /// the outermost radius edge (not squared)
    pub fn rmax(&self) -> f64 {
        self.rmax
    }

    /// the squared edges, for handing to a counting kernel
    pub fn as_slice(&self) -> &[T] {
        &self.sq_edges
    }

    /// Get the index of the bin that a squared separation falls into.
    /// Returns None if it is out of bounds.
    pub fn bin_index(&self, distance_squared: T) -> Option<usize> {
        bin_of(distance_squared, &self.sq_edges)
    }
}

// TODO use binary search once anyone runs with wide bin tables (so far
// every caller has < 30 bins and the scan wins)
/// index of the bin a squared separation falls into, given squared edges
///
/// # Note
/// This is public within the crate so that the kernels' scalar epilogues
/// share the exact lookup used everywhere else.
pub(crate) fn bin_of<T: Coordinate>(distance_squared: T, sq_edges: &[T]) -> Option<usize> {
    // index of the first edge greater than distance_squared
    // (or sq_edges.len() if none are greater)
    let mut first_greater = 0;
    for &edge in sq_edges.iter() {
        if distance_squared < edge {
            break;
        }
        first_greater += 1;
    }
    if (first_greater == sq_edges.len()) || (first_greater == 0) {
        None
    } else {
        Some(first_greater - 1)
    }
}
