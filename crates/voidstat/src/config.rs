//! The per-call configuration surface shared by both drivers.

use crate::isa::IsaRequest;

/// the mesh-size cap applied along each axis when the caller leaves
/// `max_cells_per_dim` at zero
pub const DEFAULT_MAX_CELLS_PER_DIM: usize = 100;

/// Knobs that shape how a counting call runs (as opposed to *what* it
/// counts, which each driver takes separately).
#[derive(Clone, Debug)]
pub struct Options {
    /// ceiling on the kernel instruction set
    pub isa: IsaRequest,
    /// treat the domain as a torus
    pub periodic: bool,
    /// per-axis periodic box size; an entry of `0.0` means "derive from
    /// the data extent" (ignored entirely when `periodic` is false)
    pub boxsize: [f64; 3],
    /// neighbor cells searched per side along each axis; entries of 0
    /// are auto-corrected to 1 with a warning, never an error
    pub refine: [usize; 3],
    /// cap on the mesh size along each axis (`0` selects
    /// [`DEFAULT_MAX_CELLS_PER_DIM`])
    pub max_cells_per_dim: usize,
    /// emit progress ticks to the supplied reporter
    pub verbose: bool,
    /// measure the call's wall-clock time and surface it on the result
    pub timing: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            isa: IsaRequest::Auto,
            periodic: false,
            boxsize: [0.0; 3],
            refine: [1, 1, 1],
            max_cells_per_dim: DEFAULT_MAX_CELLS_PER_DIM,
            verbose: false,
            timing: false,
        }
    }
}

impl Options {
    /// the refine factors with invalid entries corrected
    pub(crate) fn normalized_refine(&self) -> [usize; 3] {
        let mut refine = self.refine;
        for (ax, r) in refine.iter_mut().enumerate() {
            if *r == 0 {
                log::warn!("refine factor for axis {ax} must be at least 1; using 1");
                *r = 1;
            }
        }
        refine
    }

    pub(crate) fn effective_max_cells(&self) -> usize {
        if self.max_cells_per_dim == 0 {
            DEFAULT_MAX_CELLS_PER_DIM
        } else {
            self.max_cells_per_dim
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_refine_entries_are_lifted_to_one() {
        let options = Options {
            refine: [0, 2, 0],
            ..Options::default()
        };
        assert_eq!(options.normalized_refine(), [1, 2, 1]);
    }

    #[test]
    fn zero_max_cells_selects_the_default() {
        let options = Options {
            max_cells_per_dim: 0,
            ..Options::default()
        };
        assert_eq!(options.effective_max_cells(), DEFAULT_MAX_CELLS_PER_DIM);

        let options = Options {
            max_cells_per_dim: 12,
            ..Options::default()
        };
        assert_eq!(options.effective_max_cells(), 12);
    }
}
