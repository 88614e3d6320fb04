// not every test binary uses every helper here
#![allow(dead_code)]

// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use voidstat::Progress;

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

/// `n` points drawn uniformly from `[lo, hi)` on each axis
pub fn uniform_points(n: usize, lo: f64, hi: f64, seed: u64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut draw = |_| lo + (hi - lo) * rng.random::<f64>();
    (
        (0..n).map(&mut draw).collect(),
        (0..n).map(&mut draw).collect(),
        (0..n).map(&mut draw).collect(),
    )
}

/// records every tick so tests can assert on the exact sequence
#[derive(Default)]
pub struct RecordingProgress {
    pub started: Option<u64>,
    pub advanced: Vec<u64>,
    pub finished: bool,
}

impl Progress for RecordingProgress {
    fn start(&mut self, total: u64) {
        self.started = Some(total);
    }

    fn advance(&mut self, done: u64) {
        self.advanced.push(done);
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
