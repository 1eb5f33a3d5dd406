//! Commonly used code.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// Tolerance for comparing floating point scores.
///
/// The defaults correspond to a purely relative tolerance of `1e-9`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Relative tolerance.
    pub rel: f64,
    /// Absolute tolerance.
    pub abs: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rel: 1e-9,
            abs: 0.0,
        }
    }
}

impl Tolerance {
    /// Returns whether `a` and `b` are close to each other.
    ///
    /// # Arguments
    ///
    /// * `a` - Left-hand side value.
    /// * `b` - Right-hand side value.
    ///
    /// # Returns
    ///
    /// `true` if `|a - b| <= max(rel * max(|a|, |b|), abs)`, `false` otherwise.
    /// Infinities are only close to themselves and `NaN` is close to nothing.
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if a.is_infinite() || b.is_infinite() {
            return false;
        }
        let diff = (a - b).abs();
        diff <= (self.rel * b.abs()).max(self.rel * a.abs()).max(self.abs)
    }
}
