//! Mathematical utilities: least-squares line fits and descriptive statistics.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
