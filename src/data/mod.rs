//! Input data that does not come from an instrument.

pub mod simulate;

pub use simulate::{SimConfig, simulate_vial, write_simulated_run};
