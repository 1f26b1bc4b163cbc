//! `odgrowth` library crate.
//!
//! The binary (`odgrowth`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the fitting and window search can be reused outside the CLI
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod review;
