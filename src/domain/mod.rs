//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw inputs (`OdSample`, `OdTrace`, `DilutionLog`)
//! - fit outputs (`GrowthRatePoint`, `GrowthRateSeries`, `StabilityWindow`)
//! - analysis knobs (`WindowParams`) and the per-vial `SampleSummary`

pub mod types;

pub use types::*;
