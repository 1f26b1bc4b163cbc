//! Input/output helpers.
//!
//! - OD trace / pump log ingest (`ingest`)
//! - summary CSV export (`export`)
//! - run manifest JSON (`manifest`)
//! - file naming conventions and label slugs (`naming`)

pub mod export;
pub mod ingest;
pub mod manifest;
pub mod naming;

pub use export::*;
pub use ingest::*;
pub use manifest::*;
pub use naming::*;
