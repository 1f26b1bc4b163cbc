//! Reporting utilities: summary reduction and formatted terminal output.

pub mod format;
pub mod summary;

pub use format::{format_run_table, format_vial_report};
pub use summary::{rate_stats, summarize};
