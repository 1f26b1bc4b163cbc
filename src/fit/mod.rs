//! Growth-rate fitting and stable-window selection.
//!
//! - `segments`: split a trace at dilutions and fit `ln(OD)` slopes
//! - `window`: automatic stable-window search over the slopes
//! - `manual`: user-defined window by time

pub mod manual;
pub mod segments;
pub mod window;

pub use manual::select_by_time;
pub use segments::{FittedSegment, Segment, SegmentFit, fit_growth_rates, split_segments};
pub use window::{find_window, find_window_with};
