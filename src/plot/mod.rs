//! Plotting: SVG figures on disk and ASCII previews in the terminal.

pub mod ascii;
pub mod figure;

pub use ascii::render_growth_plot;
pub use figure::write_vial_figure;
