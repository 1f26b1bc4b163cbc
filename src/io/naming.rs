//! File naming conventions of a turbidostat run directory.

use std::path::{Path, PathBuf};

/// `vial{N}_OD.txt` inside `dir`.
pub fn od_trace_path(dir: &Path, vial: u32) -> PathBuf {
    dir.join(format!("vial{vial}_OD.txt"))
}

/// `vial{N}_pump_log.txt` inside `dir`.
pub fn dilution_log_path(dir: &Path, vial: u32) -> PathBuf {
    dir.join(format!("vial{vial}_pump_log.txt"))
}

/// `vial{N}_{slug}.svg` inside `dir`.
pub fn figure_path(dir: &Path, vial: u32, sample_name: &str) -> PathBuf {
    dir.join(format!("vial{vial}_{}.svg", slugify(sample_name)))
}

/// Summary CSV path: `name` with a `.csv` extension appended.
pub fn summary_path(name: &str) -> PathBuf {
    let name = name.trim();
    if name.to_ascii_lowercase().ends_with(".csv") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}.csv"))
    }
}

/// Make a sample label safe for use in a file name.
///
/// - non-ASCII characters are dropped
/// - the result is lowercased
/// - anything other than alphanumerics, `_`, `-` and whitespace is removed
/// - runs of whitespace and `-` collapse to a single `-`
/// - leading/trailing `-` and `_` are stripped
pub fn slugify(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_ascii())
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_ascii_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.chars() {
        if c == '-' || c.is_ascii_whitespace() {
            in_separator = true;
            continue;
        }
        if in_separator {
            out.push('-');
            in_separator = false;
        }
        out.push(c);
    }
    if in_separator {
        out.push('-');
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}
