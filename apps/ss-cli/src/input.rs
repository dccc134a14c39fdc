//! Input vectors from the command line and from CSV files.

use crate::error::{CliError, CliResult};
use ss_core::Vector;
use std::path::Path;

/// Parse `"1.0,2,-3.5"` into a vector.
pub fn parse_list(text: &str) -> Result<Vector<f64>, String> {
    let values = text
        .split(',')
        .map(|t| {
            let t = t.trim();
            t.parse::<f64>().map_err(|_| format!("invalid number '{t}'"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Vector::from_vec(values))
}

/// Read one vector per line. Blank lines and `#` comments are skipped.
pub fn read_rows(path: &Path) -> CliResult<Vec<Vector<f64>>> {
    let content = std::fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = parse_list(line).map_err(|what| CliError::InputData {
            path: path.to_path_buf(),
            line: idx + 1,
            what,
        })?;
        rows.push(row);
    }
    Ok(rows)
}
