//! Line-oriented `.dat` model format.
//!
//! One value per line:
//!
//! ```text
//! time step (seconds)
//! state dimension nx
//! input dimension ne
//! output dimension nu
//! A, nx*nx values, row-major
//! B, nx*ne values, row-major
//! C, nu*nx values, row-major
//! D, nu*ne values, row-major
//! ```
//!
//! Blank lines are ignored. This is the layout produced by common controller
//! synthesis scripts, which is why saturation bounds have no place in it.

use crate::schema::{LATEST_VERSION, ModelDef};
use crate::validate::validate_model;
use crate::{ProjectError, ProjectResult};

/// Human-readable description of the layout, printed by the CLI.
pub const FORMAT_HELP: &str = "\
-------FILE_BEGIN-------
Time step value (seconds) (example : 0.1)
State vector dimension nx
Input vector dimension ne (example : 2)
Output vector dimension nu
A[0,0] value (example : 12.354)
...
A[0,nx-1]
A[1,0]
...
A[nx-1,nx-1]
B[0,0]
...
B[nx-1,ne-1]
C[0,0]
...
C[nu-1,nx-1]
D[0,0]
...
D[nu-1,ne-1]
-------FILE_END-------
";

struct Values<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> Values<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            last_line: 0,
        }
    }

    /// Next non-blank line as (1-based line number, trimmed text).
    fn next_token(&mut self) -> Option<(usize, &'a str)> {
        for (idx, raw) in self.lines.by_ref() {
            self.last_line = idx + 1;
            let token = raw.trim();
            if !token.is_empty() {
                return Some((idx + 1, token));
            }
        }
        None
    }

    fn expect(&mut self, what: &str) -> ProjectResult<(usize, &'a str)> {
        self.next_token().ok_or_else(|| ProjectError::Format {
            line: self.last_line + 1,
            what: format!("missing {what}"),
        })
    }

    fn real(&mut self, what: &str) -> ProjectResult<f64> {
        let (line, token) = self.expect(what)?;
        let value: f64 = token.parse().map_err(|_| ProjectError::Format {
            line,
            what: format!("invalid {what}: '{token}'"),
        })?;
        if !value.is_finite() {
            return Err(ProjectError::Format {
                line,
                what: format!("non-finite {what}: '{token}'"),
            });
        }
        Ok(value)
    }

    fn dim(&mut self, what: &str) -> ProjectResult<usize> {
        let (line, token) = self.expect(what)?;
        match token.parse::<usize>() {
            Ok(0) => Err(ProjectError::Format {
                line,
                what: format!("{what} must be at least 1"),
            }),
            Ok(n) => Ok(n),
            Err(_) => Err(ProjectError::Format {
                line,
                what: format!("invalid {what}: '{token}'"),
            }),
        }
    }

    /// `rows` and `cols` are untrusted; storage grows only as values are read.
    fn matrix(&mut self, name: &str, rows: usize, cols: usize) -> ProjectResult<Vec<Vec<f64>>> {
        let mut out = Vec::new();
        for r in 0..rows {
            let mut row = Vec::new();
            for c in 0..cols {
                row.push(self.real(&format!("{name}[{r},{c}]"))?);
            }
            out.push(row);
        }
        Ok(out)
    }
}

/// Parse `.dat` content.
pub fn parse_dat(text: &str) -> ProjectResult<ModelDef> {
    let mut values = Values::new(text);

    let time_step = values.real("time step")?;
    let nx = values.dim("state dimension nx")?;
    let ne = values.dim("input dimension ne")?;
    let nu = values.dim("output dimension nu")?;

    let a = values.matrix("A", nx, nx)?;
    let b = values.matrix("B", nx, ne)?;
    let c = values.matrix("C", nu, nx)?;
    let d = values.matrix("D", nu, ne)?;

    if let Some((line, token)) = values.next_token() {
        return Err(ProjectError::Format {
            line,
            what: format!("unexpected trailing value '{token}'"),
        });
    }

    Ok(ModelDef {
        version: LATEST_VERSION,
        name: None,
        time_step,
        a,
        b,
        c,
        d,
        saturation: None,
    })
}

/// Render a model as `.dat` content.
///
/// The model is validated first. Models with saturation bounds are refused
/// since the format cannot hold them.
pub fn format_dat(model: &ModelDef) -> ProjectResult<String> {
    validate_model(model)?;
    if model.saturation.is_some() {
        return Err(ProjectError::Unsupported {
            what: "saturation bounds cannot be stored in .dat files".to_string(),
        });
    }

    let (nx, ne, nu) = model.dims();
    let mut out = format!("{}\n{nx}\n{ne}\n{nu}\n", model.time_step);
    for matrix in [&model.a, &model.b, &model.c, &model.d] {
        for v in matrix.iter().flatten() {
            out.push_str(&format!("{v}\n"));
        }
    }
    Ok(out)
}
