//! Model validation logic.

use crate::schema::{LATEST_VERSION, ModelDef, SaturationDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Ragged matrix {name}: row {row} has {found} values, expected {expected}")]
    RaggedMatrix {
        name: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Shape mismatch: {what}")]
    ShapeMismatch { what: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

/// Full consistency check: structure, finiteness, shapes and saturation.
pub fn validate_model(model: &ModelDef) -> Result<(), ValidationError> {
    if model.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: model.version,
        });
    }

    if !model.time_step.is_finite() || model.time_step <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "time_step".to_string(),
            value: model.time_step.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }

    let a = shape_of("A", &model.a)?;
    let b = shape_of("B", &model.b)?;
    let c = shape_of("C", &model.c)?;
    let d = shape_of("D", &model.d)?;

    if a.0 != a.1 {
        return Err(shape(format!("A must be square, got {}x{}", a.0, a.1)));
    }
    let n = a.0;
    if b.0 != n {
        return Err(shape(format!("B has {} rows, A is {n}x{n}", b.0)));
    }
    if c.1 != n {
        return Err(shape(format!("C has {} columns, A is {n}x{n}", c.1)));
    }
    if d.0 != c.0 {
        return Err(shape(format!("D has {} rows, C has {}", d.0, c.0)));
    }
    if d.1 != b.1 {
        return Err(shape(format!("D has {} columns, B has {}", d.1, b.1)));
    }

    if let Some(saturation) = &model.saturation {
        validate_saturation(saturation, b.1)?;
    }
    Ok(())
}

fn validate_saturation(saturation: &SaturationDef, m: usize) -> Result<(), ValidationError> {
    let pairs: Vec<(f64, f64)> = match saturation {
        SaturationDef::Uniform { min, max } => vec![(*min, *max)],
        SaturationDef::PerElement { min, max } => {
            if min.len() != m || max.len() != m {
                return Err(shape(format!(
                    "saturation bounds have {}/{} entries, model has {m} inputs",
                    min.len(),
                    max.len()
                )));
            }
            min.iter().copied().zip(max.iter().copied()).collect()
        }
    };
    for (i, (lo, hi)) in pairs.into_iter().enumerate() {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(ValidationError::InvalidValue {
                field: format!("saturation[{i}]"),
                value: format!("[{lo}, {hi}]"),
                reason: "bounds must be finite with min <= max".to_string(),
            });
        }
    }
    Ok(())
}

fn shape_of(name: &'static str, rows: &[Vec<f64>]) -> Result<(usize, usize), ValidationError> {
    let cols = rows.first().map(Vec::len).unwrap_or(0);
    for (r, row) in rows.iter().enumerate() {
        if row.len() != cols {
            return Err(ValidationError::RaggedMatrix {
                name,
                row: r,
                expected: cols,
                found: row.len(),
            });
        }
        if let Some(v) = row.iter().find(|v| !v.is_finite()) {
            return Err(ValidationError::InvalidValue {
                field: format!("{name}[{r}]"),
                value: v.to_string(),
                reason: "must be finite".to_string(),
            });
        }
    }
    Ok((rows.len(), cols))
}

fn shape(what: String) -> ValidationError {
    ValidationError::ShapeMismatch { what }
}
