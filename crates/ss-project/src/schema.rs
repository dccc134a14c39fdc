//! Serialized model description shared by every file format.

use crate::{ProjectError, ProjectResult};
use serde::{Deserialize, Serialize};
use ss_controls::{ModelData, Saturation, StateSpaceController};
use ss_core::{Matrix, Scalar, Vector, from_f64, to_f64};

pub const LATEST_VERSION: u32 = 1;

fn default_version() -> u32 {
    LATEST_VERSION
}

/// A state-space model as stored on disk. Matrices are lists of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Sample period in seconds.
    pub time_step: f64,
    pub a: Vec<Vec<f64>>,
    pub b: Vec<Vec<f64>>,
    pub c: Vec<Vec<f64>>,
    pub d: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturation: Option<SaturationDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaturationDef {
    Uniform { min: f64, max: f64 },
    PerElement { min: Vec<f64>, max: Vec<f64> },
}

impl ModelDef {
    /// Dimensions (n, m, p) as implied by A, B and C.
    pub fn dims(&self) -> (usize, usize, usize) {
        let n = self.a.len();
        let m = self.b.first().map(Vec::len).unwrap_or(0);
        let p = self.c.len();
        (n, m, p)
    }

    /// Convert to matrices of the working scalar.
    ///
    /// Only the structure of each matrix is checked here; whether the four
    /// shapes fit together is left to the controller.
    pub fn to_model_data<T: Scalar>(&self) -> ProjectResult<ModelData<T>> {
        let saturation = match &self.saturation {
            None => None,
            Some(SaturationDef::Uniform { min, max }) => {
                Some(Saturation::uniform(from_f64(*min), from_f64(*max))?)
            }
            Some(SaturationDef::PerElement { min, max }) => Some(Saturation::per_element(
                to_vector(min),
                to_vector(max),
            )?),
        };
        Ok(ModelData {
            a: to_matrix("A", &self.a)?,
            b: to_matrix("B", &self.b)?,
            c: to_matrix("C", &self.c)?,
            d: to_matrix("D", &self.d)?,
            time_step: from_f64(self.time_step),
            saturation,
        })
    }

    /// Export a controller's model (not its state).
    pub fn from_controller<T: Scalar>(controller: &StateSpaceController<T>) -> Self {
        let saturation = controller.saturation().map(|s| match s {
            Saturation::Uniform { min, max } => SaturationDef::Uniform {
                min: to_f64(*min),
                max: to_f64(*max),
            },
            Saturation::PerElement { min, max } => SaturationDef::PerElement {
                min: min.iter().map(|v| to_f64(*v)).collect(),
                max: max.iter().map(|v| to_f64(*v)).collect(),
            },
        });
        Self {
            version: LATEST_VERSION,
            name: None,
            time_step: to_f64(controller.time_step()),
            a: from_matrix(controller.a()),
            b: from_matrix(controller.b()),
            c: from_matrix(controller.c()),
            d: from_matrix(controller.d()),
            saturation,
        }
    }
}

fn to_matrix<T: Scalar>(name: &'static str, rows: &[Vec<f64>]) -> ProjectResult<Matrix<T>> {
    let converted: Vec<Vec<T>> = rows
        .iter()
        .map(|row| row.iter().map(|v| from_f64(*v)).collect())
        .collect();
    Matrix::from_rows(&converted).map_err(|source| ProjectError::Matrix { name, source })
}

fn to_vector<T: Scalar>(values: &[f64]) -> Vector<T> {
    Vector::from_iterator(values.len(), values.iter().map(|v| from_f64(*v)))
}

fn from_matrix<T: Scalar>(m: &Matrix<T>) -> Vec<Vec<f64>> {
    m.rows()
        .into_iter()
        .map(|row| row.into_iter().map(to_f64).collect())
        .collect()
}
