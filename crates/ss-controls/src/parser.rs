//! Seam between the controller and model file formats.
//!
//! The controller never reads files itself. A [`ModelParser`] turns a path
//! into [`ModelData`]; shape consistency is then checked by
//! `StateSpaceController::from_model`, so a parser only reports problems with
//! the file itself.

use crate::error::ControlResult;
use crate::saturation::Saturation;
use ss_core::{Matrix, Scalar};
use std::path::Path;

/// Raw model content produced by a parser.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData<T: Scalar> {
    pub a: Matrix<T>,
    pub b: Matrix<T>,
    pub c: Matrix<T>,
    pub d: Matrix<T>,
    /// Sample period in seconds.
    pub time_step: T,
    pub saturation: Option<Saturation<T>>,
}

/// Reads a model description from a file.
///
/// Implementations report unreadable or malformed files as
/// `ControlError::FileFormat`.
pub trait ModelParser<T: Scalar> {
    fn parse(&self, path: &Path) -> ControlResult<ModelData<T>>;
}
