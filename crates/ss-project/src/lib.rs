//! ss-project: model file formats, validation and the file-backed parser.

pub mod dat;
pub mod schema;
pub mod validate;

pub use dat::{FORMAT_HELP, format_dat, parse_dat};
pub use schema::*;
pub use validate::{ValidationError, validate_model};

use ss_controls::{ControlError, ControlResult, ModelData, ModelParser, StateSpaceController};
use ss_core::{CoreError, Scalar};
use std::path::Path;
use tracing::debug;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Format error at line {line}: {what}")]
    Format { line: usize, what: String },

    #[error("Invalid matrix {name}: {source}")]
    Matrix {
        name: &'static str,
        source: CoreError,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported file extension: {path}")]
    UnsupportedFormat { path: String },

    #[error("Unsupported: {what}")]
    Unsupported { what: String },

    #[error("Controller error: {0}")]
    Control(#[from] ControlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// At the parser seam every file problem becomes `FileFormat`; controller
/// errors (bad saturation bounds in the file) keep their kind.
impl From<ProjectError> for ControlError {
    fn from(e: ProjectError) -> Self {
        match e {
            ProjectError::Control(inner) => inner,
            other => ControlError::FileFormat {
                what: other.to_string(),
            },
        }
    }
}

/// On-disk model formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Dat,
    Yaml,
    Json,
}

impl ModelFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> ProjectResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("dat") => Ok(ModelFormat::Dat),
            Some("yaml") | Some("yml") => Ok(ModelFormat::Yaml),
            Some("json") => Ok(ModelFormat::Json),
            _ => Err(ProjectError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Parse file content. Shapes are not cross-checked here.
    pub fn parse(self, text: &str) -> ProjectResult<ModelDef> {
        let model: ModelDef = match self {
            ModelFormat::Dat => parse_dat(text)?,
            ModelFormat::Yaml => serde_yaml::from_str(text)?,
            ModelFormat::Json => serde_json::from_str(text)?,
        };
        if model.version > LATEST_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                version: model.version,
            }
            .into());
        }
        Ok(model)
    }

    /// Render a model; it is validated first.
    pub fn render(self, model: &ModelDef) -> ProjectResult<String> {
        match self {
            ModelFormat::Dat => format_dat(model),
            ModelFormat::Yaml => {
                validate_model(model)?;
                Ok(serde_yaml::to_string(model)?)
            }
            ModelFormat::Json => {
                validate_model(model)?;
                Ok(serde_json::to_string_pretty(model)?)
            }
        }
    }
}

pub fn load_with(path: &Path, format: ModelFormat) -> ProjectResult<ModelDef> {
    let content = std::fs::read_to_string(path)?;
    let model = format.parse(&content)?;
    debug!(path = %path.display(), ?format, "model loaded");
    Ok(model)
}

pub fn save_with(path: &Path, model: &ModelDef, format: ModelFormat) -> ProjectResult<()> {
    let content = format.render(model)?;
    std::fs::write(path, content)?;
    debug!(path = %path.display(), ?format, "model saved");
    Ok(())
}

/// Load a model, choosing the format from the extension.
pub fn load_model(path: &Path) -> ProjectResult<ModelDef> {
    load_with(path, ModelFormat::from_path(path)?)
}

/// Save a model, choosing the format from the extension.
pub fn save_model(path: &Path, model: &ModelDef) -> ProjectResult<()> {
    save_with(path, model, ModelFormat::from_path(path)?)
}

pub fn load_yaml(path: &Path) -> ProjectResult<ModelDef> {
    load_with(path, ModelFormat::Yaml)
}

pub fn save_yaml(path: &Path, model: &ModelDef) -> ProjectResult<()> {
    save_with(path, model, ModelFormat::Yaml)
}

pub fn load_json(path: &Path) -> ProjectResult<ModelDef> {
    load_with(path, ModelFormat::Json)
}

pub fn save_json(path: &Path, model: &ModelDef) -> ProjectResult<()> {
    save_with(path, model, ModelFormat::Json)
}

pub fn load_dat(path: &Path) -> ProjectResult<ModelDef> {
    load_with(path, ModelFormat::Dat)
}

pub fn save_dat(path: &Path, model: &ModelDef) -> ProjectResult<()> {
    save_with(path, model, ModelFormat::Dat)
}

/// Build a controller (with saturation) from a model description.
pub fn build_controller<T: Scalar>(model: &ModelDef) -> ControlResult<StateSpaceController<T>> {
    StateSpaceController::from_model(model.to_model_data()?)
}

/// [`ModelParser`] backed by the file formats of this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileParser {
    format: Option<ModelFormat>,
}

impl FileParser {
    /// Detect the format from each file's extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always use `format`, whatever the extension.
    pub fn with_format(format: ModelFormat) -> Self {
        Self {
            format: Some(format),
        }
    }
}

impl<T: Scalar> ModelParser<T> for FileParser {
    fn parse(&self, path: &Path) -> ControlResult<ModelData<T>> {
        let model = match self.format {
            Some(format) => load_with(path, format)?,
            None => load_model(path)?,
        };
        model.to_model_data().map_err(ControlError::from)
    }
}
