//! Error types for the pose windowing pipeline.
//!
//! ```text
//! PipelineError (top-level)
//! ├── ConfigError  (unknown selectors, out-of-range parameters, config files)
//! └── DataError    (empty input, degenerate boxes, malformed pose files)
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Convenient `Result` alias used by construction-level functions.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Top-level error returned when building datasets.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Representation mode is not one of `global`, `local`, `both`.
    #[error("Unknown data type `{0}` (expected global, local or both)")]
    UnknownDataType(String),

    /// Stage is not one of `train`, `test`, `inference`.
    #[error("Unknown stage `{0}` (expected train, test or inference)")]
    UnknownStage(String),

    /// Model selector is not a known model family.
    #[error("Unknown model type `{0}` (expected gan, egan, autoencoder or ganomaly)")]
    UnknownModelType(String),

    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// A loader was requested for a stage the module was not built for.
    #[error("Loader for stage `{requested}` unavailable, data module was built for `{built}`")]
    StageMismatch {
        requested: &'static str,
        built: &'static str,
    },

    #[error("Cannot read config file `{path}`: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write config file `{path}`: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors produced while turning pose records into windows.
#[derive(Debug, Error)]
pub enum DataError {
    /// The pose-record collection handed to the segmenter was empty.
    #[error("No pose data{}", dir_suffix(.dir))]
    NoPoseData { dir: Option<PathBuf> },

    /// A data root contained no directory with pose data.
    #[error("No pose data directories found under `{0}`")]
    NoDataDirectories(PathBuf),

    /// A bounding box with zero (or negative) width or height was used for
    /// relative features.
    #[error(
        "Degenerate bounding box for track `{track_id}` at frame {frame_num}: \
         width {width}, height {height}"
    )]
    DegenerateBoundingBox {
        track_id: String,
        frame_num: u64,
        width: f32,
        height: f32,
    },

    /// Strict mode rejected a duplicate or decreasing frame number.
    #[error("Track `{track_id}`: frame {frame_num} does not follow frame {prev_frame_num}")]
    NonIncreasingFrame {
        track_id: String,
        prev_frame_num: u64,
        frame_num: u64,
    },

    /// Frame dimensions must both be positive.
    #[error("Invalid frame shape {width}x{height}")]
    InvalidFrameShape { width: u32, height: u32 },

    #[error("Index {index} out of bounds (dataset has {len} windows)")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("I/O error reading `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pose file `{path}`: {source}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Tensor assembly produced an unexpected shape.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl DataError {
    /// Construct a [`DataError::Io`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}

fn dir_suffix(dir: &Option<PathBuf>) -> String {
    match dir {
        Some(path) => format!(" in `{}`", path.display()),
        None => String::new(),
    }
}
