//! Configuration for pose window dataset construction.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Windowing and masking parameters
    pub dataset: DatasetConfig,

    /// Keypoint representation fed to the model
    #[serde(default)]
    pub data_type: DataType,

    /// Model family the windows are prepared for
    #[serde(default)]
    pub model_type: ModelType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            data_type: DataType::Both,
            model_type: ModelType::Egan,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the given path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::FileWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        // Serializing plain structs and enums cannot fail.
        let content = serde_json::to_string_pretty(self).unwrap_or_default();
        std::fs::write(path, content).map_err(write_err)
    }

    /// Get the path to the default configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pose-windows")
            .join("config.json")
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.validate()
    }
}

/// Windowing parameters shared by every dataset built from one config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Number of frames per window
    pub seq_len: usize,
    /// Largest frame gap repaired by replication; larger gaps split a run
    pub th_split: u64,
    /// Keypoints with confidence below this are masked out
    pub th_mask: f32,
    /// Default batch size for loaders
    pub batch_size: usize,
    /// Reject duplicate or decreasing frame numbers within a track
    #[serde(default)]
    pub strict_frames: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            seq_len: 30,
            th_split: 30,
            th_mask: 0.2,
            batch_size: 64,
            strict_frames: false,
        }
    }
}

impl DatasetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seq_len == 0 {
            return Err(ConfigError::invalid_value("seq_len", "must be > 0"));
        }
        if self.th_split == 0 {
            return Err(ConfigError::invalid_value("th_split", "must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.th_mask) {
            return Err(ConfigError::invalid_value(
                "th_mask",
                format!("must be within [0, 1], got {}", self.th_mask),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid_value("batch_size", "must be > 0"));
        }
        Ok(())
    }
}

/// Keypoint representation emitted per window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    /// Frame-normalized coordinates (`global`)
    Global,
    /// Bounding-box-normalized coordinates (`local`)
    Local,
    /// Both representations concatenated on the point axis
    #[default]
    Both,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Global => "global",
            DataType::Local => "local",
            DataType::Both => "both",
        }
    }
}

impl FromStr for DataType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(DataType::Global),
            "local" => Ok(DataType::Local),
            "both" => Ok(DataType::Both),
            _ => Err(ConfigError::UnknownDataType(s.to_string())),
        }
    }
}

/// Processing stage, deciding how directories map to datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Stage {
    /// All directories pooled into one dataset
    Train,
    /// One dataset per directory
    Test,
    /// One dataset per directory
    Inference,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Train => "train",
            Stage::Test => "test",
            Stage::Inference => "inference",
        }
    }

    /// Whether datasets are kept per source directory.
    pub fn per_directory(&self) -> bool {
        !matches!(self, Stage::Train)
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "train" => Ok(Stage::Train),
            "test" => Ok(Stage::Test),
            "inference" => Ok(Stage::Inference),
            _ => Err(ConfigError::UnknownStage(s.to_string())),
        }
    }
}

/// Model family selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelType {
    Gan,
    #[default]
    Egan,
    Autoencoder,
    Ganomaly,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Gan => "gan",
            ModelType::Egan => "egan",
            ModelType::Autoencoder => "autoencoder",
            ModelType::Ganomaly => "ganomaly",
        }
    }
}

impl FromStr for ModelType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gan" => Ok(ModelType::Gan),
            "egan" => Ok(ModelType::Egan),
            "autoencoder" => Ok(ModelType::Autoencoder),
            "ganomaly" => Ok(ModelType::Ganomaly),
            _ => Err(ConfigError::UnknownModelType(s.to_string())),
        }
    }
}

macro_rules! string_enum_conversions {
    ($($ty:ty),*) => {$(
        impl TryFrom<String> for $ty {
            type Error = ConfigError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

string_enum_conversions!(DataType, Stage, ModelType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_parsing() {
        assert_eq!("global".parse::<DataType>().unwrap(), DataType::Global);
        assert_eq!("LOCAL".parse::<DataType>().unwrap(), DataType::Local);
        assert_eq!(" both ".parse::<DataType>().unwrap(), DataType::Both);
        assert!(matches!(
            "absolute".parse::<DataType>(),
            Err(ConfigError::UnknownDataType(_))
        ));
    }

    #[test]
    fn test_stage_parsing() {
        assert_eq!("train".parse::<Stage>().unwrap(), Stage::Train);
        assert_eq!("Inference".parse::<Stage>().unwrap(), Stage::Inference);
        assert!(!Stage::Train.per_directory());
        assert!(Stage::Test.per_directory());
        assert!(matches!(
            "validate".parse::<Stage>(),
            Err(ConfigError::UnknownStage(_))
        ));
    }

    #[test]
    fn test_model_type_parsing() {
        assert_eq!("GANomaly".parse::<ModelType>().unwrap(), ModelType::Ganomaly);
        assert!(matches!(
            "vae".parse::<ModelType>(),
            Err(ConfigError::UnknownModelType(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dataset.seq_len, 30);
        assert_eq!(config.dataset.th_split, 30);
        assert_eq!(config.data_type, DataType::Both);
        assert!(!config.dataset.strict_frames);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = Config::default();
        config.dataset.th_mask = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "th_mask", .. })
        ));

        let mut config = Config::default();
        config.dataset.seq_len = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dataset.th_split = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_uses_lowercase_names() {
        let json = r#"{
            "dataset": {"seq_len": 10, "th_split": 5, "th_mask": 0.3, "batch_size": 8},
            "data_type": "local",
            "model_type": "autoencoder"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_type, DataType::Local);
        assert_eq!(config.model_type, ModelType::Autoencoder);
        assert!(!config.dataset.strict_frames);

        let out = serde_json::to_string(&config).unwrap();
        assert!(out.contains("\"data_type\":\"local\""));
    }

    #[test]
    fn test_unknown_data_type_in_json_is_rejected() {
        let json = r#"{
            "dataset": {"seq_len": 10, "th_split": 5, "th_mask": 0.3, "batch_size": 8},
            "data_type": "global_bbox"
        }"#;
        let err = serde_json::from_str::<Config>(json).unwrap_err();
        assert!(err.to_string().contains("global_bbox"));
    }
}
