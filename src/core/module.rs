//! Stage-aware construction of datasets from a directory of sources.
//!
//! Every subdirectory of the data root is one source video. For training all
//! sources are pooled into a single dataset; for test and inference each
//! source gets its own dataset so results map back to their video.

use crate::config::{Config, Stage};
use crate::core::dataset::WindowedDataset;
use crate::core::loader::DataLoader;
use crate::error::{ConfigError, DataError, PipelineResult};
use crate::pose::source::PoseRecordSource;
use crate::pose::types::{FrameShape, PoseRecord};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Owns the datasets built for one stage.
#[derive(Debug)]
pub struct PoseDataModule {
    config: Config,
    stage: Stage,
    data_dirs: Vec<PathBuf>,
    frame_shape: FrameShape,
    datasets: Vec<WindowedDataset>,
}

impl PoseDataModule {
    /// Build from every subdirectory of `data_root`, in sorted order.
    pub fn from_data_root(
        data_root: &Path,
        source: &dyn PoseRecordSource,
        config: Config,
        stage: Stage,
    ) -> PipelineResult<Self> {
        let data_dirs = list_data_dirs(data_root)?;
        if data_dirs.is_empty() {
            return Err(DataError::NoDataDirectories(data_root.to_path_buf()).into());
        }
        Self::from_dirs(data_dirs, source, config, stage)
    }

    /// Build from an explicit list of source directories.
    ///
    /// Directories without pose data are skipped with a warning. The frame
    /// shape of the first directory that has pose data applies to every
    /// dataset. Fails when no directory has pose data.
    pub fn from_dirs(
        data_dirs: Vec<PathBuf>,
        source: &dyn PoseRecordSource,
        config: Config,
        stage: Stage,
    ) -> PipelineResult<Self> {
        config.validate()?;

        let mut loaded: Vec<(PathBuf, Vec<PoseRecord>)> = Vec::with_capacity(data_dirs.len());
        for dir in &data_dirs {
            match source.load_records(dir)? {
                Some(records) => loaded.push((dir.clone(), records)),
                None => warn!(dir = %dir.display(), "no pose data found, skipping directory"),
            }
        }

        let Some((first, _)) = loaded.first() else {
            let root = data_dirs
                .first()
                .and_then(|d| d.parent())
                .map(Path::to_path_buf)
                .unwrap_or_default();
            return Err(DataError::NoDataDirectories(root).into());
        };
        let frame_shape = source.frame_shape(first)?;

        let dataset_config = &config.dataset;
        let datasets = if stage.per_directory() {
            let mut datasets = Vec::with_capacity(loaded.len());
            for (dir, records) in loaded {
                let dataset = WindowedDataset::build_for_dir(
                    &dir,
                    records,
                    frame_shape,
                    dataset_config,
                    config.data_type,
                )?;
                info!(dir = %dir.display(), windows = dataset.len(), "built dataset");
                datasets.push(dataset);
            }
            datasets
        } else {
            let pooled: Vec<PoseRecord> = loaded.into_iter().flat_map(|(_, r)| r).collect();
            let dataset =
                WindowedDataset::build(pooled, frame_shape, dataset_config, config.data_type)?;
            info!(windows = dataset.len(), "built pooled training dataset");
            vec![dataset]
        };

        Ok(Self {
            config,
            stage,
            data_dirs,
            frame_shape,
            datasets,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// All directories considered, including skipped ones.
    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    pub fn frame_shape(&self) -> FrameShape {
        self.frame_shape
    }

    /// One dataset for training, one per loaded directory otherwise.
    pub fn datasets(&self) -> &[WindowedDataset] {
        &self.datasets
    }

    /// Shuffled loader over the pooled training dataset.
    pub fn train_loader(&self, batch_size: Option<usize>) -> Result<DataLoader<'_>, ConfigError> {
        if self.stage != Stage::Train {
            return Err(ConfigError::StageMismatch {
                requested: Stage::Train.as_str(),
                built: self.stage.as_str(),
            });
        }
        let batch_size = batch_size.unwrap_or(self.config.dataset.batch_size);
        Ok(DataLoader::new(&self.datasets[0], batch_size, true))
    }

    /// Unshuffled loaders, one per directory, for the test stage.
    pub fn test_loaders(
        &self,
        batch_size: Option<usize>,
    ) -> Result<Vec<DataLoader<'_>>, ConfigError> {
        self.per_directory_loaders(Stage::Test, batch_size)
    }

    /// Unshuffled loaders, one per directory, for the inference stage.
    pub fn predict_loaders(
        &self,
        batch_size: Option<usize>,
    ) -> Result<Vec<DataLoader<'_>>, ConfigError> {
        self.per_directory_loaders(Stage::Inference, batch_size)
    }

    fn per_directory_loaders(
        &self,
        requested: Stage,
        batch_size: Option<usize>,
    ) -> Result<Vec<DataLoader<'_>>, ConfigError> {
        // Test and inference loaders are interchangeable.
        if !self.stage.per_directory() {
            return Err(ConfigError::StageMismatch {
                requested: requested.as_str(),
                built: self.stage.as_str(),
            });
        }
        let batch_size = batch_size.unwrap_or(self.config.dataset.batch_size);
        Ok(self
            .datasets
            .iter()
            .map(|ds| DataLoader::new(ds, batch_size, false))
            .collect())
    }
}

/// Subdirectories of `root`, sorted.
fn list_data_dirs(root: &Path) -> Result<Vec<PathBuf>, DataError> {
    let entries = std::fs::read_dir(root).map_err(|e| DataError::io(root, e))?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}
