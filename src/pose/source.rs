//! Pose record sources.
//!
//! Detection and tracking happen upstream; this module only reads what they
//! left on disk (or what a caller hands over in memory).

use crate::error::DataError;
use crate::pose::types::{FrameShape, PoseRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies pose records and frame dimensions per source directory.
pub trait PoseRecordSource {
    /// Load all records for a directory, or `None` when it holds no pose data.
    fn load_records(&self, dir: &Path) -> Result<Option<Vec<PoseRecord>>, DataError>;

    /// Pixel dimensions of the video belonging to `dir`.
    fn frame_shape(&self, dir: &Path) -> Result<FrameShape, DataError>;
}

/// Reads `<dir>/json/pose.json` and `<dir>/video.json`.
#[derive(Debug, Clone, Default)]
pub struct JsonPoseSource;

impl JsonPoseSource {
    pub const POSE_FILE: &'static str = "json/pose.json";
    pub const VIDEO_FILE: &'static str = "video.json";

    pub fn new() -> Self {
        Self
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DataError> {
        let content = std::fs::read_to_string(path).map_err(|e| DataError::io(path, e))?;
        serde_json::from_str(&content).map_err(|source| DataError::InvalidFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl PoseRecordSource for JsonPoseSource {
    fn load_records(&self, dir: &Path) -> Result<Option<Vec<PoseRecord>>, DataError> {
        let path = dir.join(Self::POSE_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_json(&path).map(Some)
    }

    fn frame_shape(&self, dir: &Path) -> Result<FrameShape, DataError> {
        let shape: FrameShape = Self::read_json(&dir.join(Self::VIDEO_FILE))?;
        if shape.width == 0 || shape.height == 0 {
            return Err(DataError::InvalidFrameShape {
                width: shape.width,
                height: shape.height,
            });
        }
        Ok(shape)
    }
}

/// Source backed by records already in memory, keyed by directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPoseSource {
    entries: HashMap<PathBuf, (Vec<PoseRecord>, FrameShape)>,
}

impl MemoryPoseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register records for a directory.
    pub fn insert(&mut self, dir: impl Into<PathBuf>, records: Vec<PoseRecord>, shape: FrameShape) {
        self.entries.insert(dir.into(), (records, shape));
    }

    /// Registered directories in sorted order.
    pub fn dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.entries.keys().cloned().collect();
        dirs.sort();
        dirs
    }
}

impl PoseRecordSource for MemoryPoseSource {
    fn load_records(&self, dir: &Path) -> Result<Option<Vec<PoseRecord>>, DataError> {
        Ok(self.entries.get(dir).map(|(records, _)| records.clone()))
    }

    fn frame_shape(&self, dir: &Path) -> Result<FrameShape, DataError> {
        self.entries
            .get(dir)
            .map(|(_, shape)| *shape)
            .ok_or_else(|| {
                DataError::io(
                    dir,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no frame shape registered"),
                )
            })
    }
}
