//! Pose Windows - windowed pose-sequence datasets for anomaly detection.
//!
//! This library turns per-frame, per-person pose detections into fixed-length
//! overlapping windows of normalized keypoints with confidence masks, ready
//! to be batched for training or inference.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Pose Windows                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌─────────┐ │
//! │  │   Source   │──▶│  Segment   │──▶│  Windows   │──▶│Features │ │
//! │  │ (pose.json)│   │ (runs/gaps)│   │ (stride 1) │   │abs/rel  │ │
//! │  └────────────┘   └────────────┘   └────────────┘   └─────────┘ │
//! │                                                          │      │
//! │                                                          ▼      │
//! │                   ┌────────────┐                  ┌───────────┐ │
//! │                   │   Report   │◀─────────────────│  Dataset  │ │
//! │                   └────────────┘                  └───────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pose_windows::{Config, JsonPoseSource, PoseDataModule, Stage};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let module = PoseDataModule::from_data_root(
//!     Path::new("data/room1/surgery1"),
//!     &JsonPoseSource::new(),
//!     config,
//!     Stage::Inference,
//! )
//! .expect("failed to build datasets");
//!
//! for dataset in module.datasets() {
//!     println!("{:?}: {} windows", dataset.source(), dataset.len());
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod pose;
pub mod report;

// Re-export key types at crate root for convenience
pub use config::{Config, DataType, DatasetConfig, ModelType, Stage};
pub use crate::core::{
    DataLoader, DatasetSample, FeatureDeriver, PoseDataModule, SequenceSegmenter,
    WindowExtractor, WindowedDataset, MASK_SENTINEL,
};
pub use error::{ConfigError, DataError, PipelineError, PipelineResult};
pub use pose::{
    BoundingBox, FrameShape, JsonPoseSource, MemoryPoseSource, PoseRecord, PoseRecordSource,
    KEYPOINT_COUNT,
};
pub use report::BuildReport;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
