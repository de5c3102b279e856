//! Core pipeline.
//!
//! This module contains:
//! - Segmentation of pose records into gap-free per-track runs
//! - Sliding windows over runs
//! - Feature and mask derivation per window
//! - Indexable datasets, loaders and the stage-aware data module

pub mod dataset;
pub mod features;
pub mod loader;
pub mod module;
pub mod segment;
pub mod windowing;

// Re-export commonly used types
pub use dataset::{DatasetSample, WindowedDataset};
pub use features::{FeatureDeriver, FeatureTensor, MASK_SENTINEL};
pub use loader::DataLoader;
pub use module::PoseDataModule;
pub use segment::{Run, RunAccumulator, SegmentStats, SegmenterConfig, SequenceSegmenter};
pub use windowing::{Window, WindowExtractor};
