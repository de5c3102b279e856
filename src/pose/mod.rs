//! Pose input: record types and the sources that supply them.

pub mod source;
pub mod types;

pub use source::{JsonPoseSource, MemoryPoseSource, PoseRecordSource};
pub use types::{BoundingBox, FrameShape, Keypoint, PoseRecord, KEYPOINT_COUNT};
