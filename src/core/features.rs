//! Feature derivation from pose windows.
//!
//! Each window yields keypoint coordinates in one or two normalizations and
//! a confidence mask of the same shape:
//!
//! - **absolute**: `(x / W, y / H)` using the video frame size
//! - **relative**: `((x - x1) / w, (y - y1) / h)` using the person's own box
//! - **mask**: [`MASK_SENTINEL`] where confidence is below `th_mask`, else 0
//!
//! All tensors are `[seq_len, points, 2]`.

use crate::config::DataType;
use crate::core::windowing::Window;
use crate::error::DataError;
use crate::pose::types::{FrameShape, KEYPOINT_COUNT};
use ndarray::{concatenate, Array3, Axis};

/// Mask value for low-confidence points; drives softmax attention to zero.
pub const MASK_SENTINEL: f32 = -1e10;

/// Feature and mask for one window, combined per [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTensor {
    /// `[seq_len, 17 | 34, 2]`
    pub feature: Array3<f32>,
    /// Same shape as `feature`
    pub mask: Array3<f32>,
}

/// Turns windows into model-ready tensors.
#[derive(Debug, Clone, Copy)]
pub struct FeatureDeriver {
    frame_shape: FrameShape,
    th_mask: f32,
    data_type: DataType,
}

impl FeatureDeriver {
    pub fn new(frame_shape: FrameShape, th_mask: f32, data_type: DataType) -> Self {
        Self {
            frame_shape,
            th_mask,
            data_type,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of points per timestep in the derived tensors.
    pub fn points(&self) -> usize {
        match self.data_type {
            DataType::Both => KEYPOINT_COUNT * 2,
            DataType::Global | DataType::Local => KEYPOINT_COUNT,
        }
    }

    /// Derive the combined feature/mask pair for a window.
    pub fn derive(&self, window: &Window<'_>) -> Result<FeatureTensor, DataError> {
        let mask = confidence_mask(window, self.th_mask);

        let tensor = match self.data_type {
            DataType::Global => FeatureTensor {
                feature: absolute_keypoints(window, self.frame_shape),
                mask,
            },
            DataType::Local => FeatureTensor {
                feature: relative_keypoints(window)?,
                mask,
            },
            DataType::Both => {
                let abs = absolute_keypoints(window, self.frame_shape);
                let rel = relative_keypoints(window)?;
                FeatureTensor {
                    feature: concatenate(Axis(1), &[abs.view(), rel.view()])?,
                    // Confidence does not depend on the representation, so
                    // both halves carry the same mask.
                    mask: concatenate(Axis(1), &[mask.view(), mask.view()])?,
                }
            }
        };
        Ok(tensor)
    }
}

/// Keypoints scaled by the frame size. Not clamped: out-of-frame detections
/// fall outside `[0, 1]`.
pub fn absolute_keypoints(window: &Window<'_>, shape: FrameShape) -> Array3<f32> {
    let records = window.records();
    let scale = [shape.width as f32, shape.height as f32];
    Array3::from_shape_fn((records.len(), KEYPOINT_COUNT, 2), |(t, p, c)| {
        records[t].keypoints[p][c] / scale[c]
    })
}

/// Keypoints relative to each timestep's bounding box, scaled by its size.
///
/// Fails on the first box without positive width and height.
pub fn relative_keypoints(window: &Window<'_>) -> Result<Array3<f32>, DataError> {
    let records = window.records();
    if let Some(bad) = records.iter().find(|r| !r.bbox.has_area()) {
        return Err(DataError::DegenerateBoundingBox {
            track_id: bad.track_id.clone(),
            frame_num: bad.frame_num,
            width: bad.bbox.width(),
            height: bad.bbox.height(),
        });
    }

    Ok(Array3::from_shape_fn(
        (records.len(), KEYPOINT_COUNT, 2),
        |(t, p, c)| {
            let bbox = &records[t].bbox;
            let (origin, size) = if c == 0 {
                (bbox.x1, bbox.width())
            } else {
                (bbox.y1, bbox.height())
            };
            (records[t].keypoints[p][c] - origin) / size
        },
    ))
}

/// Sentinel on both channels of every point below `th_mask`, zero elsewhere.
pub fn confidence_mask(window: &Window<'_>, th_mask: f32) -> Array3<f32> {
    let records = window.records();
    Array3::from_shape_fn((records.len(), KEYPOINT_COUNT, 2), |(t, p, _)| {
        if records[t].keypoints[p][2] < th_mask {
            MASK_SENTINEL
        } else {
            0.0
        }
    })
}
