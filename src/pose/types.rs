//! Pose record types supplied by the detection/tracking stage.
//!
//! A record is one tracked person in one frame: a bounding box plus 17
//! COCO keypoints with confidences. Records are never mutated after loading.

use serde::{Deserialize, Serialize};

/// Number of COCO keypoints per person.
pub const KEYPOINT_COUNT: usize = 17;

/// One keypoint as `[x, y, confidence]`.
pub type Keypoint = [f32; 3];

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundingBoxRepr", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Whether the box encloses a positive area.
    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Detectors often append a score (and class) after the corners; only the
/// first four values are kept.
#[derive(Deserialize)]
struct BoundingBoxRepr(Vec<f32>);

impl TryFrom<BoundingBoxRepr> for BoundingBox {
    type Error = String;

    fn try_from(repr: BoundingBoxRepr) -> Result<Self, Self::Error> {
        match repr.0.as_slice() {
            [x1, y1, x2, y2, ..] => Ok(BoundingBox::new(*x1, *y1, *x2, *y2)),
            short => Err(format!(
                "bbox needs at least 4 values [x1, y1, x2, y2], got {}",
                short.len()
            )),
        }
    }
}

/// A single tracked person in a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// Frame index within the source video
    #[serde(rename = "frame", alias = "frame_num")]
    pub frame_num: u64,
    /// Tracker-assigned identity
    #[serde(rename = "id", alias = "track_id", with = "track_id_serde")]
    pub track_id: String,
    /// Person bounding box
    pub bbox: BoundingBox,
    /// COCO keypoints
    pub keypoints: [Keypoint; KEYPOINT_COUNT],
}

impl PoseRecord {
    pub fn new(
        frame_num: u64,
        track_id: impl Into<String>,
        bbox: BoundingBox,
        keypoints: [Keypoint; KEYPOINT_COUNT],
    ) -> Self {
        Self {
            frame_num,
            track_id: track_id.into(),
            bbox,
            keypoints,
        }
    }

    /// Copy of this record's pose relabelled with another frame number.
    pub fn replicate_at(&self, frame_num: u64) -> Self {
        Self {
            frame_num,
            ..self.clone()
        }
    }

    /// Signed frame distance from `prev` to this record.
    pub fn gap_from(&self, prev: &PoseRecord) -> i64 {
        self.frame_num as i64 - prev.frame_num as i64
    }
}

/// Pixel dimensions of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameShape {
    pub width: u32,
    pub height: u32,
}

impl FrameShape {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Trackers emit either numeric or string ids; both become strings.
mod track_id_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(id)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => n.to_string(),
            RawId::Text(s) => s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypoints_json() -> String {
        let kp: Vec<String> = (0..KEYPOINT_COUNT)
            .map(|i| format!("[{}.0, {}.0, 0.9]", i, i + 1))
            .collect();
        format!("[{}]", kp.join(","))
    }

    #[test]
    fn test_record_accepts_numeric_id_and_scored_bbox() {
        let json = format!(
            r#"{{"frame": 12, "id": 3, "bbox": [10.0, 20.0, 50.0, 120.0, 0.87], "keypoints": {}}}"#,
            keypoints_json()
        );
        let record: PoseRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.frame_num, 12);
        assert_eq!(record.track_id, "3");
        assert_eq!(record.bbox, BoundingBox::new(10.0, 20.0, 50.0, 120.0));
        assert_eq!(record.keypoints[4], [4.0, 5.0, 0.9]);
    }

    #[test]
    fn test_record_rejects_short_bbox() {
        let json = format!(
            r#"{{"frame": 12, "id": 3, "bbox": [100.0, 50.0], "keypoints": {}}}"#,
            keypoints_json()
        );
        let err = serde_json::from_str::<PoseRecord>(&json).unwrap_err();
        assert!(err.to_string().contains("at least 4 values"));
    }

    #[test]
    fn test_record_accepts_string_id() {
        let json = format!(
            r#"{{"frame": 0, "id": "p-7", "bbox": [0, 0, 1, 1], "keypoints": {}}}"#,
            keypoints_json()
        );
        let record: PoseRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.track_id, "p-7");
    }

    #[test]
    fn test_bbox_dimensions() {
        let bbox = BoundingBox::new(10.0, 20.0, 50.0, 120.0);
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 100.0);
        assert!(bbox.has_area());
        assert!(!BoundingBox::new(5.0, 5.0, 5.0, 9.0).has_area());
    }

    #[test]
    fn test_gap_is_signed() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let a = PoseRecord::new(10, "1", bbox, [[0.0; 3]; KEYPOINT_COUNT]);
        let b = a.replicate_at(7);
        assert_eq!(b.gap_from(&a), -3);
        assert_eq!(a.gap_from(&b), 3);
        assert_eq!(b.bbox, a.bbox);
    }
}
