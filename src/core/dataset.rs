//! Indexable datasets of derived pose windows.
//!
//! A [`WindowedDataset`] runs the whole pipeline eagerly: segmentation,
//! window extraction and feature derivation all happen at construction, so a
//! dataset that exists is fully valid. It is read-only afterwards and can be
//! shared across loader threads.

use crate::config::{DataType, DatasetConfig};
use crate::core::features::FeatureDeriver;
use crate::core::segment::{SegmentStats, SegmenterConfig, SequenceSegmenter};
use crate::core::windowing::WindowExtractor;
use crate::error::DataError;
use crate::pose::types::{FrameShape, PoseRecord};
use ndarray::Array3;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One derived window: key, feature tensor and attention mask.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSample {
    /// Frame number of the window's last record
    pub frame_num: u64,
    /// Track id of the window's last record
    pub track_id: String,
    /// `[seq_len, points, 2]`
    pub feature: Array3<f32>,
    /// Same shape as `feature`
    pub mask: Array3<f32>,
}

/// Ordered, immutable collection of derived windows.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    samples: Vec<DatasetSample>,
    source: Option<PathBuf>,
    stats: SegmentStats,
    run_lengths: Vec<usize>,
}

impl WindowedDataset {
    /// Build a dataset from raw records.
    ///
    /// Windows are ordered by track id, then run, then start frame.
    pub fn build(
        records: Vec<PoseRecord>,
        frame_shape: FrameShape,
        config: &DatasetConfig,
        data_type: DataType,
    ) -> Result<Self, DataError> {
        if frame_shape.width == 0 || frame_shape.height == 0 {
            return Err(DataError::InvalidFrameShape {
                width: frame_shape.width,
                height: frame_shape.height,
            });
        }

        let segmenter = SequenceSegmenter::new(SegmenterConfig {
            seq_len: config.seq_len,
            th_split: config.th_split,
            strict_frames: config.strict_frames,
        });
        let extractor = WindowExtractor::new(config.seq_len);
        let deriver = FeatureDeriver::new(frame_shape, config.th_mask, data_type);

        let (runs, stats) = segmenter.segment(records)?;

        let capacity = runs.iter().map(|r| extractor.window_count(r.len())).sum();
        let mut samples = Vec::with_capacity(capacity);
        for run in &runs {
            for window in extractor.extract(run) {
                let tensor = deriver.derive(&window)?;
                samples.push(DatasetSample {
                    frame_num: window.frame_num(),
                    track_id: window.track_id().to_string(),
                    feature: tensor.feature,
                    mask: tensor.mask,
                });
            }
        }

        debug!(
            runs = runs.len(),
            windows = samples.len(),
            data_type = %data_type,
            "built windowed dataset"
        );

        Ok(Self {
            samples,
            source: None,
            stats,
            run_lengths: runs.iter().map(|r| r.len()).collect(),
        })
    }

    /// Build a dataset for one source directory.
    ///
    /// Errors name the directory when the record collection is empty.
    pub fn build_for_dir(
        dir: &Path,
        records: Vec<PoseRecord>,
        frame_shape: FrameShape,
        config: &DatasetConfig,
        data_type: DataType,
    ) -> Result<Self, DataError> {
        if records.is_empty() {
            return Err(DataError::NoPoseData {
                dir: Some(dir.to_path_buf()),
            });
        }
        let mut dataset = Self::build(records, frame_shape, config, data_type)?;
        dataset.source = Some(dir.to_path_buf());
        Ok(dataset)
    }

    /// Number of windows.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The window at `index`.
    pub fn get(&self, index: usize) -> Result<&DatasetSample, DataError> {
        self.samples.get(index).ok_or(DataError::IndexOutOfBounds {
            index,
            len: self.samples.len(),
        })
    }

    pub(crate) fn samples(&self) -> &[DatasetSample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DatasetSample> {
        self.samples.iter()
    }

    /// Directory the windows came from; `None` for pooled datasets.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Segmentation counters gathered during construction.
    pub fn stats(&self) -> &SegmentStats {
        &self.stats
    }

    /// Lengths of the retained runs, in discovery order.
    pub fn run_lengths(&self) -> &[usize] {
        &self.run_lengths
    }
}

impl<'a> IntoIterator for &'a WindowedDataset {
    type Item = &'a DatasetSample;
    type IntoIter = std::slice::Iter<'a, DatasetSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::types::{BoundingBox, KEYPOINT_COUNT};

    fn record(track: &str, frame: u64) -> PoseRecord {
        let f = frame as f32;
        PoseRecord::new(
            frame,
            track,
            BoundingBox::new(10.0, 10.0, 110.0, 210.0),
            [[20.0 + f, 30.0, 0.8]; KEYPOINT_COUNT],
        )
    }

    fn config(seq_len: usize, th_split: u64) -> DatasetConfig {
        DatasetConfig {
            seq_len,
            th_split,
            ..DatasetConfig::default()
        }
    }

    #[test]
    fn test_fill_and_split_scenario() {
        let records = vec![record("1", 1), record("1", 2), record("1", 4), record("1", 8)];
        let ds = WindowedDataset::build(
            records,
            FrameShape::new(640, 480),
            &config(2, 3),
            DataType::Global,
        )
        .unwrap();

        assert_eq!(ds.len(), 3);
        let keys: Vec<_> = ds.iter().map(|s| s.frame_num).collect();
        assert_eq!(keys, vec![2, 3, 4]);
        assert!(ds.iter().all(|s| s.track_id == "1"));

        // Window ending at the synthetic frame 3 repeats frame 2's pose.
        let filled = ds.get(1).unwrap();
        assert_eq!(
            filled.feature.index_axis(ndarray::Axis(0), 0),
            filled.feature.index_axis(ndarray::Axis(0), 1)
        );
        assert_eq!(ds.run_lengths(), &[4]);
    }

    #[test]
    fn test_empty_records_named_by_directory() {
        let err = WindowedDataset::build_for_dir(
            Path::new("data/07"),
            Vec::new(),
            FrameShape::new(640, 480),
            &config(2, 3),
            DataType::Both,
        )
        .unwrap_err();
        match err {
            DataError::NoPoseData { dir } => assert_eq!(dir, Some(PathBuf::from("data/07"))),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_get_out_of_range() {
        let records: Vec<_> = (0..5).map(|f| record("1", f)).collect();
        let ds = WindowedDataset::build(
            records,
            FrameShape::new(640, 480),
            &config(3, 1),
            DataType::Both,
        )
        .unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(0).unwrap().feature.shape(), &[3, 34, 2]);
        assert!(matches!(
            ds.get(3),
            Err(DataError::IndexOutOfBounds { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_order_and_determinism() {
        let mut records: Vec<_> = (0..4)
            .map(|f| record("b", f))
            .chain((10..14).map(|f| record("a", f)))
            .collect();
        records.reverse();

        let build = |records: Vec<PoseRecord>| {
            WindowedDataset::build(
                records,
                FrameShape::new(320, 240),
                &config(2, 1),
                DataType::Local,
            )
            .unwrap()
        };
        let first = build(records.clone());
        let second = build(records);

        let keys: Vec<_> = first
            .iter()
            .map(|s| (s.track_id.clone(), s.frame_num))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a".to_string(), 11),
                ("a".to_string(), 12),
                ("a".to_string(), 13),
                ("b".to_string(), 1),
                ("b".to_string(), 2),
                ("b".to_string(), 3),
            ]
        );
        assert!(first.iter().eq(second.iter()));
    }

    #[test]
    fn test_degenerate_box_aborts_construction() {
        let mut records: Vec<_> = (0..4).map(|f| record("1", f)).collect();
        records[1].bbox = BoundingBox::new(5.0, 5.0, 40.0, 5.0);

        let result = WindowedDataset::build(
            records.clone(),
            FrameShape::new(640, 480),
            &config(2, 1),
            DataType::Both,
        );
        assert!(matches!(
            result,
            Err(DataError::DegenerateBoundingBox { frame_num: 1, .. })
        ));

        // Global features do not need the box.
        let ds = WindowedDataset::build(
            records,
            FrameShape::new(640, 480),
            &config(2, 1),
            DataType::Global,
        )
        .unwrap();
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn test_zero_frame_shape_is_rejected() {
        let records: Vec<_> = (0..4).map(|f| record("1", f)).collect();
        let result = WindowedDataset::build(
            records,
            FrameShape::new(0, 480),
            &config(2, 1),
            DataType::Global,
        );
        assert!(matches!(result, Err(DataError::InvalidFrameShape { .. })));
    }
}
