//! Segmentation of pose records into continuous per-identity runs.
//!
//! Records are grouped by track identity and ordered by frame number. Each
//! group is walked by a [`RunAccumulator`]: small frame gaps are repaired by
//! replicating the previous pose, large gaps and identity changes close the
//! current run. Closed runs are only kept when they are longer than the
//! window length.

use crate::error::DataError;
use crate::pose::types::PoseRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A gap-free sequence of records belonging to one track.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    records: Vec<PoseRecord>,
}

impl Run {
    pub fn records(&self) -> &[PoseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn track_id(&self) -> &str {
        self.records
            .first()
            .map(|r| r.track_id.as_str())
            .unwrap_or_default()
    }

    /// Frame numbers covered by this run.
    pub fn frame_nums(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.frame_num).collect()
    }
}

/// Segmentation parameters.
#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Window length; runs must be strictly longer to be kept
    pub seq_len: usize,
    /// Largest frame gap repaired by replication
    pub th_split: u64,
    /// Reject duplicate or decreasing frame numbers
    pub strict_frames: bool,
}

/// Counters collected while segmenting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    /// Number of input records
    pub records: usize,
    /// Number of distinct track identities
    pub identities: usize,
    /// Runs kept for windowing
    pub runs_retained: usize,
    /// Runs dropped for being too short
    pub runs_discarded: usize,
    /// Synthetic records inserted by gap repair
    pub fillers_inserted: usize,
    /// Runs closed because a gap exceeded `th_split`
    pub gap_splits: usize,
    /// Records whose frame number did not advance (tolerated unless strict)
    pub non_increasing: usize,
}

/// What the accumulator did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First record seen; a run was started
    Start,
    /// Track changed; previous run closed and a new one started
    IdentityChange,
    /// Gap repaired with this many replicated records
    Filled(u64),
    /// Gap exceeded `th_split`; previous run closed and a new one started
    Split,
    /// Appended as-is
    Append,
}

/// Explicit segmentation state: the open run and the last record seen.
pub struct RunAccumulator {
    config: SegmenterConfig,
    current: Vec<PoseRecord>,
    last: Option<PoseRecord>,
    closed: Vec<Run>,
    stats: SegmentStats,
}

impl RunAccumulator {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            current: Vec::new(),
            last: None,
            closed: Vec::new(),
            stats: SegmentStats::default(),
        }
    }

    /// Feed the next record in (track, frame) order.
    pub fn push(&mut self, curr: PoseRecord) -> Result<Transition, DataError> {
        self.stats.records += 1;

        let transition = match self.last.take() {
            None => Transition::Start,
            Some(prev) if prev.track_id != curr.track_id => Transition::IdentityChange,
            Some(prev) => match u64::try_from(curr.gap_from(&prev)) {
                Ok(1) => Transition::Append,
                Ok(gap) if gap > self.config.th_split => Transition::Split,
                Ok(gap) if gap > 1 => {
                    let fillers = (prev.frame_num + 1..curr.frame_num)
                        .map(|n| prev.replicate_at(n));
                    self.current.extend(fillers);
                    Transition::Filled(gap - 1)
                }
                // Duplicate or decreasing frame number.
                _ => {
                    if self.config.strict_frames {
                        return Err(DataError::NonIncreasingFrame {
                            track_id: curr.track_id,
                            prev_frame_num: prev.frame_num,
                            frame_num: curr.frame_num,
                        });
                    }
                    self.stats.non_increasing += 1;
                    Transition::Append
                }
            },
        };

        match transition {
            Transition::IdentityChange => self.close_run(),
            Transition::Split => {
                self.stats.gap_splits += 1;
                self.close_run();
            }
            Transition::Filled(n) => self.stats.fillers_inserted += n as usize,
            Transition::Start | Transition::Append => {}
        }

        self.current.push(curr.clone());
        self.last = Some(curr);
        Ok(transition)
    }

    /// Apply the retention rule to the open run and emit it if kept.
    fn close_run(&mut self) {
        let records = std::mem::take(&mut self.current);
        if records.is_empty() {
            return;
        }
        if records.len() > self.config.seq_len {
            self.stats.runs_retained += 1;
            self.closed.push(Run { records });
        } else {
            self.stats.runs_discarded += 1;
        }
    }

    /// Close the final run and return every retained run.
    pub fn finish(mut self) -> (Vec<Run>, SegmentStats) {
        self.close_run();
        (self.closed, self.stats)
    }
}

/// Groups pose records into retained runs.
pub struct SequenceSegmenter {
    config: SegmenterConfig,
}

impl SequenceSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Group records by track id, each group ordered by frame number.
    ///
    /// Identities are visited in ascending string order, so numeric ids sort
    /// lexically (`"10"` before `"2"`). This only affects the order of
    /// windows, never their content. The per-group sort is stable, so
    /// duplicate frame numbers keep their input order.
    pub fn group_by_track(records: Vec<PoseRecord>) -> BTreeMap<String, Vec<PoseRecord>> {
        let mut groups: BTreeMap<String, Vec<PoseRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.track_id.clone()).or_default().push(record);
        }
        for group in groups.values_mut() {
            group.sort_by_key(|r| r.frame_num);
        }
        groups
    }

    /// Split records into closed runs.
    ///
    /// An empty input is an error rather than an empty result.
    pub fn segment(
        &self,
        records: Vec<PoseRecord>,
    ) -> Result<(Vec<Run>, SegmentStats), DataError> {
        if records.is_empty() {
            return Err(DataError::NoPoseData { dir: None });
        }

        let groups = Self::group_by_track(records);
        let identities = groups.len();

        let mut acc = RunAccumulator::new(self.config);
        for record in groups.into_values().flatten() {
            acc.push(record)?;
        }
        let (runs, mut stats) = acc.finish();
        stats.identities = identities;

        debug!(
            records = stats.records,
            identities,
            retained = stats.runs_retained,
            discarded = stats.runs_discarded,
            fillers = stats.fillers_inserted,
            "segmented pose records"
        );
        Ok((runs, stats))
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
            BoundingBox::new(f, f, f + 10.0, f + 20.0),
            [[f, f + 1.0, 0.5]; KEYPOINT_COUNT],
        )
    }

    fn segmenter(seq_len: usize, th_split: u64) -> SequenceSegmenter {
        SequenceSegmenter::new(SegmenterConfig {
            seq_len,
            th_split,
            strict_frames: false,
        })
    }

    #[test]
    fn test_fill_then_split() {
        let records = vec![record("1", 8), record("1", 1), record("1", 4), record("1", 2)];
        let (runs, stats) = segmenter(2, 3).segment(records).unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].frame_nums(), vec![1, 2, 3, 4]);
        assert_eq!(stats.fillers_inserted, 1);
        assert_eq!(stats.gap_splits, 1);
        assert_eq!(stats.runs_discarded, 1);

        // The filler replicates frame 2 verbatim.
        let filler = &runs[0].records()[2];
        let prev = &runs[0].records()[1];
        assert_eq!(filler.bbox, prev.bbox);
        assert_eq!(filler.keypoints, prev.keypoints);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let err = segmenter(2, 3).segment(Vec::new()).unwrap_err();
        assert!(matches!(err, DataError::NoPoseData { .. }));
    }

    #[test]
    fn test_identity_change_starts_new_run() {
        // Consecutive frames across two tracks never join.
        let records: Vec<_> = (0..4)
            .map(|f| record("a", f))
            .chain((4..8).map(|f| record("b", f)))
            .collect();
        let (runs, stats) = segmenter(2, 3).segment(records).unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].track_id(), "a");
        assert_eq!(runs[1].track_id(), "b");
        assert_eq!(runs[1].frame_nums(), vec![4, 5, 6, 7]);
        assert_eq!(stats.identities, 2);
    }

    #[test]
    fn test_fill_grows_run_by_gap() {
        for gap in 2..=5u64 {
            let records = vec![record("1", 0), record("1", 1), record("1", 1 + gap)];
            let (runs, stats) = segmenter(1, 5).segment(records).unwrap();
            assert_eq!(runs.len(), 1);
            assert_eq!(runs[0].len() as u64, 2 + gap);
            assert_eq!(stats.fillers_inserted as u64, gap - 1);
        }
    }

    #[test]
    fn test_gap_over_threshold_splits() {
        let records: Vec<_> = (0..3).chain(10..13).map(|f| record("1", f)).collect();
        let (runs, stats) = segmenter(2, 6).segment(records).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].frame_nums(), vec![0, 1, 2]);
        assert_eq!(runs[1].frame_nums(), vec![10, 11, 12]);
        assert_eq!(stats.gap_splits, 1);
    }

    #[test]
    fn test_runs_not_longer_than_seq_len_are_dropped() {
        let records: Vec<_> = (0..3).map(|f| record("1", f)).collect();
        let (runs, stats) = segmenter(3, 1).segment(records).unwrap();
        assert!(runs.is_empty());
        assert_eq!(stats.runs_discarded, 1);
    }

    #[test]
    fn test_duplicate_frames_are_tolerated_by_default() {
        let records = vec![record("1", 0), record("1", 1), record("1", 1), record("1", 2)];
        let (runs, stats) = segmenter(1, 3).segment(records).unwrap();
        assert_eq!(runs[0].frame_nums(), vec![0, 1, 1, 2]);
        assert_eq!(stats.non_increasing, 1);
    }

    #[test]
    fn test_duplicate_frames_rejected_in_strict_mode() {
        let config = SegmenterConfig {
            seq_len: 1,
            th_split: 3,
            strict_frames: true,
        };
        let records = vec![record("1", 0), record("1", 1), record("1", 1)];
        let err = SequenceSegmenter::new(config).segment(records).unwrap_err();
        assert!(matches!(
            err,
            DataError::NonIncreasingFrame {
                prev_frame_num: 1,
                frame_num: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_accumulator_transitions() {
        let mut acc = RunAccumulator::new(SegmenterConfig {
            seq_len: 1,
            th_split: 3,
            strict_frames: false,
        });
        assert_eq!(acc.push(record("1", 0)).unwrap(), Transition::Start);
        assert_eq!(acc.push(record("1", 1)).unwrap(), Transition::Append);
        assert_eq!(acc.push(record("1", 4)).unwrap(), Transition::Filled(2));
        assert_eq!(acc.push(record("1", 9)).unwrap(), Transition::Split);
        assert_eq!(acc.push(record("2", 10)).unwrap(), Transition::IdentityChange);

        let (runs, stats) = acc.finish();
        // [0..=4] kept, [9] and [10] too short for seq_len 1.
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].frame_nums(), vec![0, 1, 2, 3, 4]);
        assert_eq!(stats.runs_discarded, 2);
    }

    #[test]
    fn test_huge_split_threshold_never_splits() {
        let records: Vec<_> = (0..6).chain(1_000..1_002).map(|f| record("1", f)).collect();
        let (runs, stats) = segmenter(2, u64::MAX).segment(records).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 1_002);
        assert_eq!(stats.gap_splits, 0);
        assert_eq!(stats.fillers_inserted, 994);
    }

    #[test]
    fn test_numeric_ids_group_lexically() {
        let records = vec![record("2", 0), record("10", 0)];
        let groups = SequenceSegmenter::group_by_track(records);
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["10", "2"]);
    }

    #[test]
    fn test_grouping_orders_tracks_and_frames() {
        let records = vec![record("b", 2), record("a", 5), record("b", 1), record("a", 3)];
        let groups = SequenceSegmenter::group_by_track(records);
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(groups["a"].iter().map(|r| r.frame_num).collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(groups["b"].iter().map(|r| r.frame_num).collect::<Vec<_>>(), vec![1, 2]);
    }
}
