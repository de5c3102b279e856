//! Fixed-length sliding windows over closed runs.
//!
//! Windows advance one frame at a time, so neighbours share `seq_len - 1`
//! records. A window is identified by its last record.

use crate::core::segment::Run;
use crate::pose::types::PoseRecord;

/// A contiguous slice of `seq_len` records from one run.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    records: &'a [PoseRecord],
}

impl<'a> Window<'a> {
    pub fn records(&self) -> &'a [PoseRecord] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn last(&self) -> &'a PoseRecord {
        // Windows are built from `slice::windows` with a non-zero length.
        &self.records[self.records.len() - 1]
    }

    /// Frame number of the last record.
    pub fn frame_num(&self) -> u64 {
        self.last().frame_num
    }

    /// Track id of the last record.
    pub fn track_id(&self) -> &'a str {
        &self.last().track_id
    }
}

/// Slides a window of `seq_len` frames over runs with stride 1.
#[derive(Debug, Clone, Copy)]
pub struct WindowExtractor {
    seq_len: usize,
}

impl WindowExtractor {
    pub fn new(seq_len: usize) -> Self {
        Self { seq_len }
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Number of windows a run of `run_len` records produces.
    pub fn window_count(&self, run_len: usize) -> usize {
        if run_len > self.seq_len {
            run_len - self.seq_len + 1
        } else {
            0
        }
    }

    /// Windows of `run` in start order; empty when the run is not longer
    /// than `seq_len`.
    pub fn extract<'a>(&self, run: &'a Run) -> impl Iterator<Item = Window<'a>> + 'a {
        let records: &'a [PoseRecord] = if run.len() > self.seq_len {
            run.records()
        } else {
            &[]
        };
        records
            .windows(self.seq_len.max(1))
            .map(|records| Window { records })
    }
}
