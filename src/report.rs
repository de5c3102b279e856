//! Build report for a data module.
//!
//! Summarizes what segmentation did to each source: how many runs survived,
//! how many frames were synthesized, and how long the retained runs are.

use crate::config::{DataType, Stage};
use crate::core::module::PoseDataModule;
use crate::core::segment::SegmentStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Statistics for one built dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    /// Source directory, absent for the pooled training dataset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Number of windows
    pub windows: usize,
    /// Segmentation counters
    pub segmentation: SegmentStats,
    /// Mean retained run length (0 when no run survived)
    pub run_length_mean: f64,
    /// Sample standard deviation of retained run lengths
    pub run_length_std: f64,
    /// Longest retained run
    pub run_length_max: usize,
}

/// Report for a whole build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// Unique id for this build
    pub build_id: Uuid,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    pub stage: Stage,
    pub data_type: DataType,
    pub seq_len: usize,
    pub th_split: u64,
    pub th_mask: f32,
    /// Directories considered, including skipped ones
    pub data_dirs: Vec<PathBuf>,
    pub datasets: Vec<DatasetReport>,
}

impl BuildReport {
    /// Collect statistics from a built module.
    pub fn from_module(module: &PoseDataModule) -> Self {
        let config = module.config();
        let datasets = module
            .datasets()
            .iter()
            .map(|ds| {
                let (mean, std) = run_length_moments(ds.run_lengths());
                DatasetReport {
                    source: ds.source().map(Path::to_path_buf),
                    windows: ds.len(),
                    segmentation: ds.stats().clone(),
                    run_length_mean: mean,
                    run_length_std: std,
                    run_length_max: ds.run_lengths().iter().fold(0, |m, &l| m.max(l)),
                }
            })
            .collect();

        Self {
            build_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            stage: module.stage(),
            data_type: config.data_type,
            seq_len: config.dataset.seq_len,
            th_split: config.dataset.th_split,
            th_mask: config.dataset.th_mask,
            data_dirs: module.data_dirs().to_vec(),
            datasets,
        }
    }

    /// Total windows across datasets.
    pub fn total_windows(&self) -> usize {
        self.datasets.iter().map(|d| d.windows).sum()
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Build {} ({})\n\
             - Stage: {}\n\
             - Data type: {}\n\
             - seq_len: {}, th_split: {}, th_mask: {}\n\
             - Directories: {}\n\
             - Datasets: {}\n\
             - Windows: {}\n",
            self.build_id,
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.stage,
            self.data_type,
            self.seq_len,
            self.th_split,
            self.th_mask,
            self.data_dirs.len(),
            self.datasets.len(),
            self.total_windows(),
        );

        for ds in &self.datasets {
            let name = ds
                .source
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "pooled".to_string());
            out.push_str(&format!(
                "\n[{}]\n\
                 - Windows: {}\n\
                 - Identities: {}\n\
                 - Runs kept/dropped: {}/{}\n\
                 - Gap splits: {}, frames filled: {}\n\
                 - Run length: mean {:.1}, std {:.1}, max {}\n",
                name,
                ds.windows,
                ds.segmentation.identities,
                ds.segmentation.runs_retained,
                ds.segmentation.runs_discarded,
                ds.segmentation.gap_splits,
                ds.segmentation.fillers_inserted,
                ds.run_length_mean,
                ds.run_length_std,
                ds.run_length_max,
            ));
        }
        out
    }
}

/// Mean and sample standard deviation; zero where undefined.
fn run_length_moments(lengths: &[usize]) -> (f64, f64) {
    let values: Vec<f64> = lengths.iter().map(|&l| l as f64).collect();
    let mean = if values.is_empty() {
        0.0
    } else {
        values.iter().mean()
    };
    let std = if values.len() < 2 {
        0.0
    } else {
        values.iter().std_dev()
    };
    (mean, std)
}
