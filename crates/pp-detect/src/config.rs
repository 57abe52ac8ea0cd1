use pp_chain::ChainConfig;
use pp_scan::{DipConfig, ScanConfig};
use serde::{Deserialize, Serialize};

/// Settings of the chain-based detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub scan: ScanConfig,
    pub chain: ChainConfig,
    /// Columns and rows skipped along every image border.
    pub roi_margin: i32,
    /// Share of the largest edge displacements dropped before the developed
    /// length is averaged, in percent.
    pub trim_percent: f32,
    /// Edge and width samples further than this from their mean are left
    /// out of the refined statistics.
    pub outlier_distance: f64,
    /// Report chain points, refined edges and the box to the overlay sink.
    pub display: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            chain: ChainConfig::default(),
            roi_margin: 5,
            trim_percent: 10.0,
            outlier_distance: 25.0,
            display: false,
        }
    }
}

/// Settings of the histogram detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub dips: DipConfig,
    pub max_minima_per_row: usize,
    pub row_stride: usize,
    /// Largest distance of a kept dip from the dominant column.
    pub column_deviation: i32,
    /// Largest row spacing inside one run of dips.
    pub max_interruption: i32,
    pub roi_margin: i32,
    pub display: bool,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            dips: DipConfig::default(),
            max_minima_per_row: 3,
            row_stride: 4,
            column_deviation: 10,
            max_interruption: 20,
            roi_margin: 5,
            display: false,
        }
    }
}

/// Detection algorithm and its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DetectorStrategy {
    /// Threshold-crossing minima linked into interruption-tolerant chains.
    Chain(DetectorConfig),
    /// Dip positions clustered by a column histogram.
    Histogram(HistogramConfig),
}

impl Default for DetectorStrategy {
    fn default() -> Self {
        Self::Chain(DetectorConfig::default())
    }
}
