use serde::{Deserialize, Serialize};

/// Tuning for the row table and chain stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Minima at least this wide are not stored.
    pub max_minimum_width: i32,
    /// Image rows between two scanned rows.
    pub row_stride: i32,
    /// Linked runs shorter than this are removed before chaining.
    pub min_chain_rows: u32,
    /// Largest x difference for two minima to count as compatible.
    pub max_edge_delta: i32,
    /// Both edges must wander more than this for the chain to count as
    /// jittering.
    pub jitter_edge_delta: i32,
    /// Half width of the candidate box around the chain's mean x.
    pub box_half_width: f64,
    /// Minima at or above this grey level do not enter the chain's mean grey.
    pub bright_grey: i32,
    /// Upper bound on rows per image.
    pub max_rows: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_minimum_width: 40,
            row_stride: 10,
            min_chain_rows: 4,
            max_edge_delta: 5,
            jitter_edge_delta: 16,
            box_half_width: 35.0,
            bright_grey: 190,
            max_rows: 1000,
        }
    }
}
