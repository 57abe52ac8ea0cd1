use serde::{Deserialize, Serialize};

/// Thresholds of the line-pair checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Require the two lines to intersect.
    pub check_intersection: bool,
    /// Minimum pixel count of the longer line.
    pub minimum_length1: f64,
    /// Minimum pixel count of the shorter line.
    pub minimum_length2: f64,
    pub minimum_sum_pixel_on_line: f64,
    /// Largest distance between the two line positions.
    pub maximum_line_distance: i32,
    pub maximum_distance_roi_middle: i32,
    pub maximum_line_interruption: i32,
    pub maximum_brightness: i32,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            check_intersection: true,
            minimum_length1: 70.0,
            minimum_length2: 50.0,
            minimum_sum_pixel_on_line: 50.0,
            maximum_line_distance: 15,
            maximum_distance_roi_middle: 100,
            maximum_line_interruption: 50,
            maximum_brightness: 50,
        }
    }
}

/// Inclusive accepted interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: i32,
    pub max: i32,
}

impl ValueRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: i32) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Accepted intervals of the candidate range checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeCheckerConfig {
    /// Number of criteria that must hold for a candidate to count.
    pub active_params: usize,
    pub length: ValueRange,
    pub width: ValueRange,
    pub gradient: ValueRange,
    pub grey_gap: ValueRange,
    /// Ten times the outer over inner grey level ratio.
    pub ratio_inner_outer: ValueRange,
    pub std_deviation: ValueRange,
    /// Mean of the left and right developed lengths.
    pub developed_length: ValueRange,
}

impl Default for RangeCheckerConfig {
    fn default() -> Self {
        Self {
            active_params: 7,
            length: ValueRange::new(200, 400),
            width: ValueRange::new(5, 35),
            gradient: ValueRange::new(80, 250),
            grey_gap: ValueRange::new(70, 120),
            ratio_inner_outer: ValueRange::new(15, 25),
            std_deviation: ValueRange::new(25, 35),
            developed_length: ValueRange::new(500, 1000),
        }
    }
}

/// Up to three independent range parameter sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripleRangeConfig {
    /// Number of leading sets evaluated, 0 to 3.
    pub active_sets: usize,
    pub sets: [RangeCheckerConfig; 3],
}

impl Default for TripleRangeConfig {
    fn default() -> Self {
        Self {
            active_sets: 1,
            sets: Default::default(),
        }
    }
}
