use pp_core::PixelBox;
use serde::{Deserialize, Serialize};

/// Rank of a candidate that describes a found gap.
pub const RANK_PRESENT: u8 = 255;
/// Rank of the placeholder reported when nothing was found.
pub const RANK_ABSENT: u8 = 0;

/// Measured features of one poor-penetration gap. All values are pixels
/// or grey levels, rounded half up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Candidate {
    pub bbox: PixelBox,
    pub width: i32,
    pub length: i32,
    pub gradient: i32,
    pub grey_gap: i32,
    pub grey_inside: i32,
    pub grey_outside: i32,
    pub std_deviation: i32,
    pub developed_length_left: i32,
    pub developed_length_right: i32,
}

impl Candidate {
    /// Column reported as the defect position.
    pub fn error_position(&self) -> i32 {
        self.bbox.center_x()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub rank: u8,
}

impl RankedCandidate {
    pub fn present(candidate: Candidate) -> Self {
        Self {
            candidate,
            rank: RANK_PRESENT,
        }
    }

    pub fn absent() -> Self {
        Self {
            candidate: Candidate::default(),
            rank: RANK_ABSENT,
        }
    }

    pub fn is_present(&self) -> bool {
        self.rank == RANK_PRESENT
    }
}

/// Frame analysis state handed through the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisResult {
    #[default]
    Ok,
    /// The detector failed internally; its result must be ignored.
    NotPresent,
    /// Any other upstream state, passed through untouched.
    Other(i32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub analysis: AnalysisResult,
    /// Never empty.
    pub candidates: Vec<RankedCandidate>,
    /// Whether both edges of the retained chain wander; `None` when no chain
    /// was evaluated.
    pub edge_jitter: Option<bool>,
}

impl Detection {
    pub(crate) fn found(analysis: AnalysisResult, c: RankedCandidate, edge_jitter: Option<bool>) -> Self {
        Self {
            analysis,
            candidates: vec![c],
            edge_jitter,
        }
    }

    pub(crate) fn not_present() -> Self {
        Self {
            analysis: AnalysisResult::NotPresent,
            candidates: vec![RankedCandidate::absent()],
            edge_jitter: None,
        }
    }

    /// First candidate, which is the only one either strategy reports.
    pub fn best(&self) -> Option<&RankedCandidate> {
        self.candidates.first()
    }
}

/// Rounds half up, as candidate values are reported.
pub(crate) fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}
