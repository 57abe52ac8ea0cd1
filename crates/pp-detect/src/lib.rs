//! Poor-penetration detection on grey weld-seam images.
//!
//! [`PoorPenetrationDetector`] runs one of two strategies selected by
//! [`DetectorStrategy`]:
//! - `Chain`: threshold-crossing minima per scanned row are linked into
//!   chains; the longest chain is measured by [`extract_features`] and
//!   [`grey_contrast`].
//! - `Histogram`: dips are clustered by column and the longest run with
//!   bounded interruptions is measured.
//!
//! Either way the result holds exactly one [`RankedCandidate`], ranked
//! [`RANK_PRESENT`] or [`RANK_ABSENT`]. Failures never leave the detector;
//! they turn into an absent candidate tagged [`AnalysisResult::NotPresent`].

mod candidate;
mod config;
mod contrast;
mod detector;
mod features;
mod histogram;

pub use candidate::{
    AnalysisResult, Candidate, Detection, RANK_ABSENT, RANK_PRESENT, RankedCandidate,
};
pub use config::{DetectorConfig, DetectorStrategy, HistogramConfig};
pub use contrast::{GreyContrast, grey_contrast};
pub use detector::PoorPenetrationDetector;
pub use features::{ChainFeatures, EdgeSample, extract_features};
pub use histogram::{dips_near_column, dominant_column, longest_run};
