//! Threshold checkers for poor-penetration candidates.
//!
//! - [`LineCandidateChecker`] validates line pairs found by an upstream line
//!   search against eight thresholds. Its report always lists the same
//!   numbered slots (1 to 6, 8 and 9) so a renderer can place them by index.
//! - [`CandidateRangeChecker`] accepts detector candidates whose features lie
//!   inside configured ranges.
//! - [`TripleRangeChecker`] runs up to three range sets over the same
//!   candidates and packs their accept counts into one code.
//!
//! Both report the first failing criterion and push a red rectangle for each
//! accepted candidate to an [`pp_core::OverlaySink`].

mod config;
mod diagnostic;
mod line;
mod range;
mod triple;

pub use config::{CheckerConfig, RangeCheckerConfig, TripleRangeConfig, ValueRange};
pub use diagnostic::{Diagnostic, DiagnosticMark};
pub use line::{CheckOutcome, LINE_DIAGNOSTICS, LineCandidateChecker, LinePairCandidate};
pub use range::{
    CandidateRangeChecker, CandidateReport, RANGE_DIAGNOSTICS, RangeOutcome, inner_outer_ratio,
};
pub use triple::{TripleOutcome, TripleRangeChecker};
