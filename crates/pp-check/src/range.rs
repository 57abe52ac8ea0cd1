use log::debug;
use pp_core::{Color, OverlaySink};
use pp_detect::{Candidate, RankedCandidate};
use serde::Serialize;

use crate::config::{RangeCheckerConfig, ValueRange};
use crate::diagnostic::Diagnostic;

/// Slot numbers and labels of the range report.
pub const RANGE_DIAGNOSTICS: [(u8, &str); 10] = [
    (1, "Length"),
    (2, "Width"),
    (3, "Gradient"),
    (4, "GreyvalGap"),
    (5, "GreyvalInner"),
    (6, "GreyvalOuter"),
    (7, "StandardDeviation"),
    (8, "DevelopedLengthLeft"),
    (9, "DevelopedLengthRight"),
    (10, "Result"),
];

/// Report for one detector candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    /// Number of criteria inside their range.
    pub hits: usize,
    /// First criterion (1..=7) outside its range.
    pub failed: Option<u8>,
    pub accepted: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of a range check over a candidate list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeOutcome {
    /// Number of accepted candidates.
    pub accepted: u32,
    pub reports: Vec<CandidateReport>,
}

/// Accepts detector candidates whose features fall inside configured
/// ranges.
///
/// Seven criteria are evaluated per candidate; a candidate is accepted when
/// at least `active_params` of them hold. Absent candidates are reported
/// without values and never accepted.
#[derive(Debug, Clone, Default)]
pub struct CandidateRangeChecker {
    cfg: RangeCheckerConfig,
}

/// Ten times the outer over inner grey level, 0 without an inner level.
pub fn inner_outer_ratio(c: &Candidate) -> i32 {
    if c.grey_inside > 0 {
        (0.5 + 10.0 * c.grey_outside as f64 / c.grey_inside as f64) as i32
    } else {
        0
    }
}

impl CandidateRangeChecker {
    pub fn new(cfg: RangeCheckerConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RangeCheckerConfig {
        &self.cfg
    }

    pub fn check(
        &self,
        candidates: &[RankedCandidate],
        overlay: &mut dyn OverlaySink,
    ) -> RangeOutcome {
        let reports: Vec<_> = candidates
            .iter()
            .map(|rc| self.check_one(rc, overlay))
            .collect();
        let accepted = reports.iter().filter(|r| r.accepted).count() as u32;
        debug!("range check: {accepted} of {} accepted", reports.len());
        RangeOutcome { accepted, reports }
    }

    fn check_one(&self, rc: &RankedCandidate, overlay: &mut dyn OverlaySink) -> CandidateReport {
        if !rc.is_present() {
            return CandidateReport {
                hits: 0,
                failed: None,
                accepted: false,
                diagnostics: RANGE_DIAGNOSTICS
                    .iter()
                    .map(|&(i, label)| Diagnostic::empty(i, label))
                    .collect(),
            };
        }

        let c = &rc.candidate;
        let cfg = &self.cfg;
        let developed = (c.developed_length_left + c.developed_length_right) / 2;
        let criteria: [(i32, ValueRange); 7] = [
            (c.length, cfg.length),
            (c.width, cfg.width),
            (c.gradient, cfg.gradient),
            (c.grey_gap, cfg.grey_gap),
            (inner_outer_ratio(c), cfg.ratio_inner_outer),
            (c.std_deviation, cfg.std_deviation),
            (developed, cfg.developed_length),
        ];
        let pass: Vec<bool> = criteria.iter().map(|(v, r)| r.contains(*v)).collect();
        let hits = pass.iter().filter(|&&p| p).count();
        let failed = pass.iter().position(|&p| !p).map(|k| k as u8 + 1);
        let accepted = hits >= cfg.active_params;

        // The grey ratio and the developed length each show two raw values.
        let shown = [
            (c.length, pass[0]),
            (c.width, pass[1]),
            (c.gradient, pass[2]),
            (c.grey_gap, pass[3]),
            (c.grey_inside, pass[4]),
            (c.grey_outside, pass[4]),
            (c.std_deviation, pass[5]),
            (c.developed_length_left, pass[6]),
            (c.developed_length_right, pass[6]),
            (failed.map_or(0, i32::from), accepted),
        ];
        let diagnostics = RANGE_DIAGNOSTICS
            .iter()
            .zip(shown)
            .map(|(&(i, label), (value, ok))| Diagnostic::measured(i, label, value, ok))
            .collect();

        if accepted {
            let b = c.bbox;
            overlay.add_rectangle(b.x1, b.y1, b.x2 - b.x1, b.y2 - b.y1, Color::Red);
        }

        CandidateReport {
            hits,
            failed,
            accepted,
            diagnostics,
        }
    }
}
