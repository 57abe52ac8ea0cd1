use log::debug;
use pp_core::OverlaySink;
use pp_detect::RankedCandidate;
use serde::Serialize;

use crate::config::TripleRangeConfig;
use crate::range::{CandidateRangeChecker, RangeOutcome};

/// Result of checking a candidate list against several range sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripleOutcome {
    /// Accepted candidates per set, packed in decimal digits: set 0 in the
    /// units, set 1 in the tens, set 2 in the hundreds.
    pub code: u32,
    /// One outcome per evaluated set.
    pub sets: Vec<RangeOutcome>,
}

impl TripleOutcome {
    /// Some evaluated set accepted at least one candidate.
    pub fn is_flagged(&self) -> bool {
        self.code > 0
    }

    pub fn accepting_sets(&self) -> Vec<usize> {
        self.sets
            .iter()
            .enumerate()
            .filter(|(_, o)| o.accepted > 0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Runs up to three [`CandidateRangeChecker`] parameter sets over the same
/// candidates, so differently shaped defects can be described side by side.
#[derive(Debug, Clone, Default)]
pub struct TripleRangeChecker {
    cfg: TripleRangeConfig,
}

impl TripleRangeChecker {
    pub fn new(cfg: TripleRangeConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &TripleRangeConfig {
        &self.cfg
    }

    /// Evaluates the first `active_sets` sets in order. Every set pushes its
    /// own rectangles for the candidates it accepts.
    pub fn check(
        &self,
        candidates: &[RankedCandidate],
        overlay: &mut dyn OverlaySink,
    ) -> TripleOutcome {
        let active = self.cfg.active_sets.min(self.cfg.sets.len());
        let mut code = 0;
        let mut weight = 1;
        let mut sets = Vec::with_capacity(active);
        for set in &self.cfg.sets[..active] {
            let out = CandidateRangeChecker::new(set.clone()).check(candidates, overlay);
            code += out.accepted * weight;
            weight *= 10;
            sets.push(out);
        }
        debug!("triple range check: {active} sets, code {code}");
        TripleOutcome { code, sets }
    }
}
