use log::debug;
use pp_core::{Color, NullOverlay, OverlaySink};
use serde::{Deserialize, Serialize};

use crate::config::CheckerConfig;
use crate::diagnostic::{Diagnostic, DiagnosticMark};

/// Slot numbers and labels of the line-pair report, in evaluation order.
///
/// Reports are numbered 1 to 9. Slot 7 belonged to a retired jump criterion
/// and is never emitted, so the eight entries skip from 6 to 8 and a
/// [`Diagnostic::index`] always matches the published slot number.
pub const LINE_DIAGNOSTICS: [(u8, &str); 8] = [
    (1, "Intersection"),
    (2, "Maximum1"),
    (3, "Maximum2"),
    (4, "SumMax12"),
    (5, "Distance"),
    (6, "CenterDistance"),
    (8, "Interruption"),
    (9, "Brightness"),
];

/// Pixels added on each side of the line pair when it is marked.
const FRAME_OFFSET: i32 = 20;

/// Two roughly parallel lines found by an upstream line search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePairCandidate {
    pub two_lines_found: bool,
    pub line_intersection: bool,
    pub pixels_on_line1: f64,
    pub pixels_on_line2: f64,
    /// Column of the first line.
    pub position1: i32,
    /// Column of the second line.
    pub position2: i32,
    pub diff_to_middle1: i32,
    pub biggest_interruption1: i32,
    pub mean_brightness: i32,
    pub roi_height: i32,
}

/// Result of one checker run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    /// 1 when the candidate met every criterion, else 0.
    pub passed: u32,
    /// Slot of the first criterion that failed.
    pub failed: Option<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckOutcome {
    pub fn is_pass(&self) -> bool {
        self.passed > 0
    }

    pub fn diagnostic(&self, index: u8) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.index == index)
    }
}

/// Accepts or rejects line-pair candidates against fixed thresholds.
#[derive(Debug, Clone, Default)]
pub struct LineCandidateChecker {
    cfg: CheckerConfig,
}

impl LineCandidateChecker {
    pub fn new(cfg: CheckerConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.cfg
    }

    pub fn check(&self, candidate: &LinePairCandidate) -> CheckOutcome {
        self.check_with_overlay(candidate, &mut NullOverlay)
    }

    /// Checks the first of `candidates`; an empty list is checked as a
    /// candidate without lines.
    pub fn check_first(
        &self,
        candidates: &[LinePairCandidate],
        overlay: &mut dyn OverlaySink,
    ) -> CheckOutcome {
        let none = LinePairCandidate::default();
        self.check_with_overlay(candidates.first().unwrap_or(&none), overlay)
    }

    /// Evaluates every criterion and marks its diagnostic. A passing pair
    /// is framed with a red rectangle on `overlay`.
    pub fn check_with_overlay(
        &self,
        c: &LinePairCandidate,
        overlay: &mut dyn OverlaySink,
    ) -> CheckOutcome {
        if !c.two_lines_found {
            return CheckOutcome {
                passed: 0,
                failed: None,
                diagnostics: LINE_DIAGNOSTICS
                    .iter()
                    .map(|&(i, label)| Diagnostic::empty(i, label))
                    .collect(),
            };
        }

        let cfg = &self.cfg;
        let long = c.pixels_on_line1.max(c.pixels_on_line2);
        let short = c.pixels_on_line1.min(c.pixels_on_line2);
        let distance = (c.position1 - c.position2).abs();
        let round = |v: f64| (v + 0.5) as i32;

        let measured = [
            (
                c.line_intersection as i32,
                !cfg.check_intersection || c.line_intersection,
            ),
            (round(long), long >= cfg.minimum_length1),
            (round(short), short >= cfg.minimum_length2),
            (
                round(long + short),
                long + short >= cfg.minimum_sum_pixel_on_line,
            ),
            (distance, distance <= cfg.maximum_line_distance),
            (
                c.diff_to_middle1,
                c.diff_to_middle1 <= cfg.maximum_distance_roi_middle,
            ),
            (
                c.biggest_interruption1,
                c.biggest_interruption1 <= cfg.maximum_line_interruption,
            ),
            (c.mean_brightness, c.mean_brightness <= cfg.maximum_brightness),
        ];

        let diagnostics: Vec<_> = LINE_DIAGNOSTICS
            .iter()
            .zip(measured)
            .map(|(&(i, label), (value, pass))| Diagnostic::measured(i, label, value, pass))
            .collect();
        let failed = diagnostics
            .iter()
            .find(|d| d.mark != DiagnosticMark::Pass)
            .map(|d| d.index);

        let passed = u32::from(failed.is_none());
        if passed > 0 {
            overlay.add_rectangle(
                c.position1 - FRAME_OFFSET,
                2,
                c.position2 - c.position1 + 2 * FRAME_OFFSET,
                c.roi_height - 2,
                Color::Red,
            );
        }
        debug!("line pair check: passed {passed}, first failure {failed:?}");

        CheckOutcome {
            passed,
            failed,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use pp_core::{OverlayLayer, Primitive};

    use super::{LINE_DIAGNOSTICS, LineCandidateChecker, LinePairCandidate};
    use crate::config::CheckerConfig;
    use crate::diagnostic::DiagnosticMark;

    fn good_pair() -> LinePairCandidate {
        LinePairCandidate {
            two_lines_found: true,
            line_intersection: true,
            pixels_on_line1: 90.0,
            pixels_on_line2: 60.0,
            position1: 100,
            position2: 110,
            diff_to_middle1: 20,
            biggest_interruption1: 10,
            mean_brightness: 30,
            roi_height: 200,
        }
    }

    /// Candidates violating exactly one criterion, keyed by its slot.
    fn single_violations() -> Vec<(u8, LinePairCandidate)> {
        let g = good_pair();
        vec![
            (1, LinePairCandidate { line_intersection: false, ..g.clone() }),
            (2, LinePairCandidate { pixels_on_line1: 65.0, ..g.clone() }),
            (3, LinePairCandidate { pixels_on_line2: 40.0, ..g.clone() }),
            (4, g.clone()),
            (5, LinePairCandidate { position2: 130, ..g.clone() }),
            (6, LinePairCandidate { diff_to_middle1: 101, ..g.clone() }),
            (8, LinePairCandidate { biggest_interruption1: 51, ..g.clone() }),
            (9, LinePairCandidate { mean_brightness: 51, ..g }),
        ]
    }

    #[test]
    fn passing_pair_marks_everything() {
        let checker = LineCandidateChecker::default();
        let mut layer = OverlayLayer::new();
        let out = checker.check_with_overlay(&good_pair(), &mut layer);

        assert_eq!(out.passed, 1);
        assert_eq!(out.failed, None);
        assert_eq!(out.diagnostics.len(), 8);
        assert!(out.diagnostics.iter().all(|d| d.mark == DiagnosticMark::Pass));
        assert_eq!(
            layer.primitives(),
            &[Primitive::Rectangle {
                x: 80,
                y: 2,
                width: 50,
                height: 198,
                color: pp_core::Color::Red,
            }]
        );
    }

    #[test]
    fn each_single_violation_is_reported() {
        let mut cfg = CheckerConfig::default();
        // Criterion 4 can only fail alone when its bound exceeds the others.
        cfg.minimum_sum_pixel_on_line = 200.0;
        let strict_sum = LineCandidateChecker::new(cfg);
        let checker = LineCandidateChecker::default();

        for (slot, pair) in single_violations() {
            let out = if slot == 4 {
                strict_sum.check(&pair)
            } else {
                checker.check(&pair)
            };
            assert_eq!(out.passed, 0, "slot {slot}");
            assert_eq!(out.failed, Some(slot), "slot {slot}");
            let d = out.diagnostic(slot).expect("slot present");
            assert_eq!(d.mark, DiagnosticMark::Fail);
            for other in out.diagnostics.iter().filter(|d| d.index != slot) {
                assert_eq!(other.mark, DiagnosticMark::Pass, "slot {slot} vs {}", other.index);
            }
        }
    }

    #[test]
    fn first_failure_wins() {
        let pair = LinePairCandidate {
            pixels_on_line2: 10.0,
            mean_brightness: 99,
            ..good_pair()
        };
        let out = LineCandidateChecker::default().check(&pair);
        assert_eq!(out.failed, Some(3));
        assert_eq!(out.diagnostic(9).map(|d| d.mark), Some(DiagnosticMark::Fail));
    }

    #[test]
    fn intersection_can_be_ignored() {
        let cfg = CheckerConfig {
            check_intersection: false,
            ..CheckerConfig::default()
        };
        let pair = LinePairCandidate {
            line_intersection: false,
            ..good_pair()
        };
        let out = LineCandidateChecker::new(cfg).check(&pair);
        assert!(out.is_pass());
        assert_eq!(out.diagnostic(1).map(|d| d.value), Some(0));
    }

    #[test]
    fn missing_pair_reports_empty_slots() {
        let mut layer = OverlayLayer::new();
        let out = LineCandidateChecker::default().check_first(&[], &mut layer);

        assert_eq!(out.passed, 0);
        assert!(layer.is_empty());
        let slots: Vec<_> = out.diagnostics.iter().map(|d| d.index).collect();
        let expected: Vec<_> = LINE_DIAGNOSTICS.iter().map(|&(i, _)| i).collect();
        assert_eq!(slots, expected);
        assert!(!slots.contains(&7));
        assert!(
            out.diagnostics
                .iter()
                .all(|d| d.mark == DiagnosticMark::NoValue && d.value == 0 && !d.has_value)
        );
    }
}
