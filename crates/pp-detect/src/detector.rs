use std::panic::{AssertUnwindSafe, catch_unwind};

use log::{debug, trace, warn};
use pp_chain::{ChainBuilder, RowMinimaTable, edge_jitter, keep_longest, summarize_chains};
use pp_core::{Color, Error, ImageView, NullOverlay, OverlaySink};
use pp_scan::{DipScanner, MultiMinimumScanner};

use crate::candidate::{AnalysisResult, Candidate, Detection, RankedCandidate, round_half_up};
use crate::config::{DetectorConfig, DetectorStrategy};
use crate::contrast::{GreyContrast, grey_contrast};
use crate::features::{ChainFeatures, extract_features};
use crate::histogram::detect_histogram;

/// Developed lengths are reported in thousandths of a pixel per row.
const DEVELOPED_SCALE: f64 = 1000.0;
/// Scale of the reported edge and width spread.
const STD_SCALE: f64 = 10.0;

/// Poor-penetration detector with scan buffers reused across frames.
///
/// All per-frame state is reset at the start of every call, so one instance
/// can process any sequence of images. Instances share nothing; run one per
/// thread to process frames in parallel.
#[derive(Debug)]
pub struct PoorPenetrationDetector {
    strategy: DetectorStrategy,
    scanner: MultiMinimumScanner,
    dips: DipScanner,
    table: RowMinimaTable,
}

impl PoorPenetrationDetector {
    pub fn new(strategy: DetectorStrategy) -> Self {
        let capacity = match &strategy {
            DetectorStrategy::Chain(cfg) => cfg.chain.max_rows,
            DetectorStrategy::Histogram(_) => 0,
        };
        Self {
            strategy,
            scanner: MultiMinimumScanner::new(),
            dips: DipScanner::new(),
            table: RowMinimaTable::new(capacity),
        }
    }

    pub fn strategy(&self) -> &DetectorStrategy {
        &self.strategy
    }

    /// Row table left behind by the last chain detection.
    pub fn table(&self) -> &RowMinimaTable {
        &self.table
    }

    pub fn detect(&mut self, img: &ImageView<'_, u8>, analysis: AnalysisResult) -> Detection {
        self.detect_with_overlay(img, analysis, &mut NullOverlay)
    }

    /// Runs the configured strategy on `img`.
    ///
    /// The result always holds exactly one candidate. Any internal error or
    /// panic is logged and reported as an absent candidate with
    /// [`AnalysisResult::NotPresent`]; otherwise `analysis` is passed
    /// through unchanged.
    pub fn detect_with_overlay(
        &mut self,
        img: &ImageView<'_, u8>,
        analysis: AnalysisResult,
        overlay: &mut dyn OverlaySink,
    ) -> Detection {
        let run = catch_unwind(AssertUnwindSafe(|| self.run(img, overlay)));
        match run {
            Ok(Ok((candidate, jitter))) => Detection::found(analysis, candidate, jitter),
            Ok(Err(e)) => {
                warn!("poor penetration detection failed: {e}");
                Detection::not_present()
            }
            Err(_) => {
                warn!("poor penetration detection panicked");
                Detection::not_present()
            }
        }
    }

    fn run(
        &mut self,
        img: &ImageView<'_, u8>,
        overlay: &mut dyn OverlaySink,
    ) -> Result<(RankedCandidate, Option<bool>), Error> {
        self.table.clear();
        match &self.strategy {
            DetectorStrategy::Chain(cfg) => {
                self.table.set_capacity(cfg.chain.max_rows);
                detect_chain(&mut self.scanner, &mut self.table, img, cfg, overlay)
            }
            DetectorStrategy::Histogram(cfg) => {
                detect_histogram(&mut self.dips, img, cfg, overlay).map(|c| (c, None))
            }
        }
    }
}

impl Default for PoorPenetrationDetector {
    fn default() -> Self {
        Self::new(DetectorStrategy::default())
    }
}

fn detect_chain(
    scanner: &mut MultiMinimumScanner,
    table: &mut RowMinimaTable,
    img: &ImageView<'_, u8>,
    cfg: &DetectorConfig,
    overlay: &mut dyn OverlaySink,
) -> Result<(RankedCandidate, Option<bool>), Error> {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let m = cfg.roi_margin;
    let wy = cfg.scan.window_y.max(1) as i32;
    let chain_cfg = &cfg.chain;

    let dark = cfg.scan.lower_threshold as i32;
    let mut row = m;
    while row < h - m - (wy - 1) {
        let mut scan = scanner.scan_row(img, row, (m, w - m), &cfg.scan);
        // A flat row's darkest sample is only a seam point when it is dark.
        scan.minima.retain(|s| !s.flat || s.grey < dark);
        trace!("row {}: {} minima", scan.row, scan.minima.len());
        table.push_row(
            scan.row as i32,
            &scan.minima,
            chain_cfg.max_minimum_width,
            chain_cfg.max_edge_delta,
        )?;
        row += chain_cfg.row_stride.max(1);
    }

    table.kill_short_fragments(chain_cfg.min_chain_rows);
    table.pack();
    table.eliminate_multi_minima();

    let ranking = ChainBuilder::new(chain_cfg.max_edge_delta).run(table);
    let chains = summarize_chains(table, &ranking, chain_cfg);
    debug!("chain detection: {} rows, {} chains", table.len(), chains.len());

    let Some(chain) = keep_longest(table, &chains) else {
        return Ok((RankedCandidate::absent(), None));
    };
    let jitter = edge_jitter(table, chain.span, chain_cfg.jitter_edge_delta);
    debug!(
        "longest chain: rows {}..{}, mean x {:.1}, jitter {jitter}",
        chain.span.start,
        chain.span.end(),
        chain.mean_x
    );

    if cfg.display {
        for i in chain.span.start..chain.span.end() {
            if let Some(p) = table.live_primary(i) {
                overlay.add_point(p.position, p.row, Color::Green);
            }
        }
    }

    let Some(features) = extract_features(img, table, &chain, cfg)? else {
        debug!("chain box rejected");
        return Ok((RankedCandidate::absent(), Some(jitter)));
    };

    let contrast = grey_contrast(img, features.bbox, features.left_x, features.right_x, m)
        .unwrap_or_else(|e| {
            debug!("grey contrast unavailable: {e}");
            GreyContrast::NEUTRAL
        });

    if cfg.display {
        draw_features(&features, overlay);
    }

    Ok((
        RankedCandidate::present(assemble(&features, contrast)),
        Some(jitter),
    ))
}

fn assemble(f: &ChainFeatures, contrast: GreyContrast) -> Candidate {
    Candidate {
        bbox: f.bbox,
        width: f.width,
        length: f.bbox.y2 - f.bbox.y1,
        gradient: round_half_up(f.gradient),
        grey_gap: round_half_up(f.gap_grey),
        grey_inside: round_half_up(contrast.inside),
        grey_outside: round_half_up(contrast.outside),
        std_deviation: round_half_up(STD_SCALE * f.std_deviation()),
        developed_length_left: round_half_up(f.developed_left * DEVELOPED_SCALE),
        developed_length_right: round_half_up(f.developed_right * DEVELOPED_SCALE),
    }
}

fn draw_features(f: &ChainFeatures, overlay: &mut dyn OverlaySink) {
    for s in &f.samples {
        overlay.add_point(s.left, s.row, Color::Red);
        overlay.add_point(s.right, s.row, Color::Blue);
    }
    let b = f.bbox;
    overlay.add_rectangle(b.x1, b.y1, b.x2 - b.x1, b.y2 - b.y1, Color::Yellow);
}
