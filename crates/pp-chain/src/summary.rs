use pp_core::{LineFit, LineRegression, PixelBox};
use serde::Serialize;

use crate::builder::{ChainRanking, ChainSpan};
use crate::config::ChainConfig;
use crate::table::RowMinimaTable;

/// Grey level reported for a chain without a usable minimum.
const NO_GREY: f64 = 200.0;

/// Aggregates of one chain after gap filling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChainSummary {
    pub span: ChainSpan,
    /// Position over image row; `None` if the chain had too few live points.
    #[serde(skip)]
    pub fit: Option<LineFit>,
    pub mean_grey: f64,
    pub mean_x: f64,
    pub min_x: i32,
    pub max_x: i32,
    pub bbox: PixelBox,
}

impl ChainSummary {
    /// Horizontal spread of the chain positions, inclusive.
    pub fn x_extent(&self) -> i32 {
        self.max_x - self.min_x + 1
    }
}

fn fit_chain(table: &RowMinimaTable, span: ChainSpan) -> Option<LineFit> {
    let mut reg = LineRegression::new();
    for i in span.start..span.end() {
        if let Some(m) = table.live_primary(i) {
            reg.add(m.row as f64, m.position as f64);
        }
    }
    reg.fit()
}

/// Box around a chain: `box_half_width` either side of the mean x, spanning
/// the chain's scanned rows.
pub fn chain_box(table: &RowMinimaTable, span: ChainSpan, mean_x: f64, cfg: &ChainConfig) -> PixelBox {
    let y1 = table.image_row(span.start).unwrap_or(0);
    let len = span.len as i32;
    PixelBox::new(
        (mean_x - cfg.box_half_width + 0.5) as i32,
        y1,
        (mean_x + cfg.box_half_width + 0.5) as i32,
        y1 + cfg.row_stride * len - cfg.row_stride,
    )
}

/// Fits a line through each ranked chain, restores the gap rows inside it
/// from that line, deletes every minimum outside all chains and returns
/// the per-chain aggregates in ranking order.
pub fn summarize_chains(
    table: &mut RowMinimaTable,
    ranking: &ChainRanking,
    cfg: &ChainConfig,
) -> Vec<ChainSummary> {
    let fits: Vec<_> = ranking
        .chains()
        .iter()
        .map(|&span| fit_chain(table, span))
        .collect();

    let mut acc: Vec<(f64, usize, f64, i32, i32)> =
        vec![(0.0, 0, 0.0, i32::MAX, i32::MIN); ranking.chains().len()];

    for i in 0..table.len() {
        let Some(c) = ranking.chains().iter().rposition(|s| s.contains(i)) else {
            table.delete_primary(i);
            continue;
        };

        let restored = table.primary(i).is_none_or(|m| m.deleted);
        if restored {
            table.fill_primary_edges(i);
            let image_row = table.image_row(i).unwrap_or(0);
            let position = match fits[c] {
                Some(fit) => (fit.eval(image_row as f64) + 0.5) as i32,
                None => table.primary(i).map_or(0, |m| (m.left + m.right) / 2),
            };
            if let Some(m) = table.slot_mut(i, 0) {
                m.position = position;
                m.deleted = false;
            }
        }

        let Some(m) = table.primary(i) else {
            continue;
        };
        let a = &mut acc[c];
        if !restored && m.grey < cfg.bright_grey {
            a.0 += m.grey as f64;
            a.1 += 1;
        }
        a.2 += m.position as f64;
        a.3 = a.3.min(m.position);
        a.4 = a.4.max(m.position);
    }

    ranking
        .chains()
        .iter()
        .zip(fits)
        .zip(acc)
        .map(|((&span, fit), (grey, n, sx, min_x, max_x))| {
            let mean_grey = if n > 0 { grey / n as f64 } else { NO_GREY };
            let mean_x = sx / span.len as f64;
            ChainSummary {
                span,
                fit,
                mean_grey,
                mean_x,
                min_x,
                max_x,
                bbox: chain_box(table, span, mean_x, cfg),
            }
        })
        .collect()
}

/// Keeps the first (longest) chain and deletes the minima of all others.
pub fn keep_longest(table: &mut RowMinimaTable, chains: &[ChainSummary]) -> Option<ChainSummary> {
    let (longest, rest) = chains.split_first()?;
    for c in rest {
        for i in c.span.start..c.span.end() {
            table.delete_primary(i);
        }
    }
    Some(*longest)
}

/// True when both the left and the right edges of the chain wander by more
/// than `max_delta` pixels, which is how a real seam flank behaves.
pub fn edge_jitter(table: &RowMinimaTable, span: ChainSpan, max_delta: i32) -> bool {
    let mut edges = (span.start..span.end())
        .filter_map(|i| table.primary(i))
        .map(|m| (m.left, m.right));
    let Some((l0, r0)) = edges.next() else {
        return false;
    };
    let (mut lmin, mut lmax, mut rmin, mut rmax) = (l0, l0, r0, r0);
    for (l, r) in edges {
        lmin = lmin.min(l);
        lmax = lmax.max(l);
        rmin = rmin.min(r);
        rmax = rmax.max(r);
    }
    lmax - lmin > max_delta && rmax - rmin > max_delta
}

#[cfg(test)]
mod tests {
    use pp_scan::ScanMinimum;

    use super::{edge_jitter, keep_longest, summarize_chains};
    use crate::builder::{ChainBuilder, ChainRanking, ChainSpan};
    use crate::config::ChainConfig;
    use crate::table::RowMinimaTable;

    fn table(rows: &[Option<(i32, i32, i32)>]) -> RowMinimaTable {
        let mut t = RowMinimaTable::new(rows.len());
        for (i, r) in rows.iter().enumerate() {
            let minima: Vec<ScanMinimum> = r
                .iter()
                .map(|&(left, right, grey)| ScanMinimum {
                    left,
                    right,
                    position: (left + right) / 2,
                    grey,
                    flat: false,
                })
                .collect();
            t.push_row(10 * i as i32, &minima, 40, 5).expect("capacity");
        }
        t
    }

    #[test]
    fn gap_row_is_restored_from_fit() {
        let mut rows: Vec<_> = (0..10).map(|_| Some((100, 110, 40))).collect();
        rows[4] = None;
        let mut t = table(&rows);
        let ranking = ChainBuilder::new(5).run(&mut t);
        let cfg = ChainConfig::default();
        let chains = summarize_chains(&mut t, &ranking, &cfg);

        assert_eq!(chains.len(), 1);
        let c = chains[0];
        let gap = t.live_primary(4).expect("restored");
        assert_eq!((gap.left, gap.right, gap.position), (100, 110, 105));
        assert!((c.mean_grey - 40.0).abs() < 1e-9);
        assert!((c.mean_x - 105.0).abs() < 1e-9);
        assert_eq!((c.min_x, c.max_x), (105, 105));
        assert_eq!((c.bbox.x1, c.bbox.x2), (70, 140));
        assert_eq!((c.bbox.y1, c.bbox.y2), (0, 90));
    }

    #[test]
    fn minima_outside_chains_are_deleted() {
        let mut rows: Vec<_> = (0..8).map(|_| Some((50, 60, 30))).collect();
        rows.push(None);
        rows.push(None);
        rows.push(Some((150, 160, 30)));
        let mut t = table(&rows);
        let ranking = ChainBuilder::new(5).run(&mut t);
        summarize_chains(&mut t, &ranking, &ChainConfig::default());
        assert!(t.live_primary(10).is_none());
        assert!(t.live_primary(7).is_some());
    }

    #[test]
    fn bright_minima_default_the_mean_grey() {
        let rows: Vec<_> = (0..6).map(|_| Some((50, 60, 220))).collect();
        let mut t = table(&rows);
        let ranking = ChainBuilder::new(5).run(&mut t);
        let chains = summarize_chains(&mut t, &ranking, &ChainConfig::default());
        assert!((chains[0].mean_grey - 200.0).abs() < 1e-9);
    }

    #[test]
    fn only_longest_chain_survives() {
        let mut rows: Vec<_> = (0..10).map(|_| Some((50, 60, 30))).collect();
        rows.extend([None, None]);
        rows.extend((0..5).map(|_| Some((150, 160, 30))));
        let mut t = table(&rows);
        let ranking = ChainBuilder::new(5).run(&mut t);
        assert_eq!(ranking.chains().len(), 2);
        let chains = summarize_chains(&mut t, &ranking, &ChainConfig::default());
        let kept = keep_longest(&mut t, &chains).expect("chain");
        assert_eq!(kept.span, ChainSpan { start: 0, len: 10 });
        assert!((0..10).all(|i| t.live_primary(i).is_some()));
        assert!((12..17).all(|i| t.live_primary(i).is_none()));
        assert!(keep_longest(&mut t, &[]).is_none());
        assert!(ChainRanking::new().longest().is_none());
    }

    #[test]
    fn jitter_needs_both_edges_to_wander() {
        let steady: Vec<_> = (0..6).map(|i| Some((50 + i % 2, 60 + i % 2, 30))).collect();
        let t = table(&steady);
        let span = ChainSpan { start: 0, len: 6 };
        assert!(!edge_jitter(&t, span, 4));

        let one_edge: Vec<_> = (0..6).map(|i| Some((50 + 4 * i, 70, 30))).collect();
        let t = table(&one_edge);
        assert!(!edge_jitter(&t, span, 4));

        let both: Vec<_> = (0..6).map(|i| Some((50 + 3 * i, 70 + 3 * i, 30))).collect();
        let t = table(&both);
        assert!(edge_jitter(&t, span, 4));
    }
}
