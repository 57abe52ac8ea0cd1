use crate::table::{RowMinimaTable, minima_compatible};

/// Chains kept in a [`ChainRanking`].
pub const MAX_CHAINS: usize = 3;

/// Contiguous run of table rows accepted as one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ChainSpan {
    pub start: usize,
    pub len: usize,
}

impl ChainSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end()
    }
}

/// The longest chains found so far, longest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainRanking {
    chains: Vec<ChainSpan>,
}

impl ChainRanking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `span` if it is strictly longer than one of the ranked
    /// chains; shorter entries shift down and the shortest falls off.
    pub fn add_chain(&mut self, span: ChainSpan) {
        if span.len == 0 {
            return;
        }
        let at = self
            .chains
            .iter()
            .position(|c| span.len > c.len)
            .unwrap_or(self.chains.len());
        if at >= MAX_CHAINS {
            return;
        }
        self.chains.insert(at, span);
        self.chains.truncate(MAX_CHAINS);
    }

    pub fn chains(&self) -> &[ChainSpan] {
        &self.chains
    }

    pub fn longest(&self) -> Option<ChainSpan> {
        self.chains.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn clear(&mut self) {
        self.chains.clear();
    }
}

/// What the builder sees at the current row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowObservation {
    /// The row holds a live minimum.
    pub present: bool,
    /// Compatible with the minimum one row back.
    pub fits_prev: bool,
    /// Compatible with the minimum two rows back.
    pub fits_prev2: bool,
}

/// Side effect of a transition. Offsets count rows back from the current
/// one; at the end of the sequence they count back from the row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainAction {
    /// Delete the minimum `n` rows back.
    Delete(usize),
    /// Bridge the gap `n` rows back with interpolated edges.
    Fill(usize),
    /// The current row joins the chain.
    Extend,
    /// Drop the last `n` rows from the chain length.
    Trim(usize),
    /// Hand the current chain to the ranking.
    Emit,
    /// Start a new chain `back` rows back holding `len` rows.
    Begin { back: usize, len: usize },
    /// Move the chain start one row down.
    SkipStart,
}

use ChainAction::{Begin, Delete, Emit, Extend, Fill, SkipStart, Trim};

const RESTART: ChainAction = Begin { back: 0, len: 1 };

/// Chain-tracking state. A chain tolerates single-row interruptions
/// (gaps or mismatching rows) once it has enough support around them; the
/// variant names spell the tail seen so far, most recent last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainState {
    #[default]
    Idle,
    One,
    Two,
    Three,
    TwoGap,
    TwoGapOne,
    TwoGapTwo,
    ThreeGap,
    ThreeGapOne,
    /// Four or more rows without an open interruption.
    Chain,
    ChainGap,
    ChainGapOne,
    ChainGapTwo,
    ChainGapTwoGap,
    ChainGapTwoGapOne,
    ChainGapTwoGapTwo,
    ThreeGapTwo,
    TwoBad,
    ThreeBad,
    ChainBad,
    ChainBadOne,
}

impl ChainState {
    /// Transition for one row.
    pub fn step(self, obs: RowObservation) -> (ChainState, Vec<ChainAction>) {
        use ChainState::*;

        let gap = !obs.present;
        let (f1, f2) = (obs.fits_prev, obs.fits_prev2);
        // After dropping a failed tail, try to restart from the previous row.
        let reseed = |mut acts: Vec<ChainAction>| {
            if f1 {
                acts.push(Begin { back: 1, len: 2 });
                (Two, acts)
            } else {
                acts.extend([Delete(1), RESTART]);
                (One, acts)
            }
        };

        match self {
            Idle if gap => (Idle, vec![]),
            Idle => (One, vec![RESTART]),

            One if gap => (Idle, vec![Delete(1)]),
            One if f1 => (Two, vec![Extend]),
            One => (One, vec![Delete(1), SkipStart]),

            Two if gap => (TwoGap, vec![Extend]),
            Two if f1 => (Three, vec![Extend]),
            Two => (TwoBad, vec![Extend]),

            Three if gap => (ThreeGap, vec![Extend]),
            Three if f1 => (Chain, vec![Extend]),
            Three => (ThreeBad, vec![Extend]),

            TwoGap if gap => (Idle, vec![Delete(3), Delete(2)]),
            TwoGap if f2 => (TwoGapOne, vec![Extend]),
            TwoGap => (One, vec![Delete(3), Delete(2), RESTART]),

            TwoGapOne if gap => (Idle, vec![Delete(4), Delete(3), Delete(1)]),
            TwoGapOne if f1 => (TwoGapTwo, vec![Extend]),
            TwoGapOne => (One, vec![Delete(4), Delete(3), Delete(1), RESTART]),

            TwoGapTwo if gap => (TwoGap, vec![Delete(5), Delete(4), Begin { back: 2, len: 3 }]),
            TwoGapTwo if f1 => (Chain, vec![Fill(3), Extend]),
            TwoGapTwo => (TwoBad, vec![Delete(5), Delete(4), Begin { back: 2, len: 3 }]),

            ThreeGap if gap => (Idle, vec![Delete(4), Delete(3), Delete(2)]),
            ThreeGap if f2 => (ThreeGapOne, vec![Extend]),
            ThreeGap => (One, vec![Delete(4), Delete(3), Delete(2), RESTART]),

            ThreeGapOne if gap => (Idle, vec![Delete(5), Delete(4), Delete(3), Delete(1)]),
            ThreeGapOne if f1 => (ThreeGapTwo, vec![Extend]),
            ThreeGapOne => (
                One,
                vec![Delete(5), Delete(4), Delete(3), Delete(1), RESTART],
            ),

            ThreeGapTwo if gap => (ChainGapTwoGap, vec![Extend]),
            ThreeGapTwo if f1 => (Chain, vec![Fill(3), Extend]),
            ThreeGapTwo => (One, vec![Emit, RESTART]),

            Chain if gap => (ChainGap, vec![Extend]),
            Chain if f1 => (Chain, vec![Extend]),
            Chain => (ChainBad, vec![Extend]),

            ChainGap if gap => (Idle, vec![Trim(1), Emit]),
            ChainGap if f2 => (ChainGapOne, vec![Extend]),
            ChainGap => (One, vec![Trim(1), Emit, RESTART]),

            ChainGapOne if gap => (Idle, vec![Trim(2), Emit]),
            ChainGapOne if f1 => (ChainGapTwo, vec![Extend]),
            ChainGapOne => (One, vec![Delete(1), Trim(2), Emit, RESTART]),

            ChainGapTwo if gap => (ChainGapTwoGap, vec![Extend]),
            ChainGapTwo if f1 => (Chain, vec![Fill(3), Extend]),
            ChainGapTwo => (One, vec![Emit, RESTART]),

            ChainGapTwoGap if gap => (Idle, vec![Trim(1), Emit]),
            ChainGapTwoGap if f2 => (ChainGapTwoGapOne, vec![Extend]),
            ChainGapTwoGap => (One, vec![Trim(1), Emit, RESTART]),

            ChainGapTwoGapOne if gap => (Idle, vec![Delete(1), Trim(2), Emit]),
            ChainGapTwoGapOne if f1 => (ChainGapTwoGapTwo, vec![Extend]),
            ChainGapTwoGapOne => (One, vec![Delete(1), Trim(2), Emit, RESTART]),

            ChainGapTwoGapTwo if gap => (TwoGap, vec![Trim(3), Emit, Begin { back: 2, len: 3 }]),
            ChainGapTwoGapTwo if f1 => (Chain, vec![Fill(3), Fill(6), Extend]),
            ChainGapTwoGapTwo => (TwoBad, vec![Trim(3), Emit, Begin { back: 2, len: 3 }]),

            TwoBad if gap => (Idle, vec![Delete(3), Delete(2), Delete(1)]),
            TwoBad if f2 => (TwoGapOne, vec![Delete(1), Extend]),
            TwoBad => reseed(vec![Delete(3), Delete(2)]),

            ThreeBad if gap => (Idle, vec![Delete(4), Delete(3), Delete(2), Delete(1)]),
            ThreeBad if f2 => (ThreeGapOne, vec![Delete(1), Extend]),
            ThreeBad => reseed(vec![Delete(4), Delete(3), Delete(2)]),

            ChainBad if gap => (Idle, vec![Delete(1), Trim(1), Emit]),
            ChainBad if f2 => (ChainBadOne, vec![Extend]),
            ChainBad => reseed(vec![Trim(1), Emit]),

            ChainBadOne if gap => (Idle, vec![Delete(2), Delete(1), Trim(2), Emit]),
            ChainBadOne if f1 => (ChainGapTwo, vec![Delete(2), Extend]),
            ChainBadOne => (One, vec![Delete(2), Delete(1), Trim(2), Emit, RESTART]),
        }
    }

    /// Actions closing an open chain once all rows are consumed.
    pub fn finish(self) -> Vec<ChainAction> {
        use ChainState::*;

        match self {
            Chain => vec![Emit],
            ChainGap => vec![Trim(1), Emit],
            ChainGapOne => vec![Trim(2), Emit, Delete(1)],
            ChainGapTwo | ThreeGapTwo => vec![Fill(3), Emit],
            ChainGapTwoGap => vec![Fill(4), Trim(1), Emit],
            ChainGapTwoGapOne => vec![Fill(5), Trim(2), Emit, Delete(1)],
            ChainGapTwoGapTwo => vec![Fill(6), Trim(3), Emit, Delete(2), Delete(1)],
            ChainBad => vec![Trim(1), Emit, Delete(1)],
            ChainBadOne => vec![Trim(2), Emit, Delete(2), Delete(1)],
            _ => vec![],
        }
    }
}

/// Runs the chain state machine over the group-0 minima of a packed table.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    max_delta: i32,
    state: ChainState,
    start: usize,
    len: usize,
}

impl ChainBuilder {
    pub fn new(max_delta: i32) -> Self {
        Self {
            max_delta,
            state: ChainState::Idle,
            start: 0,
            len: 0,
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    fn observe(&self, table: &RowMinimaTable, i: usize) -> RowObservation {
        let Some(cur) = table.live_primary(i) else {
            return RowObservation::default();
        };
        let fits = |back: usize| {
            i.checked_sub(back)
                .and_then(|j| table.primary(j))
                .is_some_and(|p| minima_compatible(cur, p, self.max_delta))
        };
        RowObservation {
            present: true,
            fits_prev: fits(1),
            fits_prev2: fits(2),
        }
    }

    fn apply(
        &mut self,
        table: &mut RowMinimaTable,
        ranking: &mut ChainRanking,
        at: usize,
        actions: &[ChainAction],
    ) {
        for &a in actions {
            match a {
                Delete(n) => {
                    if let Some(j) = at.checked_sub(n) {
                        table.delete_primary(j);
                    }
                }
                Fill(n) => {
                    if let Some(j) = at.checked_sub(n) {
                        table.fill_primary_edges(j);
                    }
                }
                Extend => self.len += 1,
                Trim(n) => self.len = self.len.saturating_sub(n),
                Emit => {
                    log::trace!("chain rows {}..{}", self.start, self.start + self.len);
                    ranking.add_chain(ChainSpan {
                        start: self.start,
                        len: self.len,
                    });
                }
                Begin { back, len } => {
                    self.start = at.saturating_sub(back);
                    self.len = len;
                }
                SkipStart => self.start += 1,
            }
        }
    }

    /// Scans all rows of `table`, deleting minima that cannot join a chain,
    /// bridging tolerated gaps, and returns the longest chains.
    pub fn run(&mut self, table: &mut RowMinimaTable) -> ChainRanking {
        let mut ranking = ChainRanking::new();
        self.state = ChainState::Idle;
        self.start = 0;
        self.len = 0;

        for i in 0..table.len() {
            let obs = self.observe(table, i);
            let (next, actions) = self.state.step(obs);
            self.apply(table, &mut ranking, i, &actions);
            self.state = next;
        }
        let tail = self.state.finish();
        self.apply(table, &mut ranking, table.len(), &tail);
        self.state = ChainState::Idle;
        ranking
    }
}
