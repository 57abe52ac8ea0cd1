//! Linking of per-row minima into vertical chains.
//!
//! Pipeline, in call order:
//! - [`RowMinimaTable::push_row`] stores up to three minima per scanned row
//!   and links each to a compatible minimum of the previous row.
//! - [`RowMinimaTable::kill_short_fragments`], [`RowMinimaTable::pack`] and
//!   [`RowMinimaTable::eliminate_multi_minima`] reduce the table to one
//!   unambiguous minimum per row.
//! - [`ChainBuilder`] walks the remaining minima with an explicit state
//!   machine ([`ChainState`]) that bridges single interruptions and ranks
//!   the longest chains ([`ChainRanking`]).
//! - [`summarize_chains`], [`keep_longest`] and [`edge_jitter`] restore gap
//!   rows and derive per-chain aggregates and boxes.

mod builder;
mod config;
mod summary;
mod table;

pub use builder::{
    ChainAction, ChainBuilder, ChainRanking, ChainSpan, ChainState, MAX_CHAINS, RowObservation,
};
pub use config::ChainConfig;
pub use summary::{ChainSummary, chain_box, edge_jitter, keep_longest, summarize_chains};
pub use table::{GROUPS, GroupLink, MinimaRow, RowMinimaTable, RowMinimum, minima_compatible};
