//! Row scanning for dark weld-gap candidates.
//!
//! Each scan works on a band of `window_y` image rows. The band is reduced to
//! a box-filtered profile ([`RowProfile`]), and dark runs are located on that
//! profile:
//! - [`MultiMinimumScanner`] runs a threshold-crossing automaton
//!   ([`ScanState`]) and reports up to three minima with their edges.
//! - [`DipScanner`] finds local dips by comparing samples two columns apart,
//!   used by the histogram strategy.
//!
//! All values stay raw box sums internally; reported grey levels are divided
//! by the filter area.

mod dips;
mod profile;
mod scanner;

pub use dips::{Dip, DipConfig, DipMode, DipScanner};
pub use profile::{ProfileKernel, RowProfile};
pub use scanner::{
    MAX_MINIMA, MultiMinimumScanner, OpenMinimum, RowScan, RunLengths, ScanConfig, ScanMinimum,
    ScanMode, ScanState, Thresholds,
};
