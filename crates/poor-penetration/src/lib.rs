//! Umbrella crate for the `poor-penetration` workspace.
//!
//! Re-exports the image primitives, row scanners, chain linking, the
//! detector and the candidate checkers.

pub use pp_chain::*;
pub use pp_check::*;
pub use pp_core::*;
pub use pp_detect::*;
pub use pp_scan::*;
