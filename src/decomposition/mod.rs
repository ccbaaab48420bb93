//! Waterfall decomposition of the target primary balance

mod decomposer;
mod rows;

pub use decomposer::{decompose, Decomposer, Decomposition};
pub use rows::{stack_bars, ContributionKind, ContributionRow, WaterfallBar};
