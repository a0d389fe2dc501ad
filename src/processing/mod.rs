/*! Corpus processing

Conversions between corpus directories and stores, and store splitting.
!*/
pub mod assign;
pub mod export;
pub mod import;
pub mod split;

pub use export::{export, export_store};
pub use import::import;
pub use split::{split, Ratios, SplitKey, SplitOptions, SubsetSummary};
