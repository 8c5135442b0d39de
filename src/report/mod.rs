//! Report module - run summary, accuracy chart and JSON export

pub mod chart;
pub mod score_export;
pub mod summary;

pub use chart::*;
pub use score_export::*;
pub use summary::*;
