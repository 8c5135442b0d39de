//! Console helpers shared by the binary and long-running pipeline stages

pub mod progress;
pub mod styling;

pub use progress::*;
pub use styling::*;
