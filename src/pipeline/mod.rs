//! Pipeline module - load, clean, reduce, evaluate and score

pub mod config;
pub mod ensemble;
pub mod error;
pub mod evaluate;
pub mod importance;
pub mod impute;
pub mod labels;
pub mod loader;
pub mod matrix;
pub mod missing;
pub mod run;
pub mod schema;
pub mod score;
pub mod split;
pub mod variance;

pub use config::{PipelineConfig, Preset, ReductionReference};
pub use error::{PipelineError, PipelineResult};
pub use evaluate::*;
pub use importance::*;
pub use impute::*;
pub use labels::*;
pub use loader::*;
pub use matrix::FeatureMatrix;
pub use missing::*;
pub use run::*;
pub use schema::{DatasetSchema, FeatureColumns};
pub use score::*;
pub use split::*;
pub use variance::*;
