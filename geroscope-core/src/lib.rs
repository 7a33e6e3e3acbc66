//! # geroscope-core: annotation and accuracy scoring for abstract screening
//!
//! Domain library for Geroscope: a canonical annotation schema, CSV-backed
//! tables, an LLM classification seam with an OpenAI-compatible provider, a
//! sequential batch annotator, a column-wise dataset combiner, and the
//! accuracy scorer that compares model annotations against human-labeled
//! validation tables.

pub mod annotator;
pub mod combine;
pub mod config;
pub mod error;
pub mod parser;
pub mod providers;
pub mod record;
pub mod schema;
pub mod scorer;
pub mod table;

pub use annotator::Annotator;
pub use config::GeroscopeConfig;
pub use error::{ConfigError, GeroscopeError, LlmError};
pub use record::AnnotationRecord;
pub use scorer::{AccuracyReport, FieldAccuracy, score_tables};
pub use table::Table;
