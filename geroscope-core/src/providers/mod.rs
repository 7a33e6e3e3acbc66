//! LLM provider abstraction for abstract classification.
//!
//! The annotator and the scorer only ever see the [`AbstractClassifier`]
//! trait, so tests run against deterministic stubs with no network.

pub mod openai_compat;

use crate::error::LlmError;
use crate::record::AnnotationRecord;
use async_trait::async_trait;

pub use openai_compat::OpenAiCompatibleClassifier;

/// A capability that classifies one abstract into an annotation record.
#[async_trait]
pub trait AbstractClassifier: Send + Sync {
    /// Classify a single abstract.
    ///
    /// A response that was delivered but could not be parsed is returned as
    /// an error-marker record (`Ok`), preserving the raw text; `Err` is
    /// reserved for transport, auth, and rate-limit failures.
    async fn classify(&self, abstract_text: &str) -> Result<AnnotationRecord, LlmError>;

    /// Model identifier, used for logging.
    fn model_name(&self) -> &str;
}
