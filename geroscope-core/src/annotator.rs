//! Batch annotation: drive the classifier over a set of abstracts with
//! fixed pacing between calls and between batches.

use crate::config::BatchConfig;
use crate::providers::AbstractClassifier;
use crate::record::AnnotationRecord;
use crate::schema;
use crate::table::Table;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Sequential annotation runner.
///
/// One classify call per abstract; a per-abstract failure is recorded as an
/// error marker and the run continues. The pacing sleeps are the only
/// suspension points; there is no cross-request concurrency.
pub struct Annotator {
    classifier: Arc<dyn AbstractClassifier>,
    config: BatchConfig,
}

impl Annotator {
    pub fn new(classifier: Arc<dyn AbstractClassifier>, config: BatchConfig) -> Self {
        Self { classifier, config }
    }

    /// Annotate all abstracts in fixed-size batches.
    pub async fn run_batch(&self, abstracts: &[String]) -> Vec<AnnotationRecord> {
        let batch_size = self.config.batch_size.max(1);
        let mut results = Vec::with_capacity(abstracts.len());

        for (batch_index, batch) in abstracts.chunks(batch_size).enumerate() {
            for abstract_text in batch {
                results.push(self.classify_one(abstract_text).await);
                sleep(Duration::from_millis(self.config.inter_call_delay_ms)).await;
            }

            info!(
                "Processed batch {}, {}/{} abstracts completed",
                batch_index + 1,
                results.len(),
                abstracts.len()
            );
            sleep(Duration::from_millis(self.config.inter_batch_delay_ms)).await;
        }

        results
    }

    /// Annotate a random sample of up to `k` abstracts, one at a time, with
    /// the slower sample-mode pacing.
    pub async fn run_sample(&self, abstracts: &[String], k: usize) -> Vec<AnnotationRecord> {
        let mut rng = rand::thread_rng();
        let sample: Vec<&String> = abstracts
            .choose_multiple(&mut rng, k.min(abstracts.len()))
            .collect();

        let mut results = Vec::with_capacity(sample.len());
        for (i, abstract_text) in sample.iter().enumerate() {
            info!("Processing abstract {}/{}", i + 1, sample.len());
            results.push(self.classify_one(abstract_text).await);
            sleep(Duration::from_millis(self.config.sample_delay_ms)).await;
        }

        results
    }

    async fn classify_one(&self, abstract_text: &str) -> AnnotationRecord {
        match self.classifier.classify(abstract_text).await {
            Ok(record) => record,
            Err(e) => {
                warn!(model = self.classifier.model_name(), error = %e,
                      "classification call failed; recording error marker");
                AnnotationRecord::from_error(format!("An error occurred: {}", e))
            }
        }
    }
}

/// Lay annotation records out as a table: the prompt-visible fields in
/// schema order, plus an `error` column for failed rows.
pub fn records_to_table(records: &[AnnotationRecord]) -> Table {
    let mut headers: Vec<String> = schema::prompt_fields()
        .map(|f| f.name.to_string())
        .collect();
    headers.push("error".to_string());

    let rows = records
        .iter()
        .map(|record| {
            let mut row: Vec<Option<String>> = schema::prompt_fields()
                .map(|f| record.get(f.name).map(str::to_string))
                .collect();
            row.push(record.error().map(str::to_string));
            row
        })
        .collect();

    Table::from_rows(headers, rows)
}
