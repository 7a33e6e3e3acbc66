//! Subcommand handlers for the Geroscope CLI.

use anyhow::Context;
use geroscope_core::annotator::{Annotator, records_to_table};
use geroscope_core::combine::combine_tables;
use geroscope_core::config::GeroscopeConfig;
use geroscope_core::providers::OpenAiCompatibleClassifier;
use geroscope_core::scorer::{AccuracyReport, score_tables};
use geroscope_core::table::Table;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub struct AnnotateArgs {
    pub input: PathBuf,
    pub column: Option<String>,
    pub output: PathBuf,
    pub limit: Option<usize>,
    pub sample: Option<usize>,
    pub encoding: Option<String>,
    pub model: Option<String>,
}

/// Run batch (or sample) annotation over the abstracts in the input file.
pub async fn annotate(config: &GeroscopeConfig, args: AnnotateArgs) -> anyhow::Result<()> {
    let encoding = args
        .encoding
        .as_deref()
        .unwrap_or(&config.data.validation_encoding);
    let table = Table::read_csv_with_encoding(&args.input, encoding)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let column = args
        .column
        .as_deref()
        .unwrap_or(&config.data.abstract_column);
    let mut abstracts = table.non_empty_column(column).with_context(|| {
        format!(
            "the required column '{}' was not found in {}",
            column,
            args.input.display()
        )
    })?;

    if let Some(limit) = args.limit {
        abstracts.truncate(limit);
    }
    anyhow::ensure!(!abstracts.is_empty(), "no abstracts found in column '{}'", column);

    let mut llm_config = config.llm.clone();
    if let Some(model) = args.model {
        llm_config.model = model;
    }
    let classifier = Arc::new(OpenAiCompatibleClassifier::new(&llm_config)?);
    let annotator = Annotator::new(classifier, config.batch.clone());

    if let Some(k) = args.sample {
        println!("\n=== RUNNING RANDOM SAMPLE PROCESSING ===");
        let records = annotator.run_sample(&abstracts, k).await;
        for record in &records {
            println!("{}", serde_json::to_string_pretty(&record.to_json())?);
        }
        return Ok(());
    }

    println!("\n=== RUNNING BATCH PROCESSING ===");
    info!(total = abstracts.len(), model = %llm_config.model, "starting batch annotation");
    let records = annotator.run_batch(&abstracts).await;

    records_to_table(&records).write_csv(&args.output)?;
    println!("Batch results saved to {}", args.output.display());

    let failed = records.iter().filter(|r| r.is_error()).count();
    if failed > 0 {
        println!("{} of {} abstracts recorded an error marker", failed, records.len());
    }

    Ok(())
}

/// Merge per-rater tables column-wise and write the combined CSV.
pub fn combine(inputs: &[PathBuf], output: &Path) -> anyhow::Result<()> {
    let mut tables = Vec::with_capacity(inputs.len());
    for path in inputs {
        let table = Table::read_csv(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        tables.push(table);
    }

    let combined = combine_tables(&tables);
    combined.write_csv(output)?;
    println!("Combined results saved to {}", output.display());
    Ok(())
}

/// Score results against validation and print the accuracy report.
pub fn score(
    config: &GeroscopeConfig,
    results_path: &Path,
    validation_path: &Path,
    validation_encoding: Option<&str>,
) -> anyhow::Result<()> {
    let results = Table::read_csv(results_path)
        .with_context(|| format!("failed to read {}", results_path.display()))?;

    let encoding = validation_encoding.unwrap_or(&config.data.validation_encoding);
    let validation = Table::read_csv_with_encoding(validation_path, encoding)
        .with_context(|| format!("failed to read {}", validation_path.display()))?;

    let report = score_tables(&results, &validation);
    print_report(&report);
    Ok(())
}

fn print_report(report: &AccuracyReport) {
    println!("\n=== ACCURACY RESULTS ===");
    for score in &report.fields {
        println!(
            "{:<25}: {:.2}% ({}/{})",
            score.field,
            score.metrics.accuracy,
            score.metrics.correct_count,
            score.metrics.total_count
        );
    }

    println!("\n=== OVERALL ACCURACY ===");
    println!(
        "Overall Accuracy: {:.2}% ({}/{})",
        report.overall.accuracy, report.overall.correct_count, report.overall.total_count
    );
}
