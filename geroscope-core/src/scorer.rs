//! Accuracy scoring: align a results table with a validation table and
//! aggregate per-field and overall accuracy.
//!
//! Alignment is positional: row `i` of the results table must describe the
//! same abstract as row `i` of the validation table. That ordering contract
//! is a precondition of [`score_tables`]; a length mismatch is logged and
//! the longer table truncated, but reordered or independently filtered
//! inputs cannot be detected here.

use crate::schema::{self, CompareRule, FieldSpec};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Accuracy counts for one scored field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldAccuracy {
    /// Percentage in `[0, 100]`; `0.0` when nothing was comparable.
    pub accuracy: f64,
    pub correct_count: usize,
    pub total_count: usize,
}

impl FieldAccuracy {
    fn from_counts(correct_count: usize, total_count: usize) -> Self {
        let accuracy = if total_count > 0 {
            correct_count as f64 / total_count as f64 * 100.0
        } else {
            0.0
        };
        Self { accuracy, correct_count, total_count }
    }
}

/// One field's entry in an accuracy report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldScore {
    pub field: String,
    pub metrics: FieldAccuracy,
}

/// Per-field accuracy in schema order, plus the overall aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub fields: Vec<FieldScore>,
    pub overall: FieldAccuracy,
}

impl AccuracyReport {
    /// Metrics for a named field, if it was scorable.
    pub fn get(&self, field: &str) -> Option<&FieldAccuracy> {
        self.fields
            .iter()
            .find(|score| score.field == field)
            .map(|score| &score.metrics)
    }
}

/// Score a results table against a validation table.
///
/// Only fields present in both tables are scored; each absent field is
/// skipped with a warning. The gating field is scored first and ungated;
/// every other field counts a row only when the validation table's gate
/// cell parses to exactly `1`. Missing cells are excluded from both the
/// numerator and the denominator.
pub fn score_tables(results: &Table, validation: &Table) -> AccuracyReport {
    if results.len() != validation.len() {
        warn!(
            results_rows = results.len(),
            validation_rows = validation.len(),
            "row counts differ; truncating to the shorter table"
        );
    }
    let num_rows = results.len().min(validation.len());

    let mut scorable: Vec<(&FieldSpec, usize, usize)> = Vec::new();
    for spec in schema::ANNOTATION_FIELDS {
        match (results.column(spec.name), validation.column(spec.name)) {
            (Some(res_col), Some(val_col)) => scorable.push((spec, res_col, val_col)),
            _ => warn!(field = spec.name, "column not found in both datasets, skipping"),
        }
    }

    // The gate reads the validation table even when the gating field itself
    // is not scorable. An absent gate column disables gating entirely.
    let gate_col = validation.column(schema::GATE_FIELD);

    let mut fields = Vec::with_capacity(scorable.len());
    let mut total_correct = 0;
    let mut total_comparisons = 0;

    for (spec, res_col, val_col) in scorable {
        let gated = spec.name != schema::GATE_FIELD;
        let mut correct_count = 0;
        let mut total_count = 0;

        for row in 0..num_rows {
            if gated {
                if let Some(gate_col) = gate_col {
                    if !gate_open(validation.cell(row, gate_col)) {
                        continue;
                    }
                }
            }

            let res = results.cell(row, res_col);
            let val = validation.cell(row, val_col);

            match spec.rule {
                CompareRule::Country => {
                    let Some(res) = res else { continue };
                    let res = res.trim().to_uppercase();
                    // An empty validation cell means "no country given", so
                    // it stays comparable instead of being skipped.
                    let val = val.map(|v| v.trim().to_uppercase()).unwrap_or_default();

                    let both_no_country = matches!(res.as_str(), "NA" | "N/A")
                        && matches!(val.as_str(), "" | "0" | "NAN" | "NA" | "N/A");
                    if both_no_country || res == val {
                        correct_count += 1;
                    }
                    total_count += 1;
                }
                CompareRule::Exact => {
                    let (Some(res), Some(val)) = (res, val) else { continue };
                    if res.trim() == val.trim() {
                        correct_count += 1;
                    }
                    total_count += 1;
                }
            }
        }

        total_correct += correct_count;
        total_comparisons += total_count;
        fields.push(FieldScore {
            field: spec.name.to_string(),
            metrics: FieldAccuracy::from_counts(correct_count, total_count),
        });
    }

    AccuracyReport {
        fields,
        overall: FieldAccuracy::from_counts(total_correct, total_comparisons),
    }
}

/// Whether a gate cell admits the row: present and parsing to exactly 1.
/// Accepts the float rendition (`1.0`) produced by some spreadsheet exports.
fn gate_open(cell: Option<&str>) -> bool {
    let Some(cell) = cell else { return false };
    let trimmed = cell.trim();
    trimmed
        .parse::<i64>()
        .map(|v| v == 1)
        .or_else(|_| trimmed.parse::<f64>().map(|v| v == 1.0))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| {
                            if cell.is_empty() {
                                None
                            } else {
                                Some(cell.to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn test_exact_match_counts() {
        let results = table(&["aging_related"], &[&["1"], &["0"], &["1"]]);
        let validation = table(&["aging_related"], &[&["1"], &["1"], &["1"]]);
        let report = score_tables(&results, &validation);

        let aging = report.get("aging_related").unwrap();
        assert_eq!(aging.correct_count, 2);
        assert_eq!(aging.total_count, 3);
        assert!((aging.accuracy - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_missing_cell_skipped_not_penalized() {
        let results = table(&["aging_related"], &[&["1"], &[""], &["0"]]);
        let validation = table(&["aging_related"], &[&["1"], &["1"], &[""]]);
        let report = score_tables(&results, &validation);

        let aging = report.get("aging_related").unwrap();
        assert_eq!(aging.correct_count, 1);
        assert_eq!(aging.total_count, 1);
        assert_eq!(aging.accuracy, 100.0);
    }

    #[test]
    fn test_gate_uses_validation_value_only() {
        // Results claim aging_related = 1 everywhere, but validation gates
        // row 1 closed; country there must not count despite matching.
        let results = table(
            &["aging_related", "country"],
            &[&["1", "USA"], &["1", "USA"]],
        );
        let validation = table(
            &["aging_related", "country"],
            &[&["1", "USA"], &["0", "USA"]],
        );
        let report = score_tables(&results, &validation);

        let country = report.get("country").unwrap();
        assert_eq!(country.correct_count, 1);
        assert_eq!(country.total_count, 1);
    }

    #[test]
    fn test_gate_missing_value_closes_row() {
        let results = table(&["aging_related", "empirical"], &[&["1", "1"]]);
        let validation = table(&["aging_related", "empirical"], &[&["", "1"]]);
        let report = score_tables(&results, &validation);

        let empirical = report.get("empirical").unwrap();
        assert_eq!(empirical.total_count, 0);
        assert_eq!(empirical.accuracy, 0.0);
    }

    #[test]
    fn test_gate_accepts_float_form() {
        let results = table(&["aging_related", "empirical"], &[&["1", "1"]]);
        let validation = table(&["aging_related", "empirical"], &[&["1.0", "1"]]);
        let report = score_tables(&results, &validation);
        assert_eq!(report.get("empirical").unwrap().total_count, 1);
    }

    #[test]
    fn test_country_case_insensitive() {
        let results = table(
            &["aging_related", "country"],
            &[&["1", "USA"], &["1", "FRANCE"]],
        );
        let validation = table(
            &["aging_related", "country"],
            &[&["1", "usa"], &["1", "GERMANY"]],
        );
        let report = score_tables(&results, &validation);

        let country = report.get("country").unwrap();
        assert_eq!(country.correct_count, 1);
        assert_eq!(country.total_count, 2);
    }

    #[test]
    fn test_country_no_country_equivalence() {
        let results = table(
            &["aging_related", "country"],
            &[&["1", "NA"], &["1", "N/A"], &["1", "NA"], &["1", "NA"]],
        );
        let validation = table(
            &["aging_related", "country"],
            &[&["1", ""], &["1", "0"], &["1", "nan"], &["1", "n/a"]],
        );
        let report = score_tables(&results, &validation);

        let country = report.get("country").unwrap();
        assert_eq!(country.correct_count, 4);
        assert_eq!(country.total_count, 4);
    }

    #[test]
    fn test_na_result_against_empty_validation_country() {
        let results = table(&["aging_related", "country"], &[&["1", "NA"]]);
        let validation = table(&["aging_related", "country"], &[&["1", ""]]);
        let report = score_tables(&results, &validation);

        assert_eq!(report.get("aging_related").unwrap().accuracy, 100.0);
        assert_eq!(report.get("country").unwrap().accuracy, 100.0);
        assert_eq!(report.overall.correct_count, 2);
        assert_eq!(report.overall.total_count, 2);
        assert_eq!(report.overall.accuracy, 100.0);
    }

    #[test]
    fn test_closed_gate_excludes_row_for_all_other_fields() {
        let results = table(
            &["aging_related", "theoretical_conceptual", "country"],
            &[&["0", "1", "USA"]],
        );
        let validation = table(
            &["aging_related", "theoretical_conceptual", "country"],
            &[&["0", "1", "USA"]],
        );
        let report = score_tables(&results, &validation);

        // aging_related itself is ungated and matches.
        assert_eq!(report.get("aging_related").unwrap().total_count, 1);
        // Everything else is excluded by the closed gate.
        assert_eq!(report.get("theoretical_conceptual").unwrap().total_count, 0);
        assert_eq!(report.get("country").unwrap().total_count, 0);
    }

    #[test]
    fn test_absent_field_excluded_entirely() {
        let results = table(&["aging_related", "empirical"], &[&["1", "1"]]);
        let validation = table(&["aging_related"], &[&["1"]]);
        let report = score_tables(&results, &validation);

        assert!(report.get("empirical").is_none());
        assert_eq!(report.fields.len(), 1);
        assert_eq!(report.overall.total_count, 1);
    }

    #[test]
    fn test_truncates_to_shorter_table() {
        let results = table(&["aging_related"], &[&["1"], &["1"], &["1"]]);
        let validation = table(&["aging_related"], &[&["1"]]);
        let report = score_tables(&results, &validation);
        assert_eq!(report.get("aging_related").unwrap().total_count, 1);
    }

    #[test]
    fn test_overall_sums_field_counts() {
        let results = table(
            &["aging_related", "country", "empirical"],
            &[&["1", "USA", "1"], &["1", "JAPAN", "0"], &["0", "NA", "1"]],
        );
        let validation = table(
            &["aging_related", "country", "empirical"],
            &[&["1", "usa", "1"], &["1", "CHINA", "0"], &["1", "", "1"]],
        );
        let report = score_tables(&results, &validation);

        let sum_correct: usize = report.fields.iter().map(|f| f.metrics.correct_count).sum();
        let sum_total: usize = report.fields.iter().map(|f| f.metrics.total_count).sum();
        assert_eq!(report.overall.correct_count, sum_correct);
        assert_eq!(report.overall.total_count, sum_total);

        for score in &report.fields {
            assert!(score.metrics.correct_count <= score.metrics.total_count);
            assert!((0.0..=100.0).contains(&score.metrics.accuracy));
        }
    }

    #[test]
    fn test_empty_tables_yield_zero_overall() {
        let results = table(&["aging_related"], &[]);
        let validation = table(&["aging_related"], &[]);
        let report = score_tables(&results, &validation);
        assert_eq!(report.overall.total_count, 0);
        assert_eq!(report.overall.accuracy, 0.0);
    }

    #[test]
    fn test_idempotent() {
        let results = table(
            &["aging_related", "country"],
            &[&["1", "NA"], &["0", "USA"], &["1", "KENYA"]],
        );
        let validation = table(
            &["aging_related", "country"],
            &[&["1", ""], &["1", "USA"], &["1", "KENYA"]],
        );
        let first = score_tables(&results, &validation);
        let second = score_tables(&results, &validation);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fields_reported_in_schema_order() {
        let results = table(
            &["country", "aging_related", "empirical"],
            &[&["USA", "1", "1"]],
        );
        let validation = table(
            &["empirical", "country", "aging_related"],
            &[&["1", "USA", "1"]],
        );
        let report = score_tables(&results, &validation);

        let names: Vec<&str> = report.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["aging_related", "country", "empirical"]);
    }
}
