//! Canonical annotation schema.
//!
//! Single source of truth for the fields the model is asked to produce and
//! the scorer compares. Both the classification prompt and the scorer's
//! field table derive from this list, so the requested keys and the scored
//! columns cannot drift apart.

/// Comparison rule applied when scoring a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareRule {
    /// Trimmed string equality on the textual cell value.
    Exact,
    /// Trimmed, upper-cased comparison where `NA`/`N/A` on the results side
    /// matches any "no country given" rendition on the validation side.
    Country,
}

/// One annotation field: column name, scoring rule, and (for the axes the
/// model is asked about) the numbered instruction shown in the prompt.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rule: CompareRule,
    /// Prompt instruction line; `None` for coding-scheme fields that only
    /// appear in human annotation files.
    pub instruction: Option<&'static str>,
}

/// Gating field: all other fields score only on rows where the validation
/// table marks this field as `1`.
pub const GATE_FIELD: &str = "aging_related";

/// System message sent with every classification request.
pub const SYSTEM_PROMPT: &str = "The following is a conversation with an AI assistant.";

/// Canonical field list, in column and report order.
pub const ANNOTATION_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "aging_related",
        rule: CompareRule::Exact,
        instruction: Some(
            "Determine if the abstract is relevant to gerontology in general \
             (such as healthy aging), (answer with 1 FOR 'YES' or 0 FOR 'NO').",
        ),
    },
    FieldSpec {
        name: "theoretical_conceptual",
        rule: CompareRule::Exact,
        instruction: Some(
            "Identify if the abstract is purely theoretical or conceptual \
             (answer with 1 FOR 'YES' or 0 FOR 'NO').",
        ),
    },
    FieldSpec {
        name: "review_type",
        rule: CompareRule::Exact,
        instruction: Some(
            "Identify if the abstract is a scoping review, systematic review, \
             meta-analysis review, narrative review, or other type of review \
             (answer with 1 FOR 'YES' or 0 FOR 'NO').",
        ),
    },
    FieldSpec {
        name: "country",
        rule: CompareRule::Country,
        instruction: Some(
            "Identify the country the abstract is based in (answer with 'COUNTRY' \
             IN ALL CAPS). If there is no country mentioned, answer with 'NA'.",
        ),
    },
    FieldSpec { name: "draws_from_education_aghe", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "draws_from_bss", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "draws_from_biosci", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "draws_from_hs", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "draws_from_srpp", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "draws_from_humanities", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "empirical", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "qualitative", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "uses_interviews", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "uses_observation", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "uses_focus_groups", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "uses_content_review", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "quantitative", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "uses_secondary_data", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "uses_primary_data", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "other_quant_method", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "mixed_methods", rule: CompareRule::Exact, instruction: None },
    FieldSpec { name: "other_method", rule: CompareRule::Exact, instruction: None },
];

/// Fields the model is asked to produce, in prompt order.
pub fn prompt_fields() -> impl Iterator<Item = &'static FieldSpec> {
    ANNOTATION_FIELDS.iter().filter(|f| f.instruction.is_some())
}

/// Look up a field spec by column name.
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    ANNOTATION_FIELDS.iter().find(|f| f.name == name)
}

/// Build the classification prompt for one abstract.
///
/// The instruction list and the required JSON key names are both derived
/// from [`ANNOTATION_FIELDS`].
pub fn build_classification_prompt(abstract_text: &str) -> String {
    let mut prompt = String::from(
        "Analyze the following journal paper abstract and extract the information in JSON format:\n\n",
    );

    for (i, field) in prompt_fields().enumerate() {
        let instruction = field.instruction.unwrap_or_default();
        prompt.push_str(&format!("{}. {}\n", i + 1, instruction));
    }

    prompt.push_str(&format!("\nAbstract:\n{}\n\n", abstract_text));

    let keys: Vec<String> = prompt_fields().map(|f| format!("'{}'", f.name)).collect();
    let (last, rest) = keys.split_last().expect("schema has prompt fields");
    prompt.push_str(&format!(
        "Please return the response as a **valid JSON object** with the keys {}, and {} only. \
         Ensure the response is ONLY valid JSON without explanations, notes, or formatting \
         outside of JSON.",
        rest.join(", "),
        last,
    ));

    prompt
}
