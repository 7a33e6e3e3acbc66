//! Configuration types and loading.
//!
//! Layered the same way as the rest of the tool's settings: hard-coded
//! defaults, then an optional `geroscope.toml`, then `GEROSCOPE_*`
//! environment variables (double underscore separates sections, e.g.
//! `GEROSCOPE_LLM__MODEL`).

use crate::error::ConfigError;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeroscopeConfig {
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Batch pacing settings.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Input data settings.
    #[serde(default)]
    pub data: DataConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "openai" or any OpenAI-compatible endpoint.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Optional base URL override for the API endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sampling temperature for classification requests.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: None,
            temperature: default_temperature(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

/// Pacing for batch annotation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Abstracts per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause after each model call (milliseconds).
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,
    /// Pause after each batch (milliseconds).
    #[serde(default = "default_inter_batch_delay_ms")]
    pub inter_batch_delay_ms: u64,
    /// Pause between calls in sample mode (milliseconds).
    #[serde(default = "default_sample_delay_ms")]
    pub sample_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            inter_call_delay_ms: default_inter_call_delay_ms(),
            inter_batch_delay_ms: default_inter_batch_delay_ms(),
            sample_delay_ms: default_sample_delay_ms(),
        }
    }
}

fn default_batch_size() -> usize {
    10
}

fn default_inter_call_delay_ms() -> u64 {
    500
}

fn default_inter_batch_delay_ms() -> u64 {
    2_000
}

fn default_sample_delay_ms() -> u64 {
    2_000
}

/// Input data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Column holding the abstract text in the input table.
    #[serde(default = "default_abstract_column")]
    pub abstract_column: String,
    /// Encoding of the validation file (any `encoding_rs` label).
    #[serde(default = "default_validation_encoding")]
    pub validation_encoding: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            abstract_column: default_abstract_column(),
            validation_encoding: default_validation_encoding(),
        }
    }
}

fn default_abstract_column() -> String {
    "Abstract".to_string()
}

fn default_validation_encoding() -> String {
    "utf-8".to_string()
}

/// Load configuration from defaults, an optional TOML file, and environment.
///
/// When `path` is given the file must exist; otherwise `geroscope.toml` in
/// the working directory is merged if present.
pub fn load_config(path: Option<&Path>) -> Result<GeroscopeConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(GeroscopeConfig::default()));

    match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound { path: path.to_path_buf() });
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            let default_path = Path::new("geroscope.toml");
            if default_path.exists() {
                figment = figment.merge(Toml::file(default_path));
            }
        }
    }

    figment
        .merge(Env::prefixed("GEROSCOPE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::Invalid { message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GeroscopeConfig::default();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.batch.batch_size, 10);
        assert_eq!(config.batch.inter_call_delay_ms, 500);
        assert_eq!(config.batch.inter_batch_delay_ms, 2_000);
        assert_eq!(config.data.abstract_column, "Abstract");
    }

    #[test]
    fn test_serde_round_trip() {
        let config = GeroscopeConfig::default();
        let toml = toml_round_trip(&config);
        assert_eq!(toml.llm.model, config.llm.model);
        assert_eq!(toml.batch.batch_size, config.batch.batch_size);
    }

    fn toml_round_trip(config: &GeroscopeConfig) -> GeroscopeConfig {
        let json = serde_json::to_string(config).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geroscope.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[llm]\nmodel = \"gpt-4o-mini\"\n\n[batch]\nbatch_size = 20\n"
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.batch.batch_size, 20);
        // Untouched sections keep their defaults.
        assert_eq!(config.batch.inter_call_delay_ms, 500);
        assert_eq!(config.data.abstract_column, "Abstract");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = load_config(Some(Path::new("/nonexistent/geroscope.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}
