use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Maximum research plan length (excess steps are dropped at planning time)
    #[serde(default = "default_max_plan_steps")]
    pub max_plan_steps: usize,

    /// Maximum refined queries per plan step
    #[serde(default = "default_max_queries_per_step")]
    pub max_queries_per_step: usize,

    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

/// Retrieval fusion parameters
///
/// Defaults match the tuned pipeline: 10 candidates per retriever, RRF with
/// the standard k=60 constant fused down to 8, MMR picking 4 at λ=0.5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Top-k for each base retriever (sparse and dense)
    pub retriever_k: usize,

    /// RRF rank constant: a document at rank r contributes 1/(rrf_k + r)
    pub rrf_k: f64,

    /// Number of documents kept after rank fusion, before reranking
    pub rrf_top_n: usize,

    /// Final selection size after MMR diversity re-selection
    pub mmr_k: usize,

    /// MMR relevance/diversity balance (1.0 = pure relevance)
    pub mmr_lambda: f32,
}

/// Bounded retry policy for idempotent read-only capability calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retry attempts
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds
    pub base_delay_ms: u64,
}

fn default_max_plan_steps() -> usize {
    4
}

fn default_max_queries_per_step() -> usize {
    2
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            retry: RetryConfig::default(),
            max_plan_steps: default_max_plan_steps(),
            max_queries_per_step: default_max_queries_per_step(),
            verbose: false,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            retriever_k: 10,
            rrf_k: 60.0,
            rrf_top_n: 8,
            mmr_k: 4,
            mmr_lambda: 0.5,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = PipelineConfig::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: PipelineConfig = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;
        Ok(home.join(".config").join("paperscout").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retrieval_constants() {
        let config = RetrievalConfig::default();
        assert_eq!(config.retriever_k, 10);
        assert_eq!(config.rrf_k, 60.0);
        assert_eq!(config.rrf_top_n, 8);
        assert_eq!(config.mmr_k, 4);
        assert_eq!(config.mmr_lambda, 0.5);
    }

    #[test]
    fn test_default_pipeline_bounds() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_plan_steps, 4);
        assert_eq!(config.max_queries_per_step, 2);
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = PipelineConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: PipelineConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.retrieval.rrf_top_n, config.retrieval.rrf_top_n);
        assert_eq!(parsed.retry.max_retries, config.retry.max_retries);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: PipelineConfig = toml::from_str("verbose = true").unwrap();
        assert!(parsed.verbose);
        assert_eq!(parsed.retrieval.mmr_k, 4);
        assert_eq!(parsed.max_plan_steps, 4);
    }
}
