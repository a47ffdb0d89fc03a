use crate::core::optimizers::DEFAULT_LEARNING_RATE;
use serde::Deserialize;

pub const DEFAULT_JUDGE_HOST: &str = "judge0-ce.p.rapidapi.com";

/// Training hyperparameters. Every field can be omitted from a config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fixes initialization and shuffling when set.
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            batch_size: 10,
            learning_rate: DEFAULT_LEARNING_RATE,
            seed: None,
        }
    }
}

/// Remote execution service settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub api_key: Option<String>,
    pub api_host: String,
    /// Overrides `https://{api_host}`.
    pub base_url: Option<String>,
    pub health_timeout_ms: u64,
    pub submit_timeout_ms: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_host: DEFAULT_JUDGE_HOST.to_string(),
            base_url: None,
            health_timeout_ms: 5_000,
            submit_timeout_ms: 30_000,
        }
    }
}

impl JudgeConfig {
    /// Defaults overlaid with `JUDGE0_API_KEY` and `JUDGE0_API_HOST`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("JUDGE0_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(host) = std::env::var("JUDGE0_API_HOST") {
            if !host.is_empty() {
                config.api_host = host;
            }
        }
        config
    }

    // merge configs where the second overwrites the optional fields of the first
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            base_url: other.base_url.or(self.base_url),
            ..other
        }
    }

    pub fn url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.api_host),
        }
    }
}
