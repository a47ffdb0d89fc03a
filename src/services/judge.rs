use log::{debug, error, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::config::JudgeConfig;
use crate::error::{NNError, Result};
use crate::services::sniff::Language;

pub const COMPILATION_ERROR: u32 = 6;
pub const RUNTIME_ERRORS: RangeInclusive<u32> = 7..=12;

/// Body of `POST /submissions`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Submission {
    pub language_id: u32,
    pub source_code: String,
    pub stdin: String,
    pub wait: bool,
}

/// The fields of a finished submission that we read back.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SubmissionResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    pub status: Option<SubmissionStatus>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SubmissionStatus {
    pub id: u32,
    pub description: Option<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Compilation,
    Runtime,
}

/// What a caller renders after running a program.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub output: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// Maps a finished submission onto success, compile failure or runtime failure.
pub fn classify(result: SubmissionResult) -> ExecutionReport {
    let status_id = result.status.as_ref().map(|s| s.id);
    let stdout = non_empty(result.stdout);
    let stderr = non_empty(result.stderr);

    match status_id {
        Some(COMPILATION_ERROR) => ExecutionReport {
            output: non_empty(result.compile_output)
                .unwrap_or_else(|| "Compilation Error".to_string()),
            status: RunStatus::Error,
            error_type: Some(FailureKind::Compilation),
            error: None,
        },
        Some(id) if RUNTIME_ERRORS.contains(&id) => ExecutionReport {
            output: stderr
                .or(stdout)
                .unwrap_or_else(|| "Runtime Error".to_string()),
            status: RunStatus::Error,
            error_type: Some(FailureKind::Runtime),
            error: None,
        },
        _ => ExecutionReport {
            output: stdout.unwrap_or_else(|| "No output".to_string()),
            status: RunStatus::Success,
            error_type: None,
            error: stderr,
        },
    }
}

/// Client for a Judge0-compatible execution service.
#[derive(Debug, Clone)]
pub struct JudgeClient {
    http: Client,
    config: JudgeConfig,
    api_key: String,
}

impl JudgeClient {
    pub fn new(config: JudgeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(NNError::MissingApiKey)?;
        let http = Client::builder().build().map_err(NNError::Transport)?;
        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.config.api_host)
    }

    /// `GET /about`; anything but 200 means the service is unavailable.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/about", self.config.url());
        let response = self
            .authorize(self.http.get(&url))
            .timeout(Duration::from_millis(self.config.health_timeout_ms))
            .send()
            .await
            .map_err(|e| {
                warn!("health check against {} failed: {}", url, e);
                NNError::from(e)
            })?;

        if response.status() != StatusCode::OK {
            warn!("health check returned {}", response.status());
            return Err(NNError::ServiceUnavailable(format!(
                "health check returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// `POST /submissions?wait=true`, waiting for the verdict.
    pub async fn submit(&self, submission: &Submission) -> Result<SubmissionResult> {
        let url = format!("{}/submissions?wait=true", self.config.url());
        let response = self
            .authorize(self.http.post(&url))
            .json(submission)
            .timeout(Duration::from_millis(self.config.submit_timeout_ms))
            .send()
            .await
            .map_err(|e| {
                error!("submission to {} failed: {}", url, e);
                NNError::from(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let detail = response.text().await.unwrap_or_else(|e| {
                warn!("could not read error body from {}: {}", url, e);
                String::new()
            });
            let detail = if detail.is_empty() {
                "No error details available".to_string()
            } else {
                detail
            };
            error!("Judge0 API error {}: {}", status, detail);
            return Err(NNError::ServiceError {
                status: status.as_u16(),
                detail,
            });
        }

        let result = response.json::<SubmissionResult>().await?;
        debug!("submission finished with status {:?}", result.status);
        Ok(result)
    }

    /// Runs `code` as `language` and classifies the outcome.
    pub async fn execute(&self, code: &str, language: &str) -> Result<ExecutionReport> {
        let language: Language = language.parse()?;
        let language_id = language
            .judge_id()
            .ok_or_else(|| NNError::UnsupportedLanguage(language.to_string()))?;

        self.health_check().await?;
        let submission = Submission {
            language_id,
            source_code: code.to_string(),
            stdin: String::new(),
            wait: true,
        };
        let result = self.submit(&submission).await?;
        Ok(classify(result))
    }
}
