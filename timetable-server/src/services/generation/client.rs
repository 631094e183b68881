use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::payload::TimetablePayload;
use crate::config::GeneratorConfig;
use crate::error::{AppError, AppResult};

/// One cell of a class grid as returned by the generator. Indices are positional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotInfo {
    pub subject_id: Option<usize>,
    pub subject_name: Option<String>,
    pub teacher_id: Option<usize>,
    pub teacher_name: Option<String>,
    pub room_id: Option<usize>,
    pub room_name: Option<String>,
    pub class_id: Option<usize>,
    pub class_name: Option<String>,
    pub day: usize,
    pub slot: usize,
    pub is_free: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassTimetable {
    pub class_id: usize,
    pub class_name: Option<String>,
    /// `timetable[day][slot]`
    pub timetable: Vec<Vec<Option<SlotInfo>>>,
}

/// Only the parts of the generator answer this service consumes; anything else
/// (teacher views, combined view, statistics) is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorResponse {
    pub success: Option<bool>,
    pub fitness_score: Option<f64>,
    pub generation_count: Option<u32>,
    pub student_timetables: Vec<ClassTimetable>,
}

#[derive(Debug, Clone)]
pub struct GeneratorClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl GeneratorClient {
    pub fn new(config: &GeneratorConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/generate-timetable", self.base_url)
    }

    pub async fn generate(&self, payload: &TimetablePayload) -> AppResult<GeneratorResponse> {
        let url = self.endpoint();
        tracing::info!(
            "Requesting timetable from {} ({} classes, {} subjects)",
            url,
            payload.num_classes,
            payload.subject_names.len()
        );

        let response = self.http.post(&url).json(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Upstream(format!(
                    "generator timed out after {}s",
                    self.timeout.as_secs()
                ))
            } else {
                AppError::Upstream(format!("generator unreachable: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(AppError::Upstream(format!(
                "generator returned {}: {}",
                status, snippet
            )));
        }

        response
            .json::<GeneratorResponse>()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid generator response: {}", e)))
    }
}
