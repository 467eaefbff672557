//! REST endpoint handlers.
//!
//! Every response uses the same envelope: `{ success, data?, error? }`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::ai::{AnalysisResult, Analyzer, TaskKind};

pub const MISSING_FIELDS: &str = "Missing input text or function type";
pub const INVALID_FUNCTION_TYPE: &str = "Invalid function type";
pub const INVALID_BODY: &str = "Invalid JSON body";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Analyzer,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Request body for POST /api/analysis. Fields are optional so a missing
/// field gets the envelope error instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub input_text: Option<String>,
    #[serde(default)]
    pub function_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub input_text: String,
    pub function_type: TaskKind,
    pub result: AnalysisResult,
    pub created_at: DateTime<Utc>,
}

type ApiResponse = (StatusCode, Json<Envelope<AnalysisData>>);

fn reject(status: StatusCode, message: &str) -> ApiResponse {
    (status, Json(Envelope::err(message)))
}

impl AnalysisRequest {
    /// Checks required fields and resolves the task kind.
    pub fn validate(self) -> Result<(String, TaskKind), &'static str> {
        let input_text = self
            .input_text
            .filter(|text| !text.trim().is_empty())
            .ok_or(MISSING_FIELDS)?;
        let function_type = self
            .function_type
            .filter(|kind| !kind.trim().is_empty())
            .ok_or(MISSING_FIELDS)?;
        let kind = function_type
            .parse::<TaskKind>()
            .map_err(|_| INVALID_FUNCTION_TYPE)?;

        Ok((input_text, kind))
    }
}

/// POST /api/analysis: analyze free text.
///
/// Returns 400 for missing or invalid fields, 500 when the model call fails.
pub async fn post_analysis(State(app): State<AppState>, body: Bytes) -> ApiResponse {
    let request: AnalysisRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!("Rejected analysis request body: {e}");
            return reject(StatusCode::BAD_REQUEST, INVALID_BODY);
        }
    };

    let (input_text, kind) = match request.validate() {
        Ok(valid) => valid,
        Err(message) => return reject(StatusCode::BAD_REQUEST, message),
    };

    match app.analyzer.analyze(&input_text, kind).await {
        Ok(result) => (
            StatusCode::OK,
            Json(Envelope::ok(AnalysisData {
                input_text,
                function_type: kind,
                result,
                created_at: Utc::now(),
            })),
        ),
        Err(e) if e.is_client_error() => {
            warn!("Analysis rejected: {e}");
            reject(StatusCode::BAD_REQUEST, MISSING_FIELDS)
        }
        Err(e) => {
            error!("Analysis failed: {e}");
            reject(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
        }
    }
}

/// GET /api/health: liveness probe naming the configured model.
pub async fn get_health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "data": { "status": "ok", "model": app.analyzer.provider_name() },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> AnalysisRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn valid_request() {
        let (text, kind) = request(r#"{"inputText":"idea","functionType":"analysis"}"#)
            .validate()
            .unwrap();
        assert_eq!(text, "idea");
        assert_eq!(kind, TaskKind::Analysis);
    }

    #[test]
    fn missing_or_blank_fields() {
        assert_eq!(
            request(r#"{"functionType":"analysis"}"#).validate().unwrap_err(),
            MISSING_FIELDS
        );
        assert_eq!(
            request(r#"{"inputText":"  ","functionType":"analysis"}"#)
                .validate()
                .unwrap_err(),
            MISSING_FIELDS
        );
        assert_eq!(
            request(r#"{"inputText":"idea"}"#).validate().unwrap_err(),
            MISSING_FIELDS
        );
    }

    #[test]
    fn unknown_function_type() {
        assert_eq!(
            request(r#"{"inputText":"idea","functionType":"summary"}"#)
                .validate()
                .unwrap_err(),
            INVALID_FUNCTION_TYPE
        );
    }

    #[test]
    fn error_envelope_omits_data() {
        let json = serde_json::to_value(Envelope::<AnalysisData>::err("nope")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "nope" }));
    }
}
