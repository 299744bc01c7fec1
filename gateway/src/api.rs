use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use promptbridge_core::PromptRequest;

// Returned for any request we refuse before orchestration
#[derive(Debug, Serialize)]
pub struct ValidationError {
    pub error: String,
    pub details: Vec<String>,
}

impl ValidationError {
    pub fn new(details: Vec<String>) -> Self {
        Self {
            error: "validation failed".to_string(),
            details,
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// Unwraps the JSON body and applies the prompt rules.
pub fn validated(
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<PromptRequest, ValidationError> {
    let Json(request) = payload.map_err(|rejection| ValidationError::new(vec![rejection.body_text()]))?;

    let problems = request.validate();
    if problems.is_empty() {
        Ok(request)
    } else {
        Err(ValidationError::new(problems))
    }
}
