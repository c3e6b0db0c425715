use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use review_core::error::Error;

/// Error body shared by every route: `{error, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, body: ErrorBody { error: error.into(), details: None } }
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, body: ErrorBody { error: error.into(), details: None } }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }
}

pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InputValidation { .. }
        | Error::MalformedList { .. }
        | Error::QuestionGeneration { .. }
        | Error::QuestionRefinement { .. }
        | Error::EmptyCorpus(_) => StatusCode::BAD_REQUEST,
        Error::GenerationTimeout { .. } | Error::Gateway(_) => StatusCode::BAD_GATEWAY,
        Error::CorpusWrite { .. } | Error::Index(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = status_for(&err);
        let error = match &err {
            Error::InputValidation { field: Some(field), message } if !message.contains(field.as_str()) => format!("Invalid '{field}': {message}"),
            Error::InputValidation { message, .. } => message.clone(),
            other => format!("An error occurred: {other}"),
        };
        let details = match &err {
            Error::MalformedList { .. } | Error::QuestionGeneration { .. } | Error::QuestionRefinement { .. } => {
                Some("questions not being parsed correctly".to_string())
            }
            _ => None,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, status = status.as_u16(), "request failed");
        } else {
            tracing::warn!(error = %err, status = status.as_u16(), "request rejected");
        }
        Self { status, body: ErrorBody { error, details } }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
