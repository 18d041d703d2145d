//! Error responses.
//!
//! Every failure is reported as `{"detail": "..."}`. Validation messages are
//! passed through; server-side failures get fixed wording and the cause goes
//! to the log only.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::ValidationError;
use crate::PredictError;

pub const PREDICTION_FAILURE_DETAIL: &str =
    "Error during prediction. Please ensure all input values are valid.";
pub const INTERNAL_ERROR_DETAIL: &str = "An unexpected error occurred. Please try again later.";

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl PredictError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Prediction(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Prediction(_) => PREDICTION_FAILURE_DETAIL.to_string(),
            Self::Internal(_) => INTERNAL_ERROR_DETAIL.to_string(),
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::info!("Rejected request: {}", self);
        }
        (
            status,
            Json(ErrorBody {
                detail: self.detail(),
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for PredictError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError::MalformedBody(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sanitize::capture::logs_of;
    use crate::ports::ModelError;

    #[test]
    fn test_status_mapping() {
        let validation = PredictError::Validation(ValidationError::NoSymptoms);
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.detail(), "At least one symptom is required");

        let prediction = PredictError::Prediction(ModelError::NonFinite("decision score"));
        assert_eq!(prediction.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(prediction.detail(), PREDICTION_FAILURE_DETAIL);

        let internal = PredictError::Internal("worker panicked".into());
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.detail(), INTERNAL_ERROR_DETAIL);
    }

    #[test]
    fn test_validation_detail_names_field() {
        let err = PredictError::from(ValidationError::UnknownCategory {
            field: "rbc".into(),
            value: "purple".into(),
        });
        assert!(err.detail().contains("rbc"));
    }

    #[test]
    fn test_logged_rejection_stays_on_one_line() {
        let logs = logs_of(|| {
            let err = PredictError::from(ValidationError::UnknownCategory {
                field: "rbc".into(),
                value: "normal\n2026-10-16T00:00:00Z ERROR medpredict: forged admin login".into(),
            });
            let _ = err.into_response();
        });
        assert_eq!(logs.lines().count(), 1);
        assert!(logs.contains("Rejected request"));
        assert!(logs.contains("normal\\n2026-10-16T00:00:00Z ERROR medpredict: forged"));
    }

    #[test]
    fn test_internal_error_logs_cause() {
        let logs = logs_of(|| {
            let _ = PredictError::Internal("prediction task panicked: boom".into()).into_response();
        });
        assert!(logs.contains("ERROR"));
        assert!(logs.contains("prediction task panicked: boom"));
    }
}
