use actix_web::{HttpResponse, http::StatusCode};
use chrono::NaiveDate;
use thiserror::Error;

/// Failure taxonomy of the attendance engine. Handlers rely on the
/// `ResponseError` impl for default HTTP mapping; endpoints that need a
/// different status (auto-generate's 404) match explicitly.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No resolvable schedule at all: admin intervention required. Never
    /// silently defaulted.
    #[error("No work schedule configured. Please set a default schedule or create an assignment.")]
    ConfigurationMissing,

    /// The resolver correctly found nothing because the day is not
    /// scheduled. Benign, distinct from a missing configuration.
    #[error("No work is scheduled on {0}")]
    NonWorkingDay(NaiveDate),

    #[error("Invalid QR code")]
    InvalidToken,

    #[error("QR code has expired or is not yet valid")]
    TokenExpired,

    #[error("validUntil must be after validFrom")]
    InvalidWindow,

    #[error("{0}")]
    MalformedInput(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl actix_web::ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let EngineError::Store(e) = self {
            tracing::error!(error = %e, "store failure");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Internal server error"
            }));
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}
