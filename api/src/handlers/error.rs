//! Mapping of domain errors onto HTTP responses
//!
//! | error                                   | status |
//! |-----------------------------------------|--------|
//! | InvalidPhoneNumber, InvalidCodeFormat, validation | 400 |
//! | NoPendingVerification                   | 404    |
//! | Expired                                 | 410    |
//! | AttemptsExceeded, ResendTooSoon, ResendLimitExceeded, SendLimitExceeded | 429 |
//! | store/provider internals                | 500    |
//!
//! Every body is a `pv_shared::ErrorResponse` carrying the request id.

use std::collections::HashMap;
use std::fmt;

use actix_web::http::{header, StatusCode};
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use uuid::Uuid;
use validator::ValidationErrors;

use pv_core::errors::{DomainError, OtpError};
use pv_shared::errors::{error_codes, ErrorResponse};

/// Correlation id from `X-Request-ID`, or a fresh UUID
pub fn request_id(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[derive(Debug)]
enum Cause {
    Domain(DomainError),
    Validation(HashMap<String, Vec<String>>),
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    cause: Cause,
    request_id: String,
}

impl ApiError {
    pub fn domain(error: DomainError, request_id: impl Into<String>) -> Self {
        Self {
            cause: Cause::Domain(error),
            request_id: request_id.into(),
        }
    }

    /// Request body or query failed `validator` checks
    pub fn validation(errors: &ValidationErrors, request_id: impl Into<String>) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Self {
            cause: Cause::Validation(fields),
            request_id: request_id.into(),
        }
    }

    /// Request body could not be parsed at all
    pub fn malformed(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            cause: Cause::Validation(HashMap::from([(
                "body".to_string(),
                vec![message.into()],
            )])),
            request_id: request_id.into(),
        }
    }

    fn otp(&self) -> Option<&OtpError> {
        match &self.cause {
            Cause::Domain(err) => err.as_otp(),
            Cause::Validation(_) => None,
        }
    }

    fn body(&self) -> ErrorResponse {
        let response = match &self.cause {
            Cause::Validation(fields) => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, "Invalid request data")
                    .add_detail("fields", fields)
            }
            Cause::Domain(DomainError::Otp(err)) => otp_body(err),
            Cause::Domain(DomainError::Validation { message }) => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone())
            }
            // Internals are logged, never echoed
            Cause::Domain(DomainError::Internal { .. } | DomainError::Delivery(_)) => {
                ErrorResponse::new(
                    error_codes::INTERNAL_ERROR,
                    "An internal error occurred. Please try again later.",
                )
            }
        };
        response.with_request_id(self.request_id.clone())
    }
}

fn otp_body(err: &OtpError) -> ErrorResponse {
    let message = err.to_string();
    match err {
        OtpError::InvalidPhoneNumber { .. } => {
            ErrorResponse::new(error_codes::INVALID_PHONE_NUMBER, message)
        }
        OtpError::InvalidCodeFormat { expected_length } => {
            ErrorResponse::new(error_codes::INVALID_CODE_FORMAT, message)
                .add_detail("expected_length", expected_length)
        }
        OtpError::NoPendingVerification => {
            ErrorResponse::new(error_codes::NO_PENDING_VERIFICATION, message)
        }
        OtpError::Expired => ErrorResponse::new(error_codes::VERIFICATION_EXPIRED, message),
        OtpError::AttemptsExceeded { max_attempts } => {
            ErrorResponse::new(error_codes::ATTEMPTS_EXCEEDED, message)
                .add_detail("max_attempts", max_attempts)
                .add_detail("attempts_remaining", 0)
        }
        OtpError::ResendTooSoon {
            retry_after_seconds,
        } => ErrorResponse::new(error_codes::RESEND_TOO_SOON, message)
            .add_detail("retry_after_seconds", retry_after_seconds),
        OtpError::ResendLimitExceeded { max_resends } => {
            ErrorResponse::new(error_codes::RESEND_LIMIT_EXCEEDED, message)
                .add_detail("max_resends", max_resends)
        }
        OtpError::SendLimitExceeded {
            retry_after_seconds,
        } => ErrorResponse::new(error_codes::SEND_LIMIT_EXCEEDED, message)
            .add_detail("retry_after_seconds", retry_after_seconds),
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Cause::Domain(err) => write!(f, "{}", err),
            Cause::Validation(fields) => write!(f, "Invalid request data: {:?}", fields),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.cause {
            Cause::Validation(_) => StatusCode::BAD_REQUEST,
            Cause::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
            Cause::Domain(DomainError::Otp(err)) => match err {
                OtpError::InvalidPhoneNumber { .. } | OtpError::InvalidCodeFormat { .. } => {
                    StatusCode::BAD_REQUEST
                }
                OtpError::NoPendingVerification => StatusCode::NOT_FOUND,
                OtpError::Expired => StatusCode::GONE,
                OtpError::AttemptsExceeded { .. }
                | OtpError::ResendTooSoon { .. }
                | OtpError::ResendLimitExceeded { .. }
                | OtpError::SendLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            },
            Cause::Domain(DomainError::Internal { .. } | DomainError::Delivery(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(request_id = %self.request_id, error = %self, "Request failed");
        }

        let mut builder = HttpResponse::build(status);
        if let Some(seconds) = self.otp().and_then(OtpError::retry_after_seconds) {
            builder.insert_header((header::RETRY_AFTER, seconds.to_string()));
        }
        builder
            .insert_header(("X-Request-ID", self.request_id.clone()))
            .json(self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn render(error: ApiError) -> (StatusCode, Option<String>, serde_json::Value) {
        let response = error.error_response();
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, retry_after, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_resend_too_soon_sets_retry_after() {
        let error = ApiError::domain(
            OtpError::ResendTooSoon {
                retry_after_seconds: 42,
            }
            .into(),
            "req-1",
        );
        let (status, retry_after, body) = render(error).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry_after.as_deref(), Some("42"));
        assert_eq!(body["error"], "RESEND_TOO_SOON");
        assert_eq!(body["details"]["retry_after_seconds"], 42);
        assert_eq!(body["request_id"], "req-1");
        assert_eq!(body["detail"], body["message"]);
    }

    #[actix_web::test]
    async fn test_status_codes() {
        let cases: Vec<(DomainError, StatusCode, &str)> = vec![
            (
                OtpError::InvalidPhoneNumber { phone: "x".into() }.into(),
                StatusCode::BAD_REQUEST,
                "INVALID_PHONE_NUMBER",
            ),
            (
                OtpError::NoPendingVerification.into(),
                StatusCode::NOT_FOUND,
                "NO_PENDING_VERIFICATION",
            ),
            (OtpError::Expired.into(), StatusCode::GONE, "VERIFICATION_EXPIRED"),
            (
                OtpError::AttemptsExceeded { max_attempts: 5 }.into(),
                StatusCode::TOO_MANY_REQUESTS,
                "ATTEMPTS_EXCEEDED",
            ),
            (
                OtpError::ResendLimitExceeded { max_resends: 5 }.into(),
                StatusCode::TOO_MANY_REQUESTS,
                "RESEND_LIMIT_EXCEEDED",
            ),
        ];

        for (error, expected_status, expected_code) in cases {
            let (status, retry_after, body) = render(ApiError::domain(error, "r")).await;
            assert_eq!(status, expected_status);
            assert_eq!(body["error"], expected_code);
            assert!(retry_after.is_none());
        }
    }

    #[actix_web::test]
    async fn test_internal_error_is_not_echoed() {
        let error = ApiError::domain(
            DomainError::Internal {
                message: "redis://secret@host unreachable".into(),
            },
            "r",
        );
        let (status, _, body) = render(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("secret"));
    }

    #[test]
    fn test_request_id_from_header() {
        let req = actix_web::test::TestRequest::default()
            .insert_header(("X-Request-ID", "abc-123"))
            .to_http_request();
        assert_eq!(request_id(&req), "abc-123");

        let req = actix_web::test::TestRequest::default().to_http_request();
        assert_eq!(request_id(&req).len(), 36);
    }
}
