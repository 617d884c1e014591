use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

/// Failures fetching races from the racing API.
///
/// Transport errors are mapped into this set at the client so nothing above
/// the data source sees reqwest types. The `Display` text is what users see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// Host unreachable, connection refused, or another I/O failure.
    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("Request timeout")]
    Timeout,

    /// HTTP 5xx.
    #[error("Server error")]
    ServerError,

    /// Any other non-2xx status.
    #[error("HTTP error {code}: {message}")]
    HttpError { code: u16, message: String },

    #[error("Data parsing error")]
    ParseError(String),

    #[error("Unknown error occurred")]
    Unknown(String),
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout
        } else if err.is_connect() {
            DataError::NetworkUnavailable
        } else if let Some(status) = err.status() {
            DataError::from_status(status)
        } else if err.is_decode() {
            DataError::ParseError(err.to_string())
        } else if err.is_request() || err.is_body() {
            DataError::NetworkUnavailable
        } else {
            DataError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::ParseError(err.to_string())
    }
}

impl DataError {
    /// Underlying cause kept for logs; never shown to users.
    pub fn detail(&self) -> Option<&str> {
        match self {
            DataError::ParseError(detail) | DataError::Unknown(detail) => Some(detail),
            _ => None,
        }
    }

    /// Map a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        if status.is_server_error() {
            DataError::ServerError
        } else {
            DataError::HttpError {
                code: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unexpected status")
                    .to_string(),
            }
        }
    }
}

/// Errors surfaced by the HTTP presentation adapter.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Race board is shut down")]
    StoreClosed,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StoreClosed => {
                tracing::warn!("Intent rejected: race store is closed");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        (
            status,
            axum::Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_collapse() {
        for code in [500, 502, 503, 599] {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            assert_eq!(DataError::from_status(status), DataError::ServerError);
        }
    }

    #[test]
    fn test_client_errors_keep_code() {
        let err = DataError::from_status(reqwest::StatusCode::NOT_FOUND);
        assert_eq!(
            err,
            DataError::HttpError {
                code: 404,
                message: "Not Found".to_string()
            }
        );
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(DataError::NetworkUnavailable.to_string(), "Network unavailable");
        assert_eq!(DataError::Timeout.to_string(), "Request timeout");
        assert_eq!(DataError::ServerError.to_string(), "Server error");
        assert_eq!(
            DataError::ParseError("eof".to_string()).to_string(),
            "Data parsing error"
        );
        assert_eq!(
            DataError::Unknown("boom".to_string()).to_string(),
            "Unknown error occurred"
        );
    }

    #[test]
    fn test_detail_only_for_wrapped_causes() {
        assert_eq!(DataError::ParseError("eof".to_string()).detail(), Some("eof"));
        assert_eq!(DataError::Timeout.detail(), None);
    }

    #[test]
    fn test_json_error_is_parse_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(DataError::from(err), DataError::ParseError(_)));
    }

    #[test]
    fn test_store_closed_is_503() {
        let response = AppError::StoreClosed.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_bad_request_is_400() {
        let response = AppError::BadRequest("missing field `type`".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
