//! JSON error responses.
//!
//! Every failure leaves the API as `{"error": <CODE>, "message": <text>}`,
//! with the status and code taken from the domain error.

use arqon_core::catalog::{CatalogError, ImportError};
use arqon_core::customer::CustomerError;
use arqon_core::ledger::LedgerError;
use arqon_core::pricing::DerivationError;
use arqon_core::quote::QuoteError;
use arqon_core::store::StoreError;
use arqon_shared::AppError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

/// Serialized error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl ApiError {
    /// Creates an error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured details to the body.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// A 400 with the given code.
    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// Returns the HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn from_parts(status: u16, code: &'static str, message: String) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, code, message)
    }
}

macro_rules! domain_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(err: $ty) -> Self {
                    Self::from_parts(err.http_status_code(), err.error_code(), err.to_string())
                }
            }
        )+
    };
}

domain_error!(
    StoreError,
    DerivationError,
    LedgerError,
    QuoteError,
    CatalogError,
    CustomerError,
);

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        let base = Self::from_parts(err.http_status_code(), err.error_code(), err.to_string());
        match err {
            ImportError::NoValidRows { skipped } => base.with_details(json!({ "skipped": skipped })),
            ImportError::ChunkFailed {
                chunk,
                chunks_committed,
                rows_committed,
                ..
            } => base.with_details(json!({
                "failed_chunk": chunk,
                "chunks_committed": chunks_committed,
                "rows_committed": rows_committed,
            })),
            ImportError::MissingListCode | ImportError::Store(_) => base,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::from_parts(err.status_code(), err.error_code(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection.body_text()).into()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidPath(rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidQuery(rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "request failed");
        }
        // Internal failures keep their code but not their text.
        let message = if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            INTERNAL_MESSAGE
        } else {
            &self.message
        };
        let body = ErrorBody {
            error: self.code,
            message,
            details: self.details.as_ref(),
        };
        (self.status, Json(body)).into_response()
    }
}
