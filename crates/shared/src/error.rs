//! Request-level errors shared by every surface.
//!
//! Domain failures carry their own error enums in `arqon-core`. `AppError`
//! covers what goes wrong before a request reaches the domain: a body that
//! does not parse, a malformed path or query, or a route that does not exist.

use thiserror::Error;

/// Errors raised while decoding a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Body is not valid JSON or does not match the expected shape.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// A path segment could not be parsed.
    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),

    /// Query string could not be parsed.
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    /// No route matches the request.
    #[error("No route for {0}")]
    RouteNotFound(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidBody(_) | Self::InvalidPath(_) | Self::InvalidQuery(_) => 400,
            Self::RouteNotFound(_) => 404,
        }
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::InvalidPath(_) => "INVALID_PATH",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::RouteNotFound(_) => "ROUTE_NOT_FOUND",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
