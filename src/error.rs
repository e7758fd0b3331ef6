//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::Envelope;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("registry: {0}")]
    Registry(String),
}

/// Stable machine-readable codes carried in every response envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    MissingParameter = 1001,
    InvalidFormat = 1002,
    InvalidValue = 1003,
    InvalidArgument = 1004,
    Unauthenticated = 2001,
    WrongPassword = 2002,
    Forbidden = 2003,
    NotFound = 3001,
    Conflict = 3002,
    Storage = 5001,
    Internal = 5002,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("wrong password")]
    WrongPassword,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
    #[error("malformed query: {0}")]
    MalformedQuery(String),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("internal: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e {
            if db.is_unique_violation() {
                return AppError::Conflict(db.constraint().unwrap_or("unique key").to_string());
            }
        }
        AppError::Db(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::MissingParameter("request body must be application/json".into())
            }
            other => AppError::InvalidFormat(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidFormat(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidFormat(rejection.body_text())
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingParameter(_) => ErrorCode::MissingParameter,
            AppError::InvalidFormat(_) => ErrorCode::InvalidFormat,
            AppError::InvalidValue(_) => ErrorCode::InvalidValue,
            AppError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            AppError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            AppError::WrongPassword => ErrorCode::WrongPassword,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Db(sqlx::Error::RowNotFound) => ErrorCode::NotFound,
            AppError::Db(_) | AppError::MalformedQuery(_) => ErrorCode::Storage,
            AppError::Config(_) | AppError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code() {
            ErrorCode::MissingParameter
            | ErrorCode::InvalidFormat
            | ErrorCode::InvalidValue
            | ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated | ErrorCode::WrongPassword => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Storage | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller. Storage and internal details stay in the logs.
    fn public_message(&self) -> String {
        match self.code() {
            ErrorCode::Storage => "storage error".into(),
            ErrorCode::Internal => "internal error".into(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        match code {
            ErrorCode::Storage | ErrorCode::Internal => tracing::error!(error = %self, "request failed"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }
        let body: Envelope<()> = Envelope {
            code: code.as_u16(),
            msg: self.public_message(),
            data: None,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_code() {
        let errors = [
            AppError::MissingParameter("page".into()),
            AppError::InvalidFormat("phone".into()),
            AppError::InvalidValue("role".into()),
            AppError::InvalidArgument("page".into()),
            AppError::Unauthenticated("expired".into()),
            AppError::WrongPassword,
            AppError::Forbidden("TRACE".into()),
            AppError::NotFound("alice".into()),
            AppError::Conflict("alice".into()),
            AppError::MalformedQuery("no table".into()),
            AppError::Internal("queue closed".into()),
        ];
        let mut codes: Vec<u16> = errors.iter().map(|e| e.code().as_u16()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = AppError::MalformedQuery("relation \"secret\" does not exist".into());
        assert_eq!(err.public_message(), "storage error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn query_rejection_is_invalid_format() {
        let uri: axum::http::Uri = "/orbits?page=x".parse().unwrap();
        let rejection = axum::extract::Query::<std::collections::HashMap<String, u32>>::try_from_uri(&uri).unwrap_err();
        let err = AppError::from(rejection);
        assert_eq!(err.code(), ErrorCode::InvalidFormat);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
