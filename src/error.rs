// Copyright 2023 Remi Bernotavicius

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

/// Failure taxonomy of the store. Every variant surfaces before any write
/// commits; callers never observe partial state.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Malformed or out-of-range input, keyed by the offending field.
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A uniqueness invariant rejected the write.
    #[error("{what} already exists")]
    Conflict { what: &'static str },

    #[error("{what} not found")]
    NotFound { what: &'static str },

    /// No authenticated actor on a route that needs one.
    #[error("authentication required")]
    Unauthorized,

    /// The actor is neither the author nor an admin.
    #[error("no permission for this operation")]
    Forbidden,

    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[error("connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed import file: {0}")]
    Import(#[from] serde_json::Error),

    #[error(transparent)]
    Blocking(#[from] actix_web::error::BlockingError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(what: &'static str) -> Self {
        Self::Conflict { what }
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }
}

/// Translates constraint violations raised by an insert: the unique pair is
/// a [`CatalogError::Conflict`], a dangling reference is a
/// [`CatalogError::NotFound`] for the referenced entity.
pub(crate) fn constraint_error(
    conflict: &'static str,
    missing: &'static str,
    e: diesel::result::Error,
) -> CatalogError {
    use diesel::result::{DatabaseErrorKind, Error};

    match e {
        Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            CatalogError::Conflict { what: conflict }
        }
        Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            CatalogError::NotFound { what: missing }
        }
        other => CatalogError::Database(other),
    }
}

impl actix_web::ResponseError for CatalogError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Conflict { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Pool(_) | Self::Io(_) | Self::Import(_)
            | Self::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Validation { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert((*field).to_owned(), serde_json::json!([message]));
                HttpResponse::BadRequest().json(body)
            }
            Self::Conflict { .. } => {
                HttpResponse::BadRequest().json(serde_json::json!({ "errors": self.to_string() }))
            }
            Self::NotFound { .. } => {
                HttpResponse::NotFound().json(serde_json::json!({ "detail": self.to_string() }))
            }
            Self::Unauthorized | Self::Forbidden => HttpResponse::build(self.status_code())
                .json(serde_json::json!({ "detail": self.to_string() })),
            Self::Database(_) | Self::Pool(_) | Self::Io(_) | Self::Import(_)
            | Self::Blocking(_) => {
                log::error!("internal error: {self}");
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "detail": "internal server error" }))
            }
        }
    }
}
