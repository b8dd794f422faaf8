use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;

use std::error::Error;
use std::fmt;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum AppError {
    /// No row with the requested id, including rows that vanished
    /// between an existence check and the write that followed it.
    NotFound,
    /// Bad input: constraint violation or request shape mismatch.
    Validation(String),
    /// The row still exists but the write failed underneath us.
    /// Detected, never retried.
    Conflict(String),
    Internal(String),
}

impl Error for AppError {}
impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::NotFound => write!(f, "todo not found"),
            AppError::Validation(what) => write!(f, "validation failed: {}", what),
            AppError::Conflict(what) => write!(f, "concurrent modification: {}", what),
            AppError::Internal(what) => write!(f, "internal error: {}", what),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> AppError {
        match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl<T> From<PoisonError<T>> for AppError {
    fn from(e: PoisonError<T>) -> AppError {
        AppError::Internal(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Validation errors carry a JSON body; not-found and fatal errors
/// forward to the registered catchers so HTML callers get the error
/// views and API callers get the bare status.
impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        match self {
            AppError::NotFound => Err(Status::NotFound),
            AppError::Validation(_) => {
                let body = Json(ErrorBody {
                    error: self.to_string(),
                });
                (Status::BadRequest, body).respond_to(request)
            }
            AppError::Conflict(_) | AppError::Internal(_) => {
                eprintln!("{}", self);
                Err(Status::InternalServerError)
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
