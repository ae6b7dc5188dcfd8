// marketplace/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Value};
use thiserror::Error;

use crate::store::StoreError;
use orka::OrkaError;

#[derive(Debug, Error)]
pub enum AppError {
  /// Request rejected before any write. `errors` lists every violated rule.
  #[error("Validation Error: {message}")]
  Validation { message: String, errors: Vec<String> },

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// A database failure inside the order transaction. The transaction has
  /// already been rolled back when this is constructed.
  #[error("Transaction Error: {0}")]
  Transaction(String),

  /// The data store (or another collaborator) could not be reached in time.
  #[error("Dependency Unavailable: {0}")]
  Dependency(String),

  #[error("Request Timed Out: {0}")]
  Timeout(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Orka Workflow Error: {source}")]
  Workflow { source: OrkaError },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
    AppError::Validation {
      message: message.into(),
      errors,
    }
  }

  /// A validation failure with a single violated rule.
  pub fn invalid(rule: impl Into<String>) -> Self {
    let rule = rule.into();
    AppError::Validation {
      message: rule.clone(),
      errors: vec![rule],
    }
  }

  pub fn is_retryable(&self) -> bool {
    matches!(self, AppError::Dependency(_) | AppError::Timeout(_))
  }

  /// JSON body for this error. Server errors carry the full error text under
  /// `detail` only when `with_detail` is set.
  pub fn response_body(&self, with_detail: bool) -> Value {
    match self {
      AppError::Validation { message, errors } => json!({ "message": message, "errors": errors }),
      AppError::Auth(m) | AppError::Forbidden(m) | AppError::NotFound(m) => json!({ "message": m }),
      _ => {
        let message = match self {
          AppError::Transaction(_) => "The order could not be saved. No changes were made.",
          AppError::Dependency(_) => "A required service is temporarily unavailable.",
          AppError::Timeout(_) => "The request took too long to complete.",
          _ => "An internal error occurred",
        };
        let mut body = json!({ "message": message });
        if self.is_retryable() {
          body["retryable"] = json!(true);
        }
        if with_detail {
          body["detail"] = json!(self.to_string());
        }
        body
      }
    }
  }
}

impl From<OrkaError> for AppError {
  fn from(err: OrkaError) -> Self {
    match err {
      OrkaError::DeadlineExceeded { context_type, limit } => {
        AppError::Timeout(format!("{} did not complete within {:?}", context_type, limit))
      }
      // A handler that failed through anyhow may have been carrying an AppError.
      OrkaError::HandlerError { source } => AppError::from(source),
      other => AppError::Workflow { source: other },
    }
  }
}

impl From<StoreError> for AppError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Unavailable(m) => AppError::Dependency(m),
      e @ StoreError::Transaction { .. } => AppError::Transaction(e.to_string()),
      StoreError::Query(m) => AppError::Internal(format!("Database query failed: {}", m)),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<StoreError>() {
        Ok(store_err) => AppError::from(store_err),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation { .. } => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
      AppError::Transaction(_)
      | AppError::Dependency(_)
      | AppError::Config(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    match self {
      AppError::Validation { message, errors } => {
        tracing::info!(%message, violations = errors.len(), "Rejecting invalid request");
      }
      AppError::Auth(m) | AppError::Forbidden(m) | AppError::NotFound(m) => {
        tracing::info!(status = status.as_u16(), message = %m, "Responding with client error");
      }
      _ => {
        // Full error is logged here; the caller only sees it in development.
        tracing::error!(application_error = %self, status = status.as_u16(), "Responding with server error");
      }
    }
    HttpResponse::build(status).json(self.response_body(false))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
