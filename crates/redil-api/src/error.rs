//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! "Found but outside the requester's scope" and "does not exist" are
//! distinct conditions all the way out: [`ApiError::Forbidden`] maps to 403,
//! [`ApiError::NotFound`] to 404.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<redil_core::Error> for ApiError {
  fn from(e: redil_core::Error) -> Self {
    use redil_core::Error as E;
    match e {
      E::PersonNotFound(_)
      | E::GuestNotFound(_)
      | E::CellNotFound(_)
      | E::ModuleNotFound(_)
      | E::EventNotFound(_) => ApiError::NotFound(e.to_string()),
      E::CellLeaderRole { .. } => ApiError::BadRequest(e.to_string()),
      E::LeaderOutsideNetwork(_) => ApiError::Forbidden(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"redil\""),
      );
    }
    res
  }
}
