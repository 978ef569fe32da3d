//! HTTP Basic-auth extractor resolving the requesting person.
//!
//! Credentials are checked against per-person argon2 PHC hashes held by the
//! store, so the authentication layer hands every handler the requester's
//! identity AND role in one extraction.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use redil_core::{person::Person, store::DirectoryStore};

use crate::{AppState, error::ApiError};

/// The authenticated person behind the current request.
pub struct Requester(pub Person);

/// Split an `Authorization: Basic …` header into `(email, password)`.
fn parse_basic(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds =
    std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) =
    creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  Ok((email.to_string(), password.to_string()))
}

/// Verify `password` against a stored argon2 PHC string.
pub fn verify_password(password: &str, phc: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(phc).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}

impl<S> FromRequestParts<AppState<S>> for Requester
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = parse_basic(&parts.headers)?;

    let (person, hash) = state
      .store
      .find_credentials(&email)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .ok_or(ApiError::Unauthorized)?;

    verify_password(&password, &hash)?;

    Ok(Requester(person))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use rand_core::OsRng;

  fn phc(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  #[test]
  fn verify_accepts_matching_password() {
    let hash = phc("secreto");
    assert!(verify_password("secreto", &hash).is_ok());
  }

  #[test]
  fn verify_rejects_wrong_password() {
    let hash = phc("secreto");
    assert!(matches!(
      verify_password("otro", &hash),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn parse_basic_roundtrip() {
    let mut headers = HeaderMap::new();
    let encoded = B64.encode("ana@example.com:secreto");
    headers.insert(
      axum::http::header::AUTHORIZATION,
      format!("Basic {encoded}").parse().unwrap(),
    );

    let (email, password) = parse_basic(&headers).unwrap();
    assert_eq!(email, "ana@example.com");
    assert_eq!(password, "secreto");
  }

  #[test]
  fn parse_basic_rejects_missing_header() {
    let headers = HeaderMap::new();
    assert!(matches!(
      parse_basic(&headers),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn parse_basic_rejects_invalid_base64() {
    let mut headers = HeaderMap::new();
    headers.insert(
      axum::http::header::AUTHORIZATION,
      "Basic !!!not-base64!!!".parse().unwrap(),
    );
    assert!(matches!(
      parse_basic(&headers),
      Err(ApiError::Unauthorized)
    ));
  }
}
