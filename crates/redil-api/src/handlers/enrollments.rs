//! Handlers for `/modules` and `/enrollments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/modules` | Module catalogue; visible to any authenticated person |
//! | `POST` | `/modules` | Admin only |
//! | `GET`  | `/enrollments` | Optional `?person_id=`; scoped by enrollee |
//! | `POST` | `/enrollments` | Body: [`CreateEnrollmentBody`] |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use redil_core::{
  entities::{Enrollment, ModuleId, NewEnrollment, NewModule, SeminarModule},
  person::PersonId,
  store::DirectoryStore,
  visibility::enrollment_visible,
};

use crate::{
  AppState,
  auth::Requester,
  error::ApiError,
  handlers::{require_admin, scope_for},
};

// ─── Modules ──────────────────────────────────────────────────────────────────

/// `GET /modules`
pub async fn list_modules<S>(
  State(state): State<AppState<S>>,
  _requester: Requester,
) -> Result<Json<Vec<SeminarModule>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let modules = state
    .store
    .list_modules()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(modules))
}

#[derive(Debug, Deserialize)]
pub struct CreateModuleBody {
  pub name:     String,
  pub position: i64,
}

/// `POST /modules` — admin only.
pub async fn create_module<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Json(body): Json<CreateModuleBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  require_admin(&requester.0)?;

  let module = state
    .store
    .add_module(NewModule { name: body.name, position: body.position })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(module)))
}

// ─── Enrollments ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub person_id: Option<PersonId>,
}

/// `GET /enrollments[?person_id=<id>]` — out-of-scope enrollees simply
/// render an empty list, never an error.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Enrollment>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  let enrollments = state
    .store
    .list_enrollments(params.person_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .into_iter()
    .filter(|e| enrollment_visible(&scope, e.person_id))
    .collect();
  Ok(Json(enrollments))
}

#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentBody {
  pub person_id: PersonId,
  pub module_id: ModuleId,
}

/// `POST /enrollments`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Json(body): Json<CreateEnrollmentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let person = state
    .store
    .get_person(body.person_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("person {} does not exist", body.person_id))
    })?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !scope.allows(person.person_id) {
    return Err(ApiError::Forbidden(format!(
      "person {} is outside your network",
      person.person_id
    )));
  }

  state
    .store
    .get_module(body.module_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("module {} does not exist", body.module_id))
    })?;

  let enrollment = state
    .store
    .add_enrollment(NewEnrollment {
      person_id: body.person_id,
      module_id: body.module_id,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(enrollment)))
}
