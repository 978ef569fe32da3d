//! Handlers for `/people` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/people` | Scoped to the requester's network |
//! | `POST`   | `/people` | Admin only; body: [`CreatePersonBody`] |
//! | `GET`    | `/people/:id` | 404 unknown, 403 outside network |
//! | `PATCH`  | `/people/:id` | Body: [`UpdatePersonBody`] |
//! | `DELETE` | `/people/:id` | SUPER_ADMIN only |
//! | `GET`    | `/people/:id/network` | The person's transitive downline |
//! | `POST`   | `/people/:id/leader` | Reassignment; body: [`AssignLeaderBody`] |

use std::collections::BTreeSet;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rand_core::OsRng;
use serde::Deserialize;

use redil_core::{
  assignment::{check_leader_in_scope, inherited_ancestry},
  network::resolve_downline,
  person::{NewPerson, Person, PersonId, PersonUpdate, Role},
  store::DirectoryStore,
};

use crate::{
  AppState,
  auth::Requester,
  error::ApiError,
  handlers::{require_admin, scope_for},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /people`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  let persons = state
    .store
    .list_persons()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .into_iter()
    .filter(|p| scope.allows(p.person_id))
    .collect();
  Ok(Json(persons))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreatePersonBody {
  pub full_name: String,
  pub email:     Option<String>,
  /// Plain-text password; hashed before it reaches the store.
  pub password:  Option<String>,
  pub role:      Role,
}

/// `POST /people` — admin only; returns 201 + the stored person.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Json(body): Json<CreatePersonBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  require_admin(&requester.0)?;

  let password_hash = body
    .password
    .as_deref()
    .map(hash_password)
    .transpose()?;

  let mut input = NewPerson::new(body.full_name, body.role);
  input.email = body.email;
  input.password_hash = password_hash;

  let person = state
    .store
    .add_person(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(person)))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::BadRequest(format!("cannot hash password: {e}")))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /people/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<PersonId>,
) -> Result<Json<Person>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let person = state
    .store
    .get_person(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !scope.allows(person.person_id) {
    return Err(ApiError::Forbidden(format!(
      "person {id} is outside your network"
    )));
  }
  Ok(Json(person))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdatePersonBody {
  pub full_name: Option<String>,
  pub email:     Option<String>,
  pub role:      Option<Role>,
}

/// `PATCH /people/:id` — role changes are SUPER_ADMIN only.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<PersonId>,
  Json(body): Json<UpdatePersonBody>,
) -> Result<Json<Person>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let person = state
    .store
    .get_person(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !scope.allows(person.person_id) {
    return Err(ApiError::Forbidden(format!(
      "person {id} is outside your network"
    )));
  }

  if body.role.is_some() && requester.0.role != Role::SuperAdmin {
    return Err(ApiError::Forbidden(
      "only a SUPER_ADMIN may change roles".into(),
    ));
  }

  let updated = state
    .store
    .update_person(
      id,
      PersonUpdate {
        full_name: body.full_name,
        email:     body.email,
        role:      body.role,
      },
    )
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /people/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<PersonId>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  if requester.0.role != Role::SuperAdmin {
    return Err(ApiError::Forbidden(
      "only a SUPER_ADMIN may remove people".into(),
    ));
  }

  state
    .store
    .get_person(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;

  // A cell must always have a leader; reassign the cell first.
  let leads = state
    .store
    .list_cells()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .into_iter()
    .find(|c| c.leader_id == id);
  if let Some(cell) = leads {
    return Err(ApiError::Conflict(format!(
      "person {id} still leads cell {}",
      cell.cell_id
    )));
  }

  state
    .store
    .delete_person(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(person_id = id, removed_by = requester.0.person_id, "person removed");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Network ──────────────────────────────────────────────────────────────────

/// `GET /people/:id/network` — the person's transitive downline.
pub async fn network<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<PersonId>,
) -> Result<Json<BTreeSet<PersonId>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  state
    .store
    .get_person(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !scope.allows(id) {
    return Err(ApiError::Forbidden(format!(
      "person {id} is outside your network"
    )));
  }

  let downline = resolve_downline(state.store.as_ref(), Some(id))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(downline))
}

// ─── Assign leader ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignLeaderBody {
  pub leader_id: PersonId,
}

/// `POST /people/:id/leader` — move a person under a new immediate leader,
/// snapshot-copying the leader's ancestry into the person's level slots.
pub async fn assign_leader<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<PersonId>,
  Json(body): Json<AssignLeaderBody>,
) -> Result<Json<Person>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let person = state
    .store
    .get_person(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !scope.allows(person.person_id) {
    return Err(ApiError::Forbidden(format!(
      "person {id} is outside your network"
    )));
  }

  let leader = state
    .store
    .get_person(body.leader_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("new leader {} does not exist", body.leader_id))
    })?;

  if person.person_id == leader.person_id {
    return Err(ApiError::BadRequest(
      "a person cannot be their own leader".into(),
    ));
  }

  check_leader_in_scope(&scope, leader.person_id)?;

  let updated = state
    .store
    .assign_leader(person.person_id, leader.person_id, inherited_ancestry(&leader))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(
    person_id = person.person_id,
    leader_id = leader.person_id,
    assigned_by = requester.0.person_id,
    "leader reassigned"
  );
  Ok(Json(updated))
}
