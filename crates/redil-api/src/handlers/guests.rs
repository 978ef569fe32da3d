//! Handlers for `/guests` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/guests` | Scoped; inviter loses a guest once reassigned |
//! | `POST`   | `/guests` | Inviter is always the requester |
//! | `GET`    | `/guests/:id` | 404 unknown, 403 outside scope |
//! | `PATCH`  | `/guests/:id` | Body: [`UpdateGuestBody`]; covers reassignment |
//! | `DELETE` | `/guests/:id` | |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use redil_core::{
  assignment::check_leader_in_scope,
  entities::{Guest, GuestId, GuestUpdate, NewGuest},
  person::PersonId,
  store::DirectoryStore,
  visibility::{Scope, guest_visible},
};

use crate::{AppState, auth::Requester, error::ApiError, handlers::scope_for};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /guests`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
) -> Result<Json<Vec<Guest>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  let guests = state
    .store
    .list_guests()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .into_iter()
    .filter(|g| guest_visible(&scope, g))
    .collect();
  Ok(Json(guests))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateGuestBody {
  pub full_name:      String,
  pub phone:          Option<String>,
  pub assigned_to_id: Option<PersonId>,
}

/// `POST /guests` — the requester is recorded as the inviter.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Json(body): Json<CreateGuestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  if let Some(assignee) = body.assigned_to_id {
    let scope = scope_for(state.store.as_ref(), &requester.0).await?;
    ensure_assignee(&state, &scope, assignee).await?;
  }

  let guest = state
    .store
    .add_guest(NewGuest {
      full_name:      body.full_name,
      phone:          body.phone,
      invited_by_id:  requester.0.person_id,
      assigned_to_id: body.assigned_to_id,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(guest)))
}

/// The assignee must exist and be inside the requester's scope.
async fn ensure_assignee<S>(
  state: &AppState<S>,
  scope: &Scope,
  assignee: PersonId,
) -> Result<(), ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  state
    .store
    .get_person(assignee)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("assignee {assignee} does not exist"))
    })?;
  check_leader_in_scope(scope, assignee)?;
  Ok(())
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /guests/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<GuestId>,
) -> Result<Json<Guest>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let guest = state
    .store
    .get_guest(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("guest {id} not found")))?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !guest_visible(&scope, &guest) {
    return Err(ApiError::Forbidden(format!(
      "guest {id} is outside your network"
    )));
  }
  Ok(Json(guest))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateGuestBody {
  pub full_name:      Option<String>,
  pub phone:          Option<String>,
  pub assigned_to_id: Option<PersonId>,
}

/// `PATCH /guests/:id` — setting `assigned_to_id` reassigns the guest and,
/// for a self-only inviter, ends their visibility of it.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<GuestId>,
  Json(body): Json<UpdateGuestBody>,
) -> Result<Json<Guest>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let guest = state
    .store
    .get_guest(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("guest {id} not found")))?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !guest_visible(&scope, &guest) {
    return Err(ApiError::Forbidden(format!(
      "guest {id} is outside your network"
    )));
  }

  if let Some(assignee) = body.assigned_to_id {
    ensure_assignee(&state, &scope, assignee).await?;
  }

  let updated = state
    .store
    .update_guest(
      id,
      GuestUpdate {
        full_name:      body.full_name,
        phone:          body.phone,
        assigned_to_id: body.assigned_to_id,
      },
    )
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(updated))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /guests/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<GuestId>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let guest = state
    .store
    .get_guest(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("guest {id} not found")))?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !guest_visible(&scope, &guest) {
    return Err(ApiError::Forbidden(format!(
      "guest {id} is outside your network"
    )));
  }

  state
    .store
    .delete_guest(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}
