//! Handlers for `/cells` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/cells` | Scoped by cell leader |
//! | `POST`   | `/cells` | Leader role/network rules apply before any write |
//! | `GET`    | `/cells/:id` | 404 unknown, 403 outside scope |
//! | `DELETE` | `/cells/:id` | Cascades members and attendance atomically |
//! | `POST`   | `/cells/:id/members` | Body: `{"person_id": …}` |
//! | `GET`    | `/cells/:id/attendance` | |
//! | `POST`   | `/cells/:id/attendance` | Body: [`RecordAttendanceBody`] |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;

use redil_core::{
  assignment::{check_cell_leader_role, check_leader_in_scope},
  entities::{
    Cell, CellAttendance, CellId, CellType, NewAttendance, NewCell,
  },
  person::PersonId,
  store::DirectoryStore,
  visibility::{Scope, cell_visible},
};

use crate::{AppState, auth::Requester, error::ApiError, handlers::scope_for};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /cells`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
) -> Result<Json<Vec<Cell>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  let cells = state
    .store
    .list_cells()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .into_iter()
    .filter(|c| cell_visible(&scope, c))
    .collect();
  Ok(Json(cells))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCellBody {
  pub name:      String,
  pub cell_type: CellType,
  pub leader_id: PersonId,
  pub address:   Option<String>,
}

/// `POST /cells` — both reassignment rules run before any write: the
/// leader's role must fit the cell type, and the leader must be inside the
/// requester's network (SUPER_ADMIN exempt).
pub async fn create<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Json(body): Json<CreateCellBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let leader = state
    .store
    .get_person(body.leader_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("leader {} does not exist", body.leader_id))
    })?;

  check_cell_leader_role(body.cell_type, leader.role)?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  check_leader_in_scope(&scope, leader.person_id)?;

  let cell = state
    .store
    .add_cell(NewCell {
      name:      body.name,
      cell_type: body.cell_type,
      leader_id: leader.person_id,
      address:   body.address,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(cell)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /cells/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<CellId>,
) -> Result<Json<Cell>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let (cell, _) = visible_cell(&state, &requester, id).await?;
  Ok(Json(cell))
}

/// Fetch a cell and enforce the 404/403 split; returns the scope for reuse.
async fn visible_cell<S>(
  state: &AppState<S>,
  requester: &Requester,
  id: CellId,
) -> Result<(Cell, Scope), ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let cell = state
    .store
    .get_cell(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("cell {id} not found")))?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  if !cell_visible(&scope, &cell) {
    return Err(ApiError::Forbidden(format!(
      "cell {id} is outside your network"
    )));
  }
  Ok((cell, scope))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /cells/:id` — unassigns members and removes attendance in the
/// same transaction as the cell row.
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<CellId>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  visible_cell(&state, &requester, id).await?;

  state
    .store
    .delete_cell(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(cell_id = id, removed_by = requester.0.person_id, "cell removed");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Members ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddMemberBody {
  pub person_id: PersonId,
}

/// `POST /cells/:id/members`
pub async fn add_member<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<CellId>,
  Json(body): Json<AddMemberBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let (_, scope) = visible_cell(&state, &requester, id).await?;

  state
    .store
    .get_person(body.person_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("person {} does not exist", body.person_id))
    })?;
  check_leader_in_scope(&scope, body.person_id)?;

  state
    .store
    .set_cell_membership(body.person_id, Some(id))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Attendance ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecordAttendanceBody {
  pub person_id:   PersonId,
  pub attended_on: NaiveDate,
}

/// `POST /cells/:id/attendance`
pub async fn record_attendance<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<CellId>,
  Json(body): Json<RecordAttendanceBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  visible_cell(&state, &requester, id).await?;

  state
    .store
    .get_person(body.person_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("person {} does not exist", body.person_id))
    })?;

  let attendance = state
    .store
    .record_attendance(NewAttendance {
      cell_id:     id,
      person_id:   body.person_id,
      attended_on: body.attended_on,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(attendance)))
}

/// `GET /cells/:id/attendance`
pub async fn list_attendance<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<CellId>,
) -> Result<Json<Vec<CellAttendance>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  visible_cell(&state, &requester, id).await?;

  let attendance = state
    .store
    .list_attendance(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(attendance))
}
