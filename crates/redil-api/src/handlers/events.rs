//! Handlers for `/events` endpoints — conventions and encuentros, their
//! payment registrations, and the scoped balance report.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/events` | Catalogue; visible to any authenticated person |
//! | `POST` | `/events` | Admin only |
//! | `GET`  | `/events/:id` | |
//! | `GET`  | `/events/:id/registrations` | Scoped: downline ∪ registrar |
//! | `POST` | `/events/:id/registrations` | Registrar is always the requester |
//! | `GET`  | `/events/:id/balance` | Totals over the scoped registrations |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use redil_core::{
  entities::{Event, EventId, EventKind, NewEvent, NewRegistration, Registration},
  person::PersonId,
  store::DirectoryStore,
  visibility::registration_visible,
};

use crate::{
  AppState,
  auth::Requester,
  error::ApiError,
  handlers::{require_admin, scope_for},
};

// ─── Events ───────────────────────────────────────────────────────────────────

/// `GET /events`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _requester: Requester,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let events = state
    .store
    .list_events()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct CreateEventBody {
  pub name:      String,
  pub kind:      EventKind,
  pub starts_on: NaiveDate,
  /// Per-person price in the currency's minor unit.
  pub cost:      i64,
}

/// `POST /events` — admin only.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Json(body): Json<CreateEventBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  require_admin(&requester.0)?;

  let event = state
    .store
    .add_event(NewEvent {
      name:      body.name,
      kind:      body.kind,
      starts_on: body.starts_on,
      cost:      body.cost,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _requester: Requester,
  Path(id): Path<EventId>,
) -> Result<Json<Event>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let event = fetch_event(&state, id).await?;
  Ok(Json(event))
}

async fn fetch_event<S>(
  state: &AppState<S>,
  id: EventId,
) -> Result<Event, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  state
    .store
    .get_event(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))
}

// ─── Registrations ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub person_id:   PersonId,
  pub amount_paid: i64,
}

/// `POST /events/:id/registrations` — the requester is recorded as the
/// registrar. Registering someone outside the requester's downline is
/// allowed; the registrar path keeps the record visible to them.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<EventId>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let event = fetch_event(&state, id).await?;

  state
    .store
    .get_person(body.person_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest(format!("person {} does not exist", body.person_id))
    })?;

  let registration = state
    .store
    .add_registration(NewRegistration {
      event_id:         event.event_id,
      person_id:        body.person_id,
      registered_by_id: requester.0.person_id,
      amount_paid:      body.amount_paid,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(registration)))
}

/// `GET /events/:id/registrations`
pub async fn list_registrations<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<EventId>,
) -> Result<Json<Vec<Registration>>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let registrations = scoped_registrations(&state, &requester, id).await?;
  Ok(Json(registrations))
}

async fn scoped_registrations<S>(
  state: &AppState<S>,
  requester: &Requester,
  id: EventId,
) -> Result<Vec<Registration>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  fetch_event(state, id).await?;

  let scope = scope_for(state.store.as_ref(), &requester.0).await?;
  Ok(
    state
      .store
      .list_registrations(id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .into_iter()
      .filter(|r| registration_visible(&scope, r))
      .collect(),
  )
}

// ─── Balance report ───────────────────────────────────────────────────────────

/// Financial summary over the registrations visible to the requester.
#[derive(Debug, Serialize)]
pub struct BalanceReport {
  pub event_id:           EventId,
  pub event_cost:         i64,
  pub registration_count: usize,
  pub total_paid:         i64,
  /// Outstanding balance: `count * cost - paid`. Negative means overpaid.
  pub total_due:          i64,
}

/// `GET /events/:id/balance`
pub async fn balance<S>(
  State(state): State<AppState<S>>,
  requester: Requester,
  Path(id): Path<EventId>,
) -> Result<Json<BalanceReport>, ApiError>
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  let event = fetch_event(&state, id).await?;
  let registrations = scoped_registrations(&state, &requester, id).await?;

  let total_paid: i64 = registrations.iter().map(|r| r.amount_paid).sum();
  let count = registrations.len();

  Ok(Json(BalanceReport {
    event_id:           event.event_id,
    event_cost:         event.cost,
    registration_count: count,
    total_paid,
    total_due:          (count as i64) * event.cost - total_paid,
  }))
}
