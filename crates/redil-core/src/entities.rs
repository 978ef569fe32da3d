//! Assignable entities — everything whose visibility derives from a person's
//! position in the hierarchy: guests, cells, attendance, seminar modules,
//! enrollments, events and event registrations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::person::PersonId;

pub type GuestId = i64;
pub type CellId = i64;
pub type AttendanceId = i64;
pub type ModuleId = i64;
pub type EnrollmentId = i64;
pub type EventId = i64;
pub type RegistrationId = i64;

// ─── Guests ──────────────────────────────────────────────────────────────────

/// A visitor invited by a member. Visibility follows both the inviter and,
/// once set, the assignee (see [`crate::visibility::guest_visible`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guest {
  pub guest_id:       GuestId,
  pub full_name:      String,
  pub phone:          Option<String>,
  pub invited_by_id:  PersonId,
  pub assigned_to_id: Option<PersonId>,
  pub created_at:     DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGuest {
  pub full_name:      String,
  pub phone:          Option<String>,
  pub invited_by_id:  PersonId,
  pub assigned_to_id: Option<PersonId>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct GuestUpdate {
  pub full_name:      Option<String>,
  pub phone:          Option<String>,
  pub assigned_to_id: Option<PersonId>,
}

// ─── Cells ───────────────────────────────────────────────────────────────────

/// Whether a cell is open to visitors or restricted to committed members.
/// The type constrains which role may lead it (see
/// [`crate::assignment::check_cell_leader_role`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
  Abierta,
  Cerrada,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
  pub cell_id:    CellId,
  pub name:       String,
  pub cell_type:  CellType,
  pub leader_id:  PersonId,
  pub address:    Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCell {
  pub name:      String,
  pub cell_type: CellType,
  pub leader_id: PersonId,
  pub address:   Option<String>,
}

/// One person present at one cell meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellAttendance {
  pub attendance_id: AttendanceId,
  pub cell_id:       CellId,
  pub person_id:     PersonId,
  pub attended_on:   NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
  pub cell_id:     CellId,
  pub person_id:   PersonId,
  pub attended_on: NaiveDate,
}

// ─── Seminar modules & enrollments ───────────────────────────────────────────

/// A teaching module in the seminar track, ordered by `position`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeminarModule {
  pub module_id: ModuleId,
  pub name:      String,
  pub position:  i64,
}

#[derive(Debug, Clone)]
pub struct NewModule {
  pub name:     String,
  pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
  pub enrollment_id: EnrollmentId,
  pub person_id:     PersonId,
  pub module_id:     ModuleId,
  pub enrolled_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEnrollment {
  pub person_id: PersonId,
  pub module_id: ModuleId,
}

// ─── Events & registrations ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
  Convention,
  Encuentro,
}

/// A paid gathering. `cost` is the per-person price in the currency's minor
/// unit (cents), as are all amounts on [`Registration`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:  EventId,
  pub name:      String,
  pub kind:      EventKind,
  pub starts_on: NaiveDate,
  pub cost:      i64,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
  pub name:      String,
  pub kind:      EventKind,
  pub starts_on: NaiveDate,
  pub cost:      i64,
}

/// A payment record tying a person to an event. `registered_by_id` is the
/// registrar and opens a second visibility path independent of the downline
/// (see [`crate::visibility::registration_visible`]). It becomes `None` only
/// if the registrar is later removed from the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
  pub registration_id:  RegistrationId,
  pub event_id:         EventId,
  pub person_id:        PersonId,
  pub registered_by_id: Option<PersonId>,
  pub amount_paid:      i64,
  pub recorded_at:      DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRegistration {
  pub event_id:         EventId,
  pub person_id:        PersonId,
  pub registered_by_id: PersonId,
  pub amount_paid:      i64,
}
