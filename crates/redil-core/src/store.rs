//! The `DirectoryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `redil-store-sqlite`).
//! Higher layers (`redil-api`) depend on this abstraction, not on any
//! concrete backend. The network resolver and the visibility scope take the
//! store as an injected handle, which keeps them testable against doubles.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use crate::{
  assignment::Ancestry,
  entities::{
    Cell, CellAttendance, CellId, Enrollment, Event, EventId, Guest, GuestId,
    GuestUpdate, ModuleId, NewAttendance, NewCell, NewEnrollment, NewEvent,
    NewGuest, NewModule, NewRegistration, Registration, SeminarModule,
  },
  person::{NewPerson, Person, PersonId, PersonUpdate},
};

/// Abstraction over a Redil directory backend.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Persons ───────────────────────────────────────────────────────────

  /// Create and persist a new person. `created_at` is set by the store.
  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// List all persons in the directory.
  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Look up a person and their stored password hash by login email.
  /// Returns `None` when no such person exists or they cannot log in.
  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<(Person, String)>, Self::Error>> + Send + 'a;

  /// Apply a partial update to a person's own attributes.
  fn update_person(
    &self,
    id: PersonId,
    update: PersonUpdate,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Remove a person. Hierarchy slots pointing at them are cleared by the
  /// backend; dependent attendance/enrollment rows go with them.
  fn delete_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All persons any of whose four hierarchy slots points at `id` — the
  /// single traversal primitive behind
  /// [`crate::network::resolve_downline`]. One query per expanded node.
  fn children_of(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<PersonId>, Self::Error>> + Send + '_;

  /// Set a person's immediate leader together with the snapshot-copied
  /// ancestry slots. The multi-field update is atomic: it commits together
  /// or not at all.
  fn assign_leader(
    &self,
    person_id: PersonId,
    leader_id: PersonId,
    ancestry: Ancestry,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Move a person into (or out of) a cell.
  fn set_cell_membership(
    &self,
    person_id: PersonId,
    cell_id: Option<CellId>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Guests ────────────────────────────────────────────────────────────

  fn add_guest(
    &self,
    input: NewGuest,
  ) -> impl Future<Output = Result<Guest, Self::Error>> + Send + '_;

  fn get_guest(
    &self,
    id: GuestId,
  ) -> impl Future<Output = Result<Option<Guest>, Self::Error>> + Send + '_;

  fn list_guests(
    &self,
  ) -> impl Future<Output = Result<Vec<Guest>, Self::Error>> + Send + '_;

  /// Apply a partial update, including reassignment of `assigned_to_id`.
  fn update_guest(
    &self,
    id: GuestId,
    update: GuestUpdate,
  ) -> impl Future<Output = Result<Guest, Self::Error>> + Send + '_;

  fn delete_guest(
    &self,
    id: GuestId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Cells ─────────────────────────────────────────────────────────────

  fn add_cell(
    &self,
    input: NewCell,
  ) -> impl Future<Output = Result<Cell, Self::Error>> + Send + '_;

  fn get_cell(
    &self,
    id: CellId,
  ) -> impl Future<Output = Result<Option<Cell>, Self::Error>> + Send + '_;

  fn list_cells(
    &self,
  ) -> impl Future<Output = Result<Vec<Cell>, Self::Error>> + Send + '_;

  /// Remove a cell atomically: unassign all member persons, remove the
  /// cell's attendance records, then remove the cell itself. Partial
  /// application would leave orphaned references.
  fn delete_cell(
    &self,
    id: CellId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn record_attendance(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<CellAttendance, Self::Error>> + Send + '_;

  fn list_attendance(
    &self,
    cell_id: CellId,
  ) -> impl Future<Output = Result<Vec<CellAttendance>, Self::Error>> + Send + '_;

  // ── Seminar modules & enrollments ─────────────────────────────────────

  fn add_module(
    &self,
    input: NewModule,
  ) -> impl Future<Output = Result<SeminarModule, Self::Error>> + Send + '_;

  fn get_module(
    &self,
    id: ModuleId,
  ) -> impl Future<Output = Result<Option<SeminarModule>, Self::Error>> + Send + '_;

  fn list_modules(
    &self,
  ) -> impl Future<Output = Result<Vec<SeminarModule>, Self::Error>> + Send + '_;

  fn add_enrollment(
    &self,
    input: NewEnrollment,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  /// List enrollments, optionally restricted to one person.
  fn list_enrollments(
    &self,
    person_id: Option<PersonId>,
  ) -> impl Future<Output = Result<Vec<Enrollment>, Self::Error>> + Send + '_;

  // ── Events & registrations ────────────────────────────────────────────

  fn add_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  fn add_registration(
    &self,
    input: NewRegistration,
  ) -> impl Future<Output = Result<Registration, Self::Error>> + Send + '_;

  fn list_registrations(
    &self,
    event_id: EventId,
  ) -> impl Future<Output = Result<Vec<Registration>, Self::Error>> + Send + '_;
}
