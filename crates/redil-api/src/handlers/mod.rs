//! Request handlers, one module per domain.
//!
//! Every handler follows the same ordering: resolve the target (404),
//! check the requester's scope (403), validate through the rule engine
//! (400/403), and only then touch the store.

pub mod cells;
pub mod enrollments;
pub mod events;
pub mod guests;
pub mod people;

use redil_core::{
  person::{Person, Role},
  store::DirectoryStore,
  visibility::Scope,
};

use crate::error::ApiError;

/// Resolve the requester's visibility scope against current hierarchy state.
pub(crate) async fn scope_for<S: DirectoryStore>(
  store: &S,
  person: &Person,
) -> Result<Scope, ApiError> {
  Scope::for_requester(store, person)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))
}

/// Directory-wide mutations (creating people, modules, events) are reserved
/// for the administrative roles.
pub(crate) fn require_admin(person: &Person) -> Result<(), ApiError> {
  match person.role {
    Role::SuperAdmin | Role::Pastor => Ok(()),
    _ => Err(ApiError::Forbidden(
      "this operation requires an administrative role".into(),
    )),
  }
}
