//! Error types for `redil-core`.

use thiserror::Error;

use crate::{
  entities::{CellId, CellType, EventId, GuestId, ModuleId},
  person::{PersonId, Role},
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(PersonId),

  #[error("guest not found: {0}")]
  GuestNotFound(GuestId),

  #[error("cell not found: {0}")]
  CellNotFound(CellId),

  #[error("module not found: {0}")]
  ModuleNotFound(ModuleId),

  #[error("event not found: {0}")]
  EventNotFound(EventId),

  /// The chosen leader's role is not allowed for the cell type.
  /// Distinct from [`Error::LeaderOutsideNetwork`] by requirement.
  #[error("a {cell_type:?} cell cannot be led by a {role:?}")]
  CellLeaderRole { cell_type: CellType, role: Role },

  /// The chosen leader is outside the requester's network.
  #[error("person {0} is outside your network")]
  LeaderOutsideNetwork(PersonId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
