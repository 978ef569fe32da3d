//! Error type for `redil-store-sqlite`.

use thiserror::Error;

use redil_core::{
  entities::{CellId, GuestId},
  person::PersonId,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("column decode error: {0}")]
  Decode(String),

  /// Attempted to update, reassign or delete a person that was not found.
  #[error("person not found: {0}")]
  PersonNotFound(PersonId),

  #[error("guest not found: {0}")]
  GuestNotFound(GuestId),

  #[error("cell not found: {0}")]
  CellNotFound(CellId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
