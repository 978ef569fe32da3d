//! Person — a node in the discipleship hierarchy.
//!
//! A person carries up to four parent references at once. The lower slots are
//! snapshot-copies of the immediate leader's own ancestry taken at assignment
//! time (see [`crate::assignment`]); visibility scoping never reads them as a
//! chain, it re-traverses the graph per request (see [`crate::network`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::CellId;

/// Identifier of a [`Person`]. Backed by the store's integer primary key.
pub type PersonId = i64;

// ─── Role ────────────────────────────────────────────────────────────────────

/// Organisational role. Determines which visibility rule applies and which
/// hierarchy positions a person may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  SuperAdmin,
  Pastor,
  LiderDoce,
  LiderCelula,
  Discipulo,
  Invitado,
  Profesor,
  Auxiliar,
}

// ─── Hierarchy edges ─────────────────────────────────────────────────────────

/// The four typed relations a person may hold toward a superior. A person is
/// "under" a node if ANY of the four slots points at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
  /// Generic immediate leader.
  Leader,
  /// Doce-level leader.
  LiderDoce,
  /// Cell-level leader.
  LiderCelula,
  /// Pastor-level leader.
  Pastor,
}

impl EdgeKind {
  pub const ALL: [EdgeKind; 4] = [
    EdgeKind::Leader,
    EdgeKind::LiderDoce,
    EdgeKind::LiderCelula,
    EdgeKind::Pastor,
  ];
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A member of the directory. Credentials are not part of this type; they are
/// surfaced only through [`crate::store::DirectoryStore::find_credentials`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
  pub person_id:       PersonId,
  pub full_name:       String,
  pub email:           Option<String>,
  pub role:            Role,
  pub leader_id:       Option<PersonId>,
  pub lider_doce_id:   Option<PersonId>,
  pub lider_celula_id: Option<PersonId>,
  pub pastor_id:       Option<PersonId>,
  /// Cell membership; cleared when the cell is deleted.
  pub cell_id:         Option<CellId>,
  pub created_at:      DateTime<Utc>,
}

impl Person {
  /// The parent reference held in the given slot, if any.
  pub fn parent(&self, kind: EdgeKind) -> Option<PersonId> {
    match kind {
      EdgeKind::Leader => self.leader_id,
      EdgeKind::LiderDoce => self.lider_doce_id,
      EdgeKind::LiderCelula => self.lider_celula_id,
      EdgeKind::Pastor => self.pastor_id,
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::DirectoryStore::add_person`].
/// `created_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewPerson {
  pub full_name:       String,
  pub email:           Option<String>,
  /// Argon2 PHC string for people who can log in.
  pub password_hash:   Option<String>,
  pub role:            Role,
  pub leader_id:       Option<PersonId>,
  pub lider_doce_id:   Option<PersonId>,
  pub lider_celula_id: Option<PersonId>,
  pub pastor_id:       Option<PersonId>,
}

impl NewPerson {
  /// Convenience constructor with no credentials and no hierarchy position.
  pub fn new(full_name: impl Into<String>, role: Role) -> Self {
    Self {
      full_name: full_name.into(),
      email: None,
      password_hash: None,
      role,
      leader_id: None,
      lider_doce_id: None,
      lider_celula_id: None,
      pastor_id: None,
    }
  }
}

/// Partial update for a person's own attributes. Hierarchy slots are not
/// updatable here; leader changes go through
/// [`crate::store::DirectoryStore::assign_leader`] so the reassignment rules
/// always apply.
#[derive(Debug, Clone, Default)]
pub struct PersonUpdate {
  pub full_name: Option<String>,
  pub email:     Option<String>,
  pub role:      Option<Role>,
}
