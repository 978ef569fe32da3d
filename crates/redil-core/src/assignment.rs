//! Leader-reassignment rules — the validation gate in front of every
//! hierarchy or cell-leadership mutation.
//!
//! Stored ancestry is snapshot-copied from the new leader at assignment
//! time, not live-linked: a later change to the leader's own ancestry does
//! not retroactively update already-assigned descendants unless the
//! assignment is re-triggered.

use serde::{Deserialize, Serialize};

use crate::{
  entities::CellType,
  error::{Error, Result},
  person::{Person, PersonId, Role},
  visibility::Scope,
};

// ─── Ancestry snapshot ───────────────────────────────────────────────────────

/// The three level slots written alongside a new immediate leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ancestry {
  pub lider_celula_id: Option<PersonId>,
  pub lider_doce_id:   Option<PersonId>,
  pub pastor_id:       Option<PersonId>,
}

/// Compute the ancestry a person inherits when assigned under `new_leader`.
///
/// The leader's own level contributes the leader themself; higher slots are
/// copied from the leader's stored chain. Assigning under a person with no
/// hierarchy level of their own copies their slots verbatim.
pub fn inherited_ancestry(new_leader: &Person) -> Ancestry {
  match new_leader.role {
    Role::LiderCelula => Ancestry {
      lider_celula_id: Some(new_leader.person_id),
      lider_doce_id:   new_leader.lider_doce_id,
      pastor_id:       new_leader.pastor_id,
    },
    Role::LiderDoce => Ancestry {
      lider_celula_id: None,
      lider_doce_id:   Some(new_leader.person_id),
      pastor_id:       new_leader.pastor_id,
    },
    Role::Pastor => Ancestry {
      lider_celula_id: None,
      lider_doce_id:   None,
      pastor_id:       Some(new_leader.person_id),
    },
    _ => Ancestry {
      lider_celula_id: new_leader.lider_celula_id,
      lider_doce_id:   new_leader.lider_doce_id,
      pastor_id:       new_leader.pastor_id,
    },
  }
}

// ─── Cell-leadership rules ───────────────────────────────────────────────────

/// A CERRADA cell must be led by exactly a LIDER_DOCE; an ABIERTA cell by a
/// LIDER_CELULA, LIDER_DOCE or PASTOR. Checked before any write.
pub fn check_cell_leader_role(cell_type: CellType, role: Role) -> Result<()> {
  let allowed: &[Role] = match cell_type {
    CellType::Cerrada => &[Role::LiderDoce],
    CellType::Abierta => &[Role::LiderCelula, Role::LiderDoce, Role::Pastor],
  };
  if allowed.contains(&role) {
    Ok(())
  } else {
    Err(Error::CellLeaderRole { cell_type, role })
  }
}

/// Leadership may only be handed to someone inside the requester's scope
/// (self included). An unrestricted scope — SUPER_ADMIN — is exempt.
pub fn check_leader_in_scope(scope: &Scope, leader_id: PersonId) -> Result<()> {
  if scope.allows(leader_id) {
    Ok(())
  } else {
    Err(Error::LeaderOutsideNetwork(leader_id))
  }
}
