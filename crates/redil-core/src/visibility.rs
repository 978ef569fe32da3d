//! Visibility scoping — the single place where role maps to what a
//! requester may see.
//!
//! Every domain filters through a [`Scope`]: the scoping algorithm
//! (self ∪ downline, or self-only) is shared, per-domain adapters supply
//! only their ownership fields. Adding a role touches the
//! [`ScopeRule::for_role`] table and nothing else.

use std::collections::BTreeSet;

use crate::{
  entities::{Cell, Guest, Registration},
  network::resolve_downline,
  person::{Person, PersonId, Role},
  store::DirectoryStore,
};

// ─── Rule table ──────────────────────────────────────────────────────────────

/// Which scoping rule a role falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRule {
  /// No filter at all.
  Unrestricted,
  /// Self plus the resolved downline.
  Network,
  /// Self only.
  SelfOnly,
}

impl ScopeRule {
  pub fn for_role(role: Role) -> ScopeRule {
    match role {
      Role::SuperAdmin => ScopeRule::Unrestricted,
      Role::Pastor | Role::LiderDoce | Role::LiderCelula => ScopeRule::Network,
      Role::Discipulo | Role::Invitado | Role::Profesor | Role::Auxiliar => {
        ScopeRule::SelfOnly
      }
    }
  }
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// A requester's resolved visibility scope — the request-scoped filter
/// consumed by every listing and lookup. Built once per request.
#[derive(Debug, Clone)]
pub enum Scope {
  Unrestricted,
  /// `members` always includes the requester themself.
  Network {
    requester: PersonId,
    members:   BTreeSet<PersonId>,
  },
  SelfOnly { requester: PersonId },
}

impl Scope {
  /// Resolve the scope for `person` against current hierarchy state.
  pub async fn for_requester<S: DirectoryStore>(
    store: &S,
    person: &Person,
  ) -> Result<Scope, S::Error> {
    match ScopeRule::for_role(person.role) {
      ScopeRule::Unrestricted => Ok(Scope::Unrestricted),
      ScopeRule::Network => {
        let mut members =
          resolve_downline(store, Some(person.person_id)).await?;
        members.insert(person.person_id);
        Ok(Scope::Network { requester: person.person_id, members })
      }
      ScopeRule::SelfOnly => {
        Ok(Scope::SelfOnly { requester: person.person_id })
      }
    }
  }

  /// The requester behind this scope, if it is tied to one.
  pub fn requester(&self) -> Option<PersonId> {
    match self {
      Scope::Unrestricted => None,
      Scope::Network { requester, .. } | Scope::SelfOnly { requester } => {
        Some(*requester)
      }
    }
  }

  /// Whether an entity owned by `owner` is inside this scope.
  pub fn allows(&self, owner: PersonId) -> bool {
    match self {
      Scope::Unrestricted => true,
      Scope::Network { members, .. } => members.contains(&owner),
      Scope::SelfOnly { requester } => *requester == owner,
    }
  }

  /// Whether any of the given owners is inside this scope.
  pub fn allows_any(&self, owners: impl IntoIterator<Item = PersonId>) -> bool {
    owners.into_iter().any(|owner| self.allows(owner))
  }
}

// ─── Domain adapters ─────────────────────────────────────────────────────────

/// Guest visibility. Ownership fields: inviter and assignee.
///
/// Extra rule for self-only scopes: a self-invited guest stops being
/// visible to the inviter once the guest is assigned to someone else —
/// "invited" without "assigned" is no longer sufficient after assignment.
pub fn guest_visible(scope: &Scope, guest: &Guest) -> bool {
  match scope {
    Scope::SelfOnly { requester } => {
      if guest.assigned_to_id == Some(*requester) {
        return true;
      }
      guest.invited_by_id == *requester
        && guest.assigned_to_id.is_none_or(|a| a == *requester)
    }
    _ => scope.allows_any(
      [Some(guest.invited_by_id), guest.assigned_to_id]
        .into_iter()
        .flatten(),
    ),
  }
}

/// Cell visibility. Ownership field: the cell's leader.
pub fn cell_visible(scope: &Scope, cell: &Cell) -> bool {
  scope.allows(cell.leader_id)
}

/// Enrollment visibility. Ownership field: the enrolled person.
pub fn enrollment_visible(scope: &Scope, enrollee: PersonId) -> bool {
  scope.allows(enrollee)
}

/// Registration visibility. Ownership field: the registered person,
/// UNIONED with a second independent path — the requester is the recorded
/// registrar — even when the registered person is outside the downline.
pub fn registration_visible(scope: &Scope, registration: &Registration) -> bool {
  if scope.allows(registration.person_id) {
    return true;
  }
  scope.requester().is_some()
    && registration.registered_by_id == scope.requester()
}
