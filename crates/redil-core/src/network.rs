//! Network resolution — the transitive downline of a person.
//!
//! The hierarchy is stored as four parallel parent slots on each person
//! ([`crate::person::EdgeKind`]). Resolution is a breadth-first traversal
//! over [`DirectoryStore::children_of`], which answers the OR across all
//! four slots in a single query per expanded node. The result is
//! request-scoped and never persisted.

use std::collections::{BTreeSet, VecDeque};

use crate::{person::PersonId, store::DirectoryStore};

/// Compute the set of person ids transitively reporting to `root` through
/// any hierarchy edge.
///
/// `None` — the defined behaviour for an absent or malformed scope
/// parameter — yields an empty set, not an error. A root with no persisted
/// person also resolves to the empty set; whether that absence is an error
/// is the calling domain's decision.
///
/// The returned set never contains `root` itself. Callers that need "self
/// included" union the root id afterwards (the scope builder does).
///
/// A visited-set guarantees termination even if the stored graph contains a
/// cycle; a root reachable from its own downline is logged as a
/// data-integrity warning and skipped.
pub async fn resolve_downline<S: DirectoryStore>(
  store: &S,
  root: Option<PersonId>,
) -> Result<BTreeSet<PersonId>, S::Error> {
  let Some(root) = root else {
    return Ok(BTreeSet::new());
  };

  let mut downline = BTreeSet::new();
  let mut visited: BTreeSet<PersonId> = BTreeSet::from([root]);
  let mut frontier: VecDeque<PersonId> = VecDeque::from([root]);

  while let Some(node) = frontier.pop_front() {
    for child in store.children_of(node).await? {
      if child == root {
        tracing::warn!(
          person_id = root,
          via = node,
          "person is reachable from their own downline; hierarchy data \
           contains a cycle"
        );
        continue;
      }
      // Already-seen nodes are expected under diamond-shaped ancestry
      // (a person's doce and pastor slots both inside the subtree).
      if visited.insert(child) {
        downline.insert(child);
        frontier.push_back(child);
      }
    }
  }

  Ok(downline)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    person::{EdgeKind, NewPerson, Role},
    testing::MemoryStore,
  };

  async fn person_under(
    store: &MemoryStore,
    name: &str,
    role: Role,
    edge: EdgeKind,
    parent: PersonId,
  ) -> PersonId {
    let mut input = NewPerson::new(name, role);
    match edge {
      EdgeKind::Leader => input.leader_id = Some(parent),
      EdgeKind::LiderDoce => input.lider_doce_id = Some(parent),
      EdgeKind::LiderCelula => input.lider_celula_id = Some(parent),
      EdgeKind::Pastor => input.pastor_id = Some(parent),
    }
    store.add(input).person_id
  }

  #[tokio::test]
  async fn missing_root_resolves_to_empty_set() {
    let store = MemoryStore::new();
    let downline = resolve_downline(&store, None).await.unwrap();
    assert!(downline.is_empty());
  }

  #[tokio::test]
  async fn unknown_root_resolves_to_empty_set() {
    let store = MemoryStore::new();
    let downline = resolve_downline(&store, Some(999)).await.unwrap();
    assert!(downline.is_empty());
  }

  #[tokio::test]
  async fn leafless_person_resolves_to_empty_set() {
    let store = MemoryStore::new();
    let p = store.add(NewPerson::new("Pedro", Role::Discipulo)).person_id;
    let downline = resolve_downline(&store, Some(p)).await.unwrap();
    assert!(downline.is_empty());
  }

  #[tokio::test]
  async fn mixed_edge_chain_resolves_transitively() {
    // A -(lider_doce)-> B -(lider_celula)-> C -(leader)-> D
    let store = MemoryStore::new();
    let a = store.add(NewPerson::new("Ana", Role::Pastor)).person_id;
    let b = person_under(&store, "Berta", Role::LiderDoce, EdgeKind::LiderDoce, a).await;
    let c = person_under(&store, "Carla", Role::LiderCelula, EdgeKind::LiderCelula, b).await;
    let d = person_under(&store, "Diego", Role::Discipulo, EdgeKind::Leader, c).await;

    let from_a = resolve_downline(&store, Some(a)).await.unwrap();
    assert_eq!(from_a, BTreeSet::from([b, c, d]));

    let from_b = resolve_downline(&store, Some(b)).await.unwrap();
    assert_eq!(from_b, BTreeSet::from([c, d]));

    let from_d = resolve_downline(&store, Some(d)).await.unwrap();
    assert!(from_d.is_empty());
  }

  #[tokio::test]
  async fn downline_never_contains_the_root() {
    let store = MemoryStore::new();
    let a = store.add(NewPerson::new("Ana", Role::LiderDoce)).person_id;
    let b = person_under(&store, "Berta", Role::Discipulo, EdgeKind::Leader, a).await;

    let downline = resolve_downline(&store, Some(a)).await.unwrap();
    assert!(!downline.contains(&a));
    assert!(downline.contains(&b));
  }

  #[tokio::test]
  async fn diamond_ancestry_is_deduplicated() {
    // D carries both doce and pastor slots inside the same subtree.
    let store = MemoryStore::new();
    let w = store.add(NewPerson::new("Walter", Role::Pastor)).person_id;
    let z = person_under(&store, "Zoe", Role::LiderDoce, EdgeKind::Pastor, w).await;

    let mut input = NewPerson::new("Diego", Role::Discipulo);
    input.lider_doce_id = Some(z);
    input.pastor_id = Some(w);
    let d = store.add(input).person_id;

    let downline = resolve_downline(&store, Some(w)).await.unwrap();
    assert_eq!(downline, BTreeSet::from([z, d]));
  }

  #[tokio::test]
  async fn two_node_cycle_terminates() {
    // A's leader is B and B's leader is A. Resolving either side must
    // terminate and return a finite set.
    let store = MemoryStore::new();
    let a = store.add(NewPerson::new("Ana", Role::LiderCelula)).person_id;
    let b = person_under(&store, "Berta", Role::LiderCelula, EdgeKind::Leader, a).await;
    store.set_parent(a, EdgeKind::Leader, Some(b));

    let from_a = resolve_downline(&store, Some(a)).await.unwrap();
    assert_eq!(from_a, BTreeSet::from([b]));

    let from_b = resolve_downline(&store, Some(b)).await.unwrap();
    assert_eq!(from_b, BTreeSet::from([a]));
  }

  #[tokio::test]
  async fn resolution_is_idempotent_between_writes() {
    let store = MemoryStore::new();
    let a = store.add(NewPerson::new("Ana", Role::Pastor)).person_id;
    person_under(&store, "Berta", Role::LiderDoce, EdgeKind::Pastor, a).await;
    person_under(&store, "Carla", Role::LiderDoce, EdgeKind::Pastor, a).await;

    let first = resolve_downline(&store, Some(a)).await.unwrap();
    let second = resolve_downline(&store, Some(a)).await.unwrap();
    assert_eq!(first, second);
  }
}
