//! JSON REST API for the Redil discipleship directory.
//!
//! Exposes an axum [`Router`] backed by any
//! [`redil_core::store::DirectoryStore`]. Every route except `/health` sits
//! behind HTTP Basic auth resolving the requester's person record; every
//! read is filtered through the requester's visibility scope.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, post},
};
use redil_core::store::DirectoryStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use handlers::{cells, enrollments, events, guests, people};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `REDIL_`-prefixed environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Seed SUPER_ADMIN login applied once, when the directory is empty.
  pub admin_email:         Option<String>,
  /// Argon2 PHC string; generate with `server --hash-password`.
  pub admin_password_hash: Option<String>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: DirectoryStore> {
  pub store: Arc<S>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the directory API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DirectoryStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/health", get(health))
    // People & hierarchy
    .route(
      "/people",
      get(people::list::<S>).post(people::create::<S>),
    )
    .route(
      "/people/{id}",
      get(people::get_one::<S>)
        .patch(people::update::<S>)
        .delete(people::delete_one::<S>),
    )
    .route("/people/{id}/network", get(people::network::<S>))
    .route("/people/{id}/leader", post(people::assign_leader::<S>))
    // Guests
    .route(
      "/guests",
      get(guests::list::<S>).post(guests::create::<S>),
    )
    .route(
      "/guests/{id}",
      get(guests::get_one::<S>)
        .patch(guests::update::<S>)
        .delete(guests::delete_one::<S>),
    )
    // Cells
    .route("/cells", get(cells::list::<S>).post(cells::create::<S>))
    .route(
      "/cells/{id}",
      get(cells::get_one::<S>).delete(cells::delete_one::<S>),
    )
    .route("/cells/{id}/members", post(cells::add_member::<S>))
    .route(
      "/cells/{id}/attendance",
      get(cells::list_attendance::<S>).post(cells::record_attendance::<S>),
    )
    // Seminar modules & enrollments
    .route(
      "/modules",
      get(enrollments::list_modules::<S>).post(enrollments::create_module::<S>),
    )
    .route(
      "/enrollments",
      get(enrollments::list::<S>).post(enrollments::create::<S>),
    )
    // Events & registrations
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route("/events/{id}", get(events::get_one::<S>))
    .route(
      "/events/{id}/registrations",
      get(events::list_registrations::<S>).post(events::register::<S>),
    )
    .route("/events/{id}/balance", get(events::balance::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use redil_core::{
    person::{NewPerson, Person, Role},
    store::DirectoryStore,
  };
  use redil_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  const PASSWORD: &str = "secreto";

  async fn make_state() -> AppState<SqliteStore> {
    AppState {
      store: Arc::new(SqliteStore::open_in_memory().await.unwrap()),
    }
  }

  fn phc() -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(PASSWORD.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  /// Seed a person who can log in, with optional hierarchy wiring.
  async fn login_person(
    state: &AppState<SqliteStore>,
    name: &str,
    email: &str,
    role: Role,
    configure: impl FnOnce(&mut NewPerson),
  ) -> Person {
    let mut input = NewPerson::new(name, role);
    input.email = Some(email.to_string());
    input.password_hash = Some(phc());
    configure(&mut input);
    state.store.add_person(input).await.unwrap()
  }

  /// Seed a person with no login, with optional hierarchy wiring.
  async fn plain_person(
    state: &AppState<SqliteStore>,
    name: &str,
    role: Role,
    configure: impl FnOnce(&mut NewPerson),
  ) -> Person {
    let mut input = NewPerson::new(name, role);
    configure(&mut input);
    state.store.add_person(input).await.unwrap()
  }

  fn basic(email: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{PASSWORD}")))
  }

  async fn send(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(a) = auth {
      builder = builder.header(header::AUTHORIZATION, a);
    }
    let req = match body {
      Some(b) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(b.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  // ── Auth ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_is_unauthenticated() {
    let state = make_state().await;
    let resp = send(state, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn missing_credentials_return_401() {
    let state = make_state().await;
    let resp = send(state, "GET", "/people", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn wrong_password_returns_401() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;

    let bad = format!("Basic {}", B64.encode("ana@redil.test:equivocada"));
    let resp = send(state, "GET", "/people", Some(&bad), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── People ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_creates_and_lists_people() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;
    let auth = basic("ana@redil.test");

    let resp = send(
      state.clone(),
      "POST",
      "/people",
      Some(&auth),
      Some(serde_json::json!({
        "full_name": "Diego Mora",
        "role": "discipulo"
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert_eq!(created["full_name"], "Diego Mora");

    let resp = send(state, "GET", "/people", Some(&auth), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = json_body(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn non_admin_cannot_create_people() {
    let state = make_state().await;
    login_person(&state, "Diego", "diego@redil.test", Role::Discipulo, |_| {})
      .await;

    let resp = send(
      state,
      "POST",
      "/people",
      Some(&basic("diego@redil.test")),
      Some(serde_json::json!({ "full_name": "X", "role": "discipulo" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn lider_sees_only_their_network() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;
    let doce =
      login_person(&state, "Lidia", "lidia@redil.test", Role::LiderDoce, |_| {})
        .await;
    let report = plain_person(&state, "Diego", Role::Discipulo, |p| {
      p.lider_doce_id = Some(doce.person_id);
    })
    .await;
    plain_person(&state, "Otro", Role::Discipulo, |_| {}).await;

    let resp =
      send(state, "GET", "/people", Some(&basic("lidia@redil.test")), None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = json_body(resp).await;
    let ids: Vec<i64> = listed
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["person_id"].as_i64().unwrap())
      .collect();
    assert_eq!(ids, vec![doce.person_id, report.person_id]);
  }

  #[tokio::test]
  async fn unknown_person_is_404_but_outside_network_is_403() {
    let state = make_state().await;
    login_person(&state, "Lidia", "lidia@redil.test", Role::LiderDoce, |_| {})
      .await;
    let outsider = plain_person(&state, "Otro", Role::Discipulo, |_| {}).await;

    let auth = basic("lidia@redil.test");

    let resp =
      send(state.clone(), "GET", "/people/9999", Some(&auth), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(
      state,
      "GET",
      &format!("/people/{}", outsider.person_id),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn network_endpoint_returns_transitive_downline() {
    let state = make_state().await;
    let a =
      login_person(&state, "Ana", "ana@redil.test", Role::Pastor, |_| {}).await;
    let b = plain_person(&state, "Berta", Role::LiderDoce, |p| {
      p.lider_doce_id = Some(a.person_id);
    })
    .await;
    let c = plain_person(&state, "Carla", Role::LiderCelula, |p| {
      p.lider_celula_id = Some(b.person_id);
    })
    .await;
    let d = plain_person(&state, "Diego", Role::Discipulo, |p| {
      p.leader_id = Some(c.person_id);
    })
    .await;

    let resp = send(
      state,
      "GET",
      &format!("/people/{}/network", a.person_id),
      Some(&basic("ana@redil.test")),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let downline = json_body(resp).await;
    assert_eq!(
      downline,
      serde_json::json!([b.person_id, c.person_id, d.person_id])
    );
  }

  #[tokio::test]
  async fn assign_leader_snapshot_copies_ancestry() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;
    let w = plain_person(&state, "Walter", Role::Pastor, |_| {}).await;
    let z = plain_person(&state, "Zoe", Role::LiderDoce, |p| {
      p.pastor_id = Some(w.person_id);
    })
    .await;
    let y = plain_person(&state, "Yolanda", Role::LiderCelula, |p| {
      p.lider_doce_id = Some(z.person_id);
      p.pastor_id = Some(w.person_id);
    })
    .await;
    let x = plain_person(&state, "Ximena", Role::Discipulo, |_| {}).await;

    let resp = send(
      state,
      "POST",
      &format!("/people/{}/leader", x.person_id),
      Some(&basic("ana@redil.test")),
      Some(serde_json::json!({ "leader_id": y.person_id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json_body(resp).await;
    assert_eq!(updated["leader_id"], y.person_id);
    assert_eq!(updated["lider_celula_id"], y.person_id);
    assert_eq!(updated["lider_doce_id"], z.person_id);
    assert_eq!(updated["pastor_id"], w.person_id);
  }

  #[tokio::test]
  async fn assign_leader_outside_network_is_403() {
    let state = make_state().await;
    let doce1 =
      login_person(&state, "Lidia", "lidia@redil.test", Role::LiderDoce, |_| {})
        .await;
    let doce2 = plain_person(&state, "Marta", Role::LiderDoce, |_| {}).await;
    let report = plain_person(&state, "Diego", Role::Discipulo, |p| {
      p.lider_doce_id = Some(doce1.person_id);
    })
    .await;

    let resp = send(
      state,
      "POST",
      &format!("/people/{}/leader", report.person_id),
      Some(&basic("lidia@redil.test")),
      Some(serde_json::json!({ "leader_id": doce2.person_id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  // ── Guests ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn guest_reassignment_hides_it_from_the_inviter() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;
    login_person(&state, "D1", "d1@redil.test", Role::Discipulo, |_| {}).await;
    let d2 =
      login_person(&state, "D2", "d2@redil.test", Role::Discipulo, |_| {})
        .await;

    // D1 invites a guest.
    let resp = send(
      state.clone(),
      "POST",
      "/guests",
      Some(&basic("d1@redil.test")),
      Some(serde_json::json!({ "full_name": "Gabriela" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let guest_id = json_body(resp).await["guest_id"].as_i64().unwrap();

    let resp = send(
      state.clone(),
      "GET",
      "/guests",
      Some(&basic("d1@redil.test")),
      None,
    )
    .await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

    // Admin reassigns the guest to D2.
    let resp = send(
      state.clone(),
      "PATCH",
      &format!("/guests/{guest_id}"),
      Some(&basic("ana@redil.test")),
      Some(serde_json::json!({ "assigned_to_id": d2.person_id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The inviter no longer sees it; the assignee does.
    let resp = send(
      state.clone(),
      "GET",
      "/guests",
      Some(&basic("d1@redil.test")),
      None,
    )
    .await;
    assert!(json_body(resp).await.as_array().unwrap().is_empty());

    let resp = send(
      state.clone(),
      "GET",
      &format!("/guests/{guest_id}"),
      Some(&basic("d1@redil.test")),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
      state,
      "GET",
      &format!("/guests/{guest_id}"),
      Some(&basic("d2@redil.test")),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Cells ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn cerrada_cell_requires_a_doce_leader() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;
    let celula = plain_person(&state, "Carla", Role::LiderCelula, |_| {}).await;
    let doce = plain_person(&state, "Lidia", Role::LiderDoce, |_| {}).await;
    let auth = basic("ana@redil.test");

    let resp = send(
      state.clone(),
      "POST",
      "/cells",
      Some(&auth),
      Some(serde_json::json!({
        "name": "Roca",
        "cell_type": "cerrada",
        "leader_id": celula.person_id
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
      state,
      "POST",
      "/cells",
      Some(&auth),
      Some(serde_json::json!({
        "name": "Roca",
        "cell_type": "cerrada",
        "leader_id": doce.person_id
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  #[tokio::test]
  async fn cell_leader_outside_network_is_403_not_400() {
    let state = make_state().await;
    login_person(&state, "Lidia", "lidia@redil.test", Role::LiderDoce, |_| {})
      .await;
    // A valid cell-leader role, but in nobody's network.
    let stray = plain_person(&state, "Carla", Role::LiderCelula, |_| {}).await;

    let resp = send(
      state,
      "POST",
      "/cells",
      Some(&basic("lidia@redil.test")),
      Some(serde_json::json!({
        "name": "Monte",
        "cell_type": "abierta",
        "leader_id": stray.person_id
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn deleting_a_cell_unassigns_its_members() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;
    let doce = plain_person(&state, "Lidia", Role::LiderDoce, |_| {}).await;
    let member = plain_person(&state, "Diego", Role::Discipulo, |_| {}).await;
    let auth = basic("ana@redil.test");

    let resp = send(
      state.clone(),
      "POST",
      "/cells",
      Some(&auth),
      Some(serde_json::json!({
        "name": "Roca",
        "cell_type": "abierta",
        "leader_id": doce.person_id
      })),
    )
    .await;
    let cell_id = json_body(resp).await["cell_id"].as_i64().unwrap();

    let resp = send(
      state.clone(),
      "POST",
      &format!("/cells/{cell_id}/members"),
      Some(&auth),
      Some(serde_json::json!({ "person_id": member.person_id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(
      state.clone(),
      "DELETE",
      &format!("/cells/{cell_id}"),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(
      state,
      "GET",
      &format!("/people/{}", member.person_id),
      Some(&auth),
      None,
    )
    .await;
    let fetched = json_body(resp).await;
    assert!(fetched["cell_id"].is_null());
  }

  // ── Enrollments ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn enrollment_requires_the_person_in_scope() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;
    let doce =
      login_person(&state, "Lidia", "lidia@redil.test", Role::LiderDoce, |_| {})
        .await;
    let report = plain_person(&state, "Diego", Role::Discipulo, |p| {
      p.lider_doce_id = Some(doce.person_id);
    })
    .await;
    let outsider = plain_person(&state, "Otro", Role::Discipulo, |_| {}).await;

    let resp = send(
      state.clone(),
      "POST",
      "/modules",
      Some(&basic("ana@redil.test")),
      Some(serde_json::json!({ "name": "Preencuentro", "position": 1 })),
    )
    .await;
    let module_id = json_body(resp).await["module_id"].as_i64().unwrap();

    let auth = basic("lidia@redil.test");

    let resp = send(
      state.clone(),
      "POST",
      "/enrollments",
      Some(&auth),
      Some(serde_json::json!({
        "person_id": outsider.person_id,
        "module_id": module_id
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
      state.clone(),
      "POST",
      "/enrollments",
      Some(&auth),
      Some(serde_json::json!({
        "person_id": report.person_id,
        "module_id": module_id
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(state, "GET", "/enrollments", Some(&auth), None).await;
    let listed = json_body(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["person_id"], report.person_id);
  }

  // ── Events & balance ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn balance_report_covers_downline_and_registrar_paths() {
    let state = make_state().await;
    login_person(&state, "Ana", "ana@redil.test", Role::SuperAdmin, |_| {})
      .await;
    let doce =
      login_person(&state, "Lidia", "lidia@redil.test", Role::LiderDoce, |_| {})
        .await;
    let report = plain_person(&state, "Diego", Role::Discipulo, |p| {
      p.lider_doce_id = Some(doce.person_id);
    })
    .await;
    let outsider = plain_person(&state, "Otro", Role::Discipulo, |_| {}).await;
    let stranger = plain_person(&state, "Ajeno", Role::Discipulo, |_| {}).await;

    let admin = basic("ana@redil.test");
    let lidia = basic("lidia@redil.test");

    let resp = send(
      state.clone(),
      "POST",
      "/events",
      Some(&admin),
      Some(serde_json::json!({
        "name": "Convención Nacional",
        "kind": "convention",
        "starts_on": "2024-09-20",
        "cost": 150000
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let event_id = json_body(resp).await["event_id"].as_i64().unwrap();

    // In the doce's downline, registered by the admin.
    send(
      state.clone(),
      "POST",
      &format!("/events/{event_id}/registrations"),
      Some(&admin),
      Some(serde_json::json!({
        "person_id": report.person_id,
        "amount_paid": 150000
      })),
    )
    .await;

    // Outside the downline, but the doce registered them personally.
    send(
      state.clone(),
      "POST",
      &format!("/events/{event_id}/registrations"),
      Some(&lidia),
      Some(serde_json::json!({
        "person_id": outsider.person_id,
        "amount_paid": 50000
      })),
    )
    .await;

    // Unrelated on both paths.
    send(
      state.clone(),
      "POST",
      &format!("/events/{event_id}/registrations"),
      Some(&admin),
      Some(serde_json::json!({
        "person_id": stranger.person_id,
        "amount_paid": 150000
      })),
    )
    .await;

    let resp = send(
      state.clone(),
      "GET",
      &format!("/events/{event_id}/registrations"),
      Some(&lidia),
      None,
    )
    .await;
    let listed = json_body(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let resp = send(
      state,
      "GET",
      &format!("/events/{event_id}/balance"),
      Some(&lidia),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report_body = json_body(resp).await;
    assert_eq!(report_body["registration_count"], 2);
    assert_eq!(report_body["total_paid"], 200_000);
    assert_eq!(report_body["total_due"], 100_000);
  }
}
