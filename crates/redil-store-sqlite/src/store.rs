//! [`SqliteStore`] — the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use redil_core::{
  assignment::Ancestry,
  entities::{
    Cell, CellAttendance, CellId, Enrollment, Event, EventId, Guest, GuestId,
    GuestUpdate, ModuleId, NewAttendance, NewCell, NewEnrollment, NewEvent,
    NewGuest, NewModule, NewRegistration, Registration, SeminarModule,
  },
  person::{NewPerson, Person, PersonId, PersonUpdate},
  store::DirectoryStore,
};

use crate::{
  Error, Result,
  encode::{
    CELL_COLUMNS, GUEST_COLUMNS, PERSON_COLUMNS, RawAttendance, RawCell,
    RawEvent, RawGuest, RawPerson, RawRegistration, encode_cell_type,
    encode_date, encode_dt, encode_event_kind, encode_role,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Redil directory backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let role_str = encode_role(input.role).to_owned();
    let row = input.clone();

    let person_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO persons (
             full_name, email, password_hash, role,
             leader_id, lider_doce_id, lider_celula_id, pastor_id,
             cell_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
          rusqlite::params![
            row.full_name,
            row.email,
            row.password_hash,
            role_str,
            row.leader_id,
            row.lider_doce_id,
            row.lider_celula_id,
            row.pastor_id,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Person {
      person_id,
      full_name: input.full_name,
      email: input.email,
      role: input.role,
      leader_id: input.leader_id,
      lider_doce_id: input.lider_doce_id,
      lider_celula_id: input.lider_celula_id,
      pastor_id: input.pastor_id,
      cell_id: None,
      created_at,
    })
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PERSON_COLUMNS} FROM persons WHERE person_id = ?1"
              ),
              rusqlite::params![id],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM persons ORDER BY person_id"
        ))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn find_credentials(
    &self,
    email: &str,
  ) -> Result<Option<(Person, String)>> {
    let email = email.to_owned();

    let raw: Option<(RawPerson, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PERSON_COLUMNS}, password_hash FROM persons
                 WHERE email = ?1 AND password_hash IS NOT NULL"
              ),
              rusqlite::params![email],
              |row| Ok((RawPerson::from_row(row)?, row.get(10)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(raw, hash)| Ok((raw.into_person()?, hash)))
      .transpose()
  }

  async fn update_person(
    &self,
    id: PersonId,
    update: PersonUpdate,
  ) -> Result<Person> {
    let mut merged = self
      .get_person(id)
      .await?
      .ok_or(Error::PersonNotFound(id))?;

    if let Some(full_name) = update.full_name {
      merged.full_name = full_name;
    }
    if let Some(email) = update.email {
      merged.email = Some(email);
    }
    if let Some(role) = update.role {
      merged.role = role;
    }

    let full_name = merged.full_name.clone();
    let email = merged.email.clone();
    let role_str = encode_role(merged.role).to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE persons SET full_name = ?1, email = ?2, role = ?3
           WHERE person_id = ?4",
          rusqlite::params![full_name, email, role_str, id],
        )?;
        Ok(())
      })
      .await?;

    Ok(merged)
  }

  async fn delete_person(&self, id: PersonId) -> Result<()> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM persons WHERE person_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::PersonNotFound(id));
    }
    Ok(())
  }

  async fn children_of(&self, id: PersonId) -> Result<Vec<PersonId>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT person_id FROM persons
           WHERE leader_id = ?1 OR lider_doce_id = ?1
              OR lider_celula_id = ?1 OR pastor_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids)
  }

  async fn assign_leader(
    &self,
    person_id: PersonId,
    leader_id: PersonId,
    ancestry: Ancestry,
  ) -> Result<Person> {
    // One statement: the immediate leader slot and the snapshot-copied
    // ancestry fields commit together or not at all.
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE persons
           SET leader_id = ?1, lider_celula_id = ?2,
               lider_doce_id = ?3, pastor_id = ?4
           WHERE person_id = ?5",
          rusqlite::params![
            leader_id,
            ancestry.lider_celula_id,
            ancestry.lider_doce_id,
            ancestry.pastor_id,
            person_id,
          ],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::PersonNotFound(person_id));
    }

    self
      .get_person(person_id)
      .await?
      .ok_or(Error::PersonNotFound(person_id))
  }

  async fn set_cell_membership(
    &self,
    person_id: PersonId,
    cell_id: Option<CellId>,
  ) -> Result<()> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE persons SET cell_id = ?1 WHERE person_id = ?2",
          rusqlite::params![cell_id, person_id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::PersonNotFound(person_id));
    }
    Ok(())
  }

  // ── Guests ────────────────────────────────────────────────────────────────

  async fn add_guest(&self, input: NewGuest) -> Result<Guest> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let row = input.clone();

    let guest_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO guests
             (full_name, phone, invited_by_id, assigned_to_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            row.full_name,
            row.phone,
            row.invited_by_id,
            row.assigned_to_id,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Guest {
      guest_id,
      full_name: input.full_name,
      phone: input.phone,
      invited_by_id: input.invited_by_id,
      assigned_to_id: input.assigned_to_id,
      created_at,
    })
  }

  async fn get_guest(&self, id: GuestId) -> Result<Option<Guest>> {
    let raw: Option<RawGuest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {GUEST_COLUMNS} FROM guests WHERE guest_id = ?1"),
              rusqlite::params![id],
              RawGuest::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGuest::into_guest).transpose()
  }

  async fn list_guests(&self) -> Result<Vec<Guest>> {
    let raws: Vec<RawGuest> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GUEST_COLUMNS} FROM guests ORDER BY guest_id"
        ))?;
        let rows = stmt
          .query_map([], RawGuest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGuest::into_guest).collect()
  }

  async fn update_guest(&self, id: GuestId, update: GuestUpdate) -> Result<Guest> {
    let mut merged = self.get_guest(id).await?.ok_or(Error::GuestNotFound(id))?;

    if let Some(full_name) = update.full_name {
      merged.full_name = full_name;
    }
    if let Some(phone) = update.phone {
      merged.phone = Some(phone);
    }
    if let Some(assigned_to_id) = update.assigned_to_id {
      merged.assigned_to_id = Some(assigned_to_id);
    }

    let full_name = merged.full_name.clone();
    let phone = merged.phone.clone();
    let assigned_to_id = merged.assigned_to_id;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE guests SET full_name = ?1, phone = ?2, assigned_to_id = ?3
           WHERE guest_id = ?4",
          rusqlite::params![full_name, phone, assigned_to_id, id],
        )?;
        Ok(())
      })
      .await?;

    Ok(merged)
  }

  async fn delete_guest(&self, id: GuestId) -> Result<()> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM guests WHERE guest_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::GuestNotFound(id));
    }
    Ok(())
  }

  // ── Cells ─────────────────────────────────────────────────────────────────

  async fn add_cell(&self, input: NewCell) -> Result<Cell> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let type_str = encode_cell_type(input.cell_type).to_owned();
    let row = input.clone();

    let cell_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cells (name, cell_type, leader_id, address, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![row.name, type_str, row.leader_id, row.address, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Cell {
      cell_id,
      name: input.name,
      cell_type: input.cell_type,
      leader_id: input.leader_id,
      address: input.address,
      created_at,
    })
  }

  async fn get_cell(&self, id: CellId) -> Result<Option<Cell>> {
    let raw: Option<RawCell> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CELL_COLUMNS} FROM cells WHERE cell_id = ?1"),
              rusqlite::params![id],
              RawCell::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCell::into_cell).transpose()
  }

  async fn list_cells(&self) -> Result<Vec<Cell>> {
    let raws: Vec<RawCell> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CELL_COLUMNS} FROM cells ORDER BY cell_id"
        ))?;
        let rows = stmt
          .query_map([], RawCell::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCell::into_cell).collect()
  }

  async fn delete_cell(&self, id: CellId) -> Result<()> {
    // Member unassignment, attendance removal and the cell row itself must
    // land together; a partial application would orphan references.
    let affected = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE persons SET cell_id = NULL WHERE cell_id = ?1",
          rusqlite::params![id],
        )?;
        tx.execute(
          "DELETE FROM cell_attendance WHERE cell_id = ?1",
          rusqlite::params![id],
        )?;
        let affected =
          tx.execute("DELETE FROM cells WHERE cell_id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(affected)
      })
      .await?;

    if affected == 0 {
      return Err(Error::CellNotFound(id));
    }
    Ok(())
  }

  async fn record_attendance(
    &self,
    input: NewAttendance,
  ) -> Result<CellAttendance> {
    let date_str = encode_date(input.attended_on);

    let attendance_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cell_attendance (cell_id, person_id, attended_on)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![input.cell_id, input.person_id, date_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(CellAttendance {
      attendance_id,
      cell_id: input.cell_id,
      person_id: input.person_id,
      attended_on: input.attended_on,
    })
  }

  async fn list_attendance(&self, cell_id: CellId) -> Result<Vec<CellAttendance>> {
    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT attendance_id, cell_id, person_id, attended_on
           FROM cell_attendance WHERE cell_id = ?1
           ORDER BY attended_on, person_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![cell_id], RawAttendance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendance::into_attendance).collect()
  }

  // ── Seminar modules & enrollments ─────────────────────────────────────────

  async fn add_module(&self, input: NewModule) -> Result<SeminarModule> {
    let row = input.clone();

    let module_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO seminar_modules (name, position) VALUES (?1, ?2)",
          rusqlite::params![row.name, row.position],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(SeminarModule { module_id, name: input.name, position: input.position })
  }

  async fn get_module(&self, id: ModuleId) -> Result<Option<SeminarModule>> {
    let module = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT module_id, name, position FROM seminar_modules
               WHERE module_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(SeminarModule {
                  module_id: row.get(0)?,
                  name:      row.get(1)?,
                  position:  row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(module)
  }

  async fn list_modules(&self) -> Result<Vec<SeminarModule>> {
    let modules = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT module_id, name, position FROM seminar_modules
           ORDER BY position",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(SeminarModule {
              module_id: row.get(0)?,
              name:      row.get(1)?,
              position:  row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(modules)
  }

  async fn add_enrollment(&self, input: NewEnrollment) -> Result<Enrollment> {
    let enrolled_at = Utc::now();
    let at_str = encode_dt(enrolled_at);

    let enrollment_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO enrollments (person_id, module_id, enrolled_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![input.person_id, input.module_id, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Enrollment {
      enrollment_id,
      person_id: input.person_id,
      module_id: input.module_id,
      enrolled_at,
    })
  }

  async fn list_enrollments(
    &self,
    person_id: Option<PersonId>,
  ) -> Result<Vec<Enrollment>> {
    let raws: Vec<(i64, i64, i64, String)> = self
      .conn
      .call(move |conn| {
        let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(i64, i64, i64, String)> {
          Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        };
        let rows = if let Some(pid) = person_id {
          let mut stmt = conn.prepare(
            "SELECT enrollment_id, person_id, module_id, enrolled_at
             FROM enrollments WHERE person_id = ?1 ORDER BY enrollment_id",
          )?;
          stmt
            .query_map(rusqlite::params![pid], map)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(
            "SELECT enrollment_id, person_id, module_id, enrolled_at
             FROM enrollments ORDER BY enrollment_id",
          )?;
          stmt.query_map([], map)?.collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(enrollment_id, person_id, module_id, at)| {
        Ok(Enrollment {
          enrollment_id,
          person_id,
          module_id,
          enrolled_at: crate::encode::decode_dt(&at)?,
        })
      })
      .collect()
  }

  // ── Events & registrations ────────────────────────────────────────────────

  async fn add_event(&self, input: NewEvent) -> Result<Event> {
    let kind_str = encode_event_kind(input.kind).to_owned();
    let date_str = encode_date(input.starts_on);
    let row = input.clone();

    let event_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (name, kind, starts_on, cost)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![row.name, kind_str, date_str, row.cost],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Event {
      event_id,
      name: input.name,
      kind: input.kind,
      starts_on: input.starts_on,
      cost: input.cost,
    })
  }

  async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT event_id, name, kind, starts_on, cost
               FROM events WHERE event_id = ?1",
              rusqlite::params![id],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, name, kind, starts_on, cost FROM events
           ORDER BY starts_on, event_id",
        )?;
        let rows = stmt
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn add_registration(
    &self,
    input: NewRegistration,
  ) -> Result<Registration> {
    let recorded_at = Utc::now();
    let at_str = encode_dt(recorded_at);

    let registration_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO registrations
             (event_id, person_id, registered_by_id, amount_paid, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            input.event_id,
            input.person_id,
            input.registered_by_id,
            input.amount_paid,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Registration {
      registration_id,
      event_id: input.event_id,
      person_id: input.person_id,
      registered_by_id: Some(input.registered_by_id),
      amount_paid: input.amount_paid,
      recorded_at,
    })
  }

  async fn list_registrations(&self, event_id: EventId) -> Result<Vec<Registration>> {
    let raws: Vec<RawRegistration> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT registration_id, event_id, person_id, registered_by_id,
                  amount_paid, recorded_at
           FROM registrations WHERE event_id = ?1
           ORDER BY registration_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![event_id], RawRegistration::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawRegistration::into_registration)
      .collect()
  }
}
