//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, enums as their snake_case discriminants.

use chrono::{DateTime, NaiveDate, Utc};
use redil_core::{
  entities::{
    Cell, CellAttendance, CellType, Event, EventKind, Guest, Registration,
  },
  person::{Person, Role},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::SuperAdmin => "super_admin",
    Role::Pastor => "pastor",
    Role::LiderDoce => "lider_doce",
    Role::LiderCelula => "lider_celula",
    Role::Discipulo => "discipulo",
    Role::Invitado => "invitado",
    Role::Profesor => "profesor",
    Role::Auxiliar => "auxiliar",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "super_admin" => Ok(Role::SuperAdmin),
    "pastor" => Ok(Role::Pastor),
    "lider_doce" => Ok(Role::LiderDoce),
    "lider_celula" => Ok(Role::LiderCelula),
    "discipulo" => Ok(Role::Discipulo),
    "invitado" => Ok(Role::Invitado),
    "profesor" => Ok(Role::Profesor),
    "auxiliar" => Ok(Role::Auxiliar),
    other => Err(Error::Decode(format!("unknown role: {other:?}"))),
  }
}

// ─── CellType ────────────────────────────────────────────────────────────────

pub fn encode_cell_type(t: CellType) -> &'static str {
  match t {
    CellType::Abierta => "abierta",
    CellType::Cerrada => "cerrada",
  }
}

pub fn decode_cell_type(s: &str) -> Result<CellType> {
  match s {
    "abierta" => Ok(CellType::Abierta),
    "cerrada" => Ok(CellType::Cerrada),
    other => Err(Error::Decode(format!("unknown cell type: {other:?}"))),
  }
}

// ─── EventKind ───────────────────────────────────────────────────────────────

pub fn encode_event_kind(k: EventKind) -> &'static str {
  match k {
    EventKind::Convention => "convention",
    EventKind::Encuentro => "encuentro",
  }
}

pub fn decode_event_kind(s: &str) -> Result<EventKind> {
  match s {
    "convention" => Ok(EventKind::Convention),
    "encuentro" => Ok(EventKind::Encuentro),
    other => Err(Error::Decode(format!("unknown event kind: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `persons` row.
pub struct RawPerson {
  pub person_id:       i64,
  pub full_name:       String,
  pub email:           Option<String>,
  pub role:            String,
  pub leader_id:       Option<i64>,
  pub lider_doce_id:   Option<i64>,
  pub lider_celula_id: Option<i64>,
  pub pastor_id:       Option<i64>,
  pub cell_id:         Option<i64>,
  pub created_at:      String,
}

/// The `persons` column list matching [`RawPerson::from_row`].
pub const PERSON_COLUMNS: &str = "person_id, full_name, email, role, \
   leader_id, lider_doce_id, lider_celula_id, pastor_id, cell_id, created_at";

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawPerson {
      person_id:       row.get(0)?,
      full_name:       row.get(1)?,
      email:           row.get(2)?,
      role:            row.get(3)?,
      leader_id:       row.get(4)?,
      lider_doce_id:   row.get(5)?,
      lider_celula_id: row.get(6)?,
      pastor_id:       row.get(7)?,
      cell_id:         row.get(8)?,
      created_at:      row.get(9)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:       self.person_id,
      full_name:       self.full_name,
      email:           self.email,
      role:            decode_role(&self.role)?,
      leader_id:       self.leader_id,
      lider_doce_id:   self.lider_doce_id,
      lider_celula_id: self.lider_celula_id,
      pastor_id:       self.pastor_id,
      cell_id:         self.cell_id,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `guests` row.
pub struct RawGuest {
  pub guest_id:       i64,
  pub full_name:      String,
  pub phone:          Option<String>,
  pub invited_by_id:  i64,
  pub assigned_to_id: Option<i64>,
  pub created_at:     String,
}

pub const GUEST_COLUMNS: &str =
  "guest_id, full_name, phone, invited_by_id, assigned_to_id, created_at";

impl RawGuest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawGuest {
      guest_id:       row.get(0)?,
      full_name:      row.get(1)?,
      phone:          row.get(2)?,
      invited_by_id:  row.get(3)?,
      assigned_to_id: row.get(4)?,
      created_at:     row.get(5)?,
    })
  }

  pub fn into_guest(self) -> Result<Guest> {
    Ok(Guest {
      guest_id:       self.guest_id,
      full_name:      self.full_name,
      phone:          self.phone,
      invited_by_id:  self.invited_by_id,
      assigned_to_id: self.assigned_to_id,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `cells` row.
pub struct RawCell {
  pub cell_id:    i64,
  pub name:       String,
  pub cell_type:  String,
  pub leader_id:  i64,
  pub address:    Option<String>,
  pub created_at: String,
}

pub const CELL_COLUMNS: &str =
  "cell_id, name, cell_type, leader_id, address, created_at";

impl RawCell {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawCell {
      cell_id:    row.get(0)?,
      name:       row.get(1)?,
      cell_type:  row.get(2)?,
      leader_id:  row.get(3)?,
      address:    row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_cell(self) -> Result<Cell> {
    Ok(Cell {
      cell_id:    self.cell_id,
      name:       self.name,
      cell_type:  decode_cell_type(&self.cell_type)?,
      leader_id:  self.leader_id,
      address:    self.address,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `cell_attendance` row.
pub struct RawAttendance {
  pub attendance_id: i64,
  pub cell_id:       i64,
  pub person_id:     i64,
  pub attended_on:   String,
}

impl RawAttendance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawAttendance {
      attendance_id: row.get(0)?,
      cell_id:       row.get(1)?,
      person_id:     row.get(2)?,
      attended_on:   row.get(3)?,
    })
  }

  pub fn into_attendance(self) -> Result<CellAttendance> {
    Ok(CellAttendance {
      attendance_id: self.attendance_id,
      cell_id:       self.cell_id,
      person_id:     self.person_id,
      attended_on:   decode_date(&self.attended_on)?,
    })
  }
}

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:  i64,
  pub name:      String,
  pub kind:      String,
  pub starts_on: String,
  pub cost:      i64,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawEvent {
      event_id:  row.get(0)?,
      name:      row.get(1)?,
      kind:      row.get(2)?,
      starts_on: row.get(3)?,
      cost:      row.get(4)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:  self.event_id,
      name:      self.name,
      kind:      decode_event_kind(&self.kind)?,
      starts_on: decode_date(&self.starts_on)?,
      cost:      self.cost,
    })
  }
}

/// Raw values read directly from a `registrations` row.
pub struct RawRegistration {
  pub registration_id:  i64,
  pub event_id:         i64,
  pub person_id:        i64,
  pub registered_by_id: Option<i64>,
  pub amount_paid:      i64,
  pub recorded_at:      String,
}

impl RawRegistration {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawRegistration {
      registration_id:  row.get(0)?,
      event_id:         row.get(1)?,
      person_id:        row.get(2)?,
      registered_by_id: row.get(3)?,
      amount_paid:      row.get(4)?,
      recorded_at:      row.get(5)?,
    })
  }

  pub fn into_registration(self) -> Result<Registration> {
    Ok(Registration {
      registration_id:  self.registration_id,
      event_id:         self.event_id,
      person_id:        self.person_id,
      registered_by_id: self.registered_by_id,
      amount_paid:      self.amount_paid,
      recorded_at:      decode_dt(&self.recorded_at)?,
    })
  }
}
