//! SQL schema for the Redil SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The four hierarchy slots on `persons` clear themselves when the
/// referenced superior is removed; rows that only make sense attached to a
/// person (attendance, enrollments, a guest's invitation) cascade instead.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS persons (
    person_id       INTEGER PRIMARY KEY,
    full_name       TEXT NOT NULL,
    email           TEXT UNIQUE,
    password_hash   TEXT,            -- argon2 PHC string; NULL = cannot log in
    role            TEXT NOT NULL,   -- 'super_admin' | 'pastor' | 'lider_doce' | ...
    leader_id       INTEGER REFERENCES persons(person_id) ON DELETE SET NULL,
    lider_doce_id   INTEGER REFERENCES persons(person_id) ON DELETE SET NULL,
    lider_celula_id INTEGER REFERENCES persons(person_id) ON DELETE SET NULL,
    pastor_id       INTEGER REFERENCES persons(person_id) ON DELETE SET NULL,
    cell_id         INTEGER REFERENCES cells(cell_id)     ON DELETE SET NULL,
    created_at      TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE TABLE IF NOT EXISTS cells (
    cell_id    INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    cell_type  TEXT NOT NULL,        -- 'abierta' | 'cerrada'
    leader_id  INTEGER NOT NULL REFERENCES persons(person_id),
    address    TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cell_attendance (
    attendance_id INTEGER PRIMARY KEY,
    cell_id       INTEGER NOT NULL REFERENCES cells(cell_id),
    person_id     INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    attended_on   TEXT NOT NULL,     -- calendar date, YYYY-MM-DD
    UNIQUE (cell_id, person_id, attended_on)
);

CREATE TABLE IF NOT EXISTS guests (
    guest_id       INTEGER PRIMARY KEY,
    full_name      TEXT NOT NULL,
    phone          TEXT,
    invited_by_id  INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    assigned_to_id INTEGER REFERENCES persons(person_id) ON DELETE SET NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS seminar_modules (
    module_id INTEGER PRIMARY KEY,
    name      TEXT NOT NULL,
    position  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id INTEGER PRIMARY KEY,
    person_id     INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    module_id     INTEGER NOT NULL REFERENCES seminar_modules(module_id),
    enrolled_at   TEXT NOT NULL,
    UNIQUE (person_id, module_id)
);

CREATE TABLE IF NOT EXISTS events (
    event_id  INTEGER PRIMARY KEY,
    name      TEXT NOT NULL,
    kind      TEXT NOT NULL,         -- 'convention' | 'encuentro'
    starts_on TEXT NOT NULL,
    cost      INTEGER NOT NULL       -- minor currency unit
);

CREATE TABLE IF NOT EXISTS registrations (
    registration_id  INTEGER PRIMARY KEY,
    event_id         INTEGER NOT NULL REFERENCES events(event_id),
    person_id        INTEGER NOT NULL REFERENCES persons(person_id) ON DELETE CASCADE,
    registered_by_id INTEGER REFERENCES persons(person_id) ON DELETE SET NULL,
    amount_paid      INTEGER NOT NULL,
    recorded_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS persons_leader_idx       ON persons(leader_id);
CREATE INDEX IF NOT EXISTS persons_doce_idx         ON persons(lider_doce_id);
CREATE INDEX IF NOT EXISTS persons_celula_idx       ON persons(lider_celula_id);
CREATE INDEX IF NOT EXISTS persons_pastor_idx       ON persons(pastor_id);
CREATE INDEX IF NOT EXISTS guests_inviter_idx       ON guests(invited_by_id);
CREATE INDEX IF NOT EXISTS attendance_cell_idx      ON cell_attendance(cell_id);
CREATE INDEX IF NOT EXISTS registrations_event_idx  ON registrations(event_id);

PRAGMA user_version = 1;
";
