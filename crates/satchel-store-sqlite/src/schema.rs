//! SQL schema for the Satchel SQLite store.
//!
//! Executed once at connection startup. Uniqueness and cascade rules live in
//! the DDL so SQLite enforces them atomically.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT    NOT NULL UNIQUE,
    is_staff      INTEGER NOT NULL DEFAULT 0,
    is_superuser  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    code        TEXT    NOT NULL UNIQUE,
    name        TEXT    NOT NULL,
    color       TEXT,
    created_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id    INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    title         TEXT    NOT NULL,
    description   TEXT    NOT NULL DEFAULT '',
    due_at        TEXT    NOT NULL,
    status        TEXT    NOT NULL DEFAULT 'pending'
                          CHECK (status IN ('pending', 'done')),
    created_by    INTEGER REFERENCES users(user_id) ON DELETE SET NULL,
    created_at    TEXT    NOT NULL,
    updated_at    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS grades (
    grade_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    subject_id  INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    value       REAL    NOT NULL,
    weight      REAL,
    recorded_at TEXT    NOT NULL
);

-- One row per user, subject and day.
CREATE TABLE IF NOT EXISTS attendance (
    attendance_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    subject_id    INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    date          TEXT    NOT NULL,   -- YYYY-MM-DD
    status        TEXT    NOT NULL
                          CHECK (status IN ('present', 'absent', 'late', 'excused')),
    created_at    TEXT    NOT NULL,
    UNIQUE (user_id, subject_id, date)
);

-- A NULL subject marks a general, non-subject event.
CREATE TABLE IF NOT EXISTS events (
    event_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    subject_id  INTEGER REFERENCES subjects(subject_id) ON DELETE SET NULL,
    title       TEXT    NOT NULL,
    location    TEXT,
    starts_at   TEXT    NOT NULL,
    ends_at     TEXT    NOT NULL,
    CHECK (ends_at > starts_at)
);

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    subject_id    INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    role          TEXT    NOT NULL DEFAULT 'student',
    created_at    TEXT    NOT NULL,
    UNIQUE (user_id, subject_id)
);

CREATE INDEX IF NOT EXISTS assignments_subject_idx ON assignments(subject_id);
CREATE INDEX IF NOT EXISTS assignments_due_idx     ON assignments(due_at);
CREATE INDEX IF NOT EXISTS grades_user_idx         ON grades(user_id);
CREATE INDEX IF NOT EXISTS grades_subject_idx      ON grades(subject_id);
CREATE INDEX IF NOT EXISTS attendance_subject_idx  ON attendance(subject_id);
CREATE INDEX IF NOT EXISTS events_owner_idx        ON events(owner_id);
CREATE INDEX IF NOT EXISTS events_starts_idx       ON events(starts_at);
CREATE INDEX IF NOT EXISTS enrollments_subject_idx ON enrollments(subject_id);

PRAGMA user_version = 1;
";
