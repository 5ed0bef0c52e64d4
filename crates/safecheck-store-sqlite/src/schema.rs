//! SQL schema for the safecheck SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per version. Editable fields live in fields_json; only the
-- lifecycle columns of an existing row are ever updated.
CREATE TABLE IF NOT EXISTS statuses (
    uid             TEXT NOT NULL,
    version_id      TEXT NOT NULL,   -- '{parent_id}-v{version}'
    parent_id       TEXT NOT NULL,
    version         INTEGER NOT NULL CHECK (version >= 1),
    status_type     TEXT NOT NULL,   -- 'current' | 'history' | 'resolved' | 'deleted'
    fields_json     TEXT NOT NULL,   -- StatusFields as camelCase JSON
    created_at      TEXT NOT NULL,   -- RFC 3339, millisecond precision, UTC
    updated_at      TEXT NOT NULL,
    expires_at      TEXT NOT NULL,
    retention_until TEXT NOT NULL,   -- copied unchanged from v1
    resolved_at     TEXT,
    resolved_note   TEXT,
    deleted_at      TEXT,
    PRIMARY KEY (uid, version_id),
    UNIQUE (uid, parent_id, version)
);

-- A chain has at most one head.
CREATE UNIQUE INDEX IF NOT EXISTS statuses_one_head_idx
    ON statuses(uid, parent_id)
    WHERE status_type IN ('current', 'resolved');

CREATE INDEX IF NOT EXISTS statuses_current_idx
    ON statuses(uid, status_type, created_at);
CREATE INDEX IF NOT EXISTS statuses_created_idx ON statuses(created_at);

PRAGMA user_version = 1;
";
