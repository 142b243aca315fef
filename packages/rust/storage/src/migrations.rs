//! SQL migration definitions for the session database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed as one batch.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: sessions, slides",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Labeling session metadata
CREATE TABLE IF NOT EXISTS sessions (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    source_file TEXT NOT NULL,
    start_id    INTEGER NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    config_json TEXT
);

-- Per-slide labeling state
CREATE TABLE IF NOT EXISTS slides (
    session_id       TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    id               INTEGER NOT NULL,
    slide_index      INTEGER NOT NULL,
    image_file       TEXT NOT NULL,
    image_sha256     TEXT NOT NULL,
    source_text      TEXT NOT NULL,
    caption          TEXT NOT NULL,
    suggestions_json TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'pending',
    updated_at       TEXT NOT NULL,
    PRIMARY KEY (session_id, id)
);

CREATE INDEX IF NOT EXISTS idx_slides_session ON slides(session_id);
CREATE INDEX IF NOT EXISTS idx_slides_status ON slides(session_id, status);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
