//! SQL schema for the Recall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Turn history. Append-only.
CREATE TABLE IF NOT EXISTS messages (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    identity   TEXT NOT NULL,
    role       TEXT NOT NULL,   -- 'user' | 'assistant'
    content    TEXT NOT NULL,
    timestamp  TEXT NOT NULL    -- RFC 3339 UTC
);

-- Long-term facts. Never updated or deleted.
CREATE TABLE IF NOT EXISTS facts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    identity   TEXT NOT NULL,
    fact       TEXT NOT NULL,
    category   TEXT NOT NULL DEFAULT 'general',
    timestamp  TEXT NOT NULL,
    UNIQUE (identity, fact)
);

-- Conversation summaries. Append-only, no uniqueness.
CREATE TABLE IF NOT EXISTS summaries (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    identity       TEXT NOT NULL,
    summary        TEXT NOT NULL,
    message_count  INTEGER NOT NULL DEFAULT 0,
    timestamp      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS messages_identity_idx  ON messages(identity, id);
CREATE INDEX IF NOT EXISTS summaries_identity_idx ON summaries(identity, id);

PRAGMA user_version = 1;
";
