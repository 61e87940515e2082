//! Database schema migrations for SQLite.
//!
//! Each migration transforms the schema from version N to N+1. Both the
//! mutable and immutable stores share one schema so they can live in the same
//! file or in separate ones.

use rusqlite::Connection;
use trellis_core::now_millis;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "migrated schema");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        2 => apply_v2(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Current record per identifier (mutable store)
        CREATE TABLE resources (
            identifier TEXT PRIMARY KEY,
            interaction_model TEXT NOT NULL,  -- full LDP IRI
            container TEXT,                   -- parent identifier, nullable
            has_acl INTEGER NOT NULL DEFAULT 0,
            binary BLOB,                      -- CBOR BinaryMetadata, nullable
            modified INTEGER NOT NULL         -- Unix ms
        );

        -- Quads of the current record; replaced wholesale on write
        CREATE TABLE resource_quads (
            identifier TEXT NOT NULL REFERENCES resources(identifier) ON DELETE CASCADE,
            quad BLOB NOT NULL,               -- CBOR Quad
            PRIMARY KEY (identifier, quad)
        );

        -- Append-only quads (immutable store)
        CREATE TABLE immutable_quads (
            identifier TEXT NOT NULL,
            quad BLOB NOT NULL,
            added_at INTEGER NOT NULL,        -- Unix ms of first append
            PRIMARY KEY (identifier, quad)
        );

        CREATE INDEX idx_resources_container ON resources(container);
        CREATE INDEX idx_immutable_added ON immutable_quads(identifier, added_at);
        "#,
    )?;

    Ok(())
}

/// Migration v2: per-identifier time of the latest append.
///
/// `immutable_quads.added_at` only records first insertion, so an append of
/// already-present quads would otherwise leave the timestamp behind.
fn apply_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE immutable_heads (
            identifier TEXT PRIMARY KEY,
            modified INTEGER NOT NULL         -- Unix ms of latest append
        );

        INSERT INTO immutable_heads (identifier, modified)
            SELECT identifier, MAX(added_at) FROM immutable_quads GROUP BY identifier;
        "#,
    )?;

    Ok(())
}
