#![forbid(unsafe_code)]

use rusqlite::{Connection, Error as SqliteError, OptionalExtension};
use thiserror::Error;

pub const SCHEMA_VERSION: i64 = 1;

/// Initialise the phone-call graph schema inside an SQLite database.
///
/// Entities (`company`, `person`) get surrogate ids and unique natural keys.
/// Relationships (`contract`, `call`) reference entity ids through `NOT NULL`
/// foreign keys, so a relationship whose endpoints do not exist yet is
/// rejected. Re-running against an existing database of the same version is a
/// no-op; other versions are rejected.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use phonegraph_data::store::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create graph schema");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM graph_schema_version LIMIT 1", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| SchemaError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_entity_tables(&transaction)?;
    create_relationship_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SchemaError::Migration {
            step: "commit schema transaction",
            source,
        })?;

    Ok(())
}

fn create_entity_tables(transaction: &rusqlite::Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create company",
        "CREATE TABLE IF NOT EXISTS company (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
    )?;
    run_migration_step(
        transaction,
        "create person",
        "CREATE TABLE IF NOT EXISTS person (
            id INTEGER PRIMARY KEY,
            phone_number TEXT NOT NULL UNIQUE,
            is_customer INTEGER NOT NULL CHECK (is_customer IN (0, 1)),
            first_name TEXT,
            last_name TEXT,
            city TEXT,
            age INTEGER
        )",
    )
}

fn create_relationship_tables(
    transaction: &rusqlite::Transaction<'_>,
) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create contract",
        "CREATE TABLE IF NOT EXISTS contract (
            id INTEGER PRIMARY KEY,
            provider INTEGER NOT NULL REFERENCES company(id),
            customer INTEGER NOT NULL REFERENCES person(id)
        )",
    )?;
    run_migration_step(
        transaction,
        "create call",
        "CREATE TABLE IF NOT EXISTS call (
            id INTEGER PRIMARY KEY,
            caller INTEGER NOT NULL REFERENCES person(id),
            callee INTEGER NOT NULL REFERENCES person(id),
            started_at TEXT NOT NULL,
            duration INTEGER NOT NULL
        )",
    )
}

fn create_indexes(transaction: &rusqlite::Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "index contract",
        "CREATE INDEX IF NOT EXISTS idx_contract_customer ON contract(customer, provider)",
    )?;
    run_migration_step(
        transaction,
        "index call",
        "CREATE INDEX IF NOT EXISTS idx_call_caller ON call(caller, callee)",
    )
}

fn ensure_schema_version(transaction: &rusqlite::Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS graph_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM graph_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SchemaError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        None => {
            transaction
                .execute(
                    "INSERT INTO graph_schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )
                .map_err(|source| SchemaError::Migration {
                    step: "record schema version",
                    source,
                })?;
        }
    }

    Ok(())
}

fn run_migration_step(
    transaction: &rusqlite::Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}

/// Errors raised when initialising the graph schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        #[source]
        source: SqliteError,
    },
    #[error("failed to execute migration step '{step}'")]
    Migration {
        step: &'static str,
        #[source]
        source: SqliteError,
    },
    #[error("expected graph schema version {expected} but found {found}")]
    VersionMismatch { expected: i64, found: i64 },
}
