//! Session and transaction handles over one SQLite connection.

use camino::{Utf8Path, Utf8PathBuf};
use phonegraph_core::{GraphSession, GraphTransaction, Statement, StoreError, TransactionMode};
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;

use super::schema::{SchemaError, initialise_schema};

/// Errors raised while opening the graph database.
#[derive(Debug, Error)]
pub enum OpenStoreError {
    /// The database's parent directory could not be created.
    #[error("failed to create directory for database {path}")]
    CreateDirectory {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// SQLite could not open the database.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The graph schema could not be initialised.
    #[error("failed to initialise graph schema in {path}")]
    Schema {
        /// Database path.
        path: Utf8PathBuf,
        /// Schema failure.
        #[source]
        source: SchemaError,
    },
}

/// One open connection to a graph database.
#[derive(Debug)]
pub struct SqliteSession {
    connection: Connection,
    database: Option<Utf8PathBuf>,
}

impl SqliteSession {
    /// Open the database at `path`, creating it and its parent directories
    /// when missing, and make sure the graph schema exists.
    pub fn open(path: &Utf8Path) -> Result<Self, OpenStoreError> {
        phonegraph_fs::ensure_parent_dir(path).map_err(|source| {
            OpenStoreError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let mut connection =
            Connection::open(path.as_std_path()).map_err(|source| OpenStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        initialise_schema(&mut connection).map_err(|source| OpenStoreError::Schema {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            connection,
            database: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database with the graph schema.
    pub fn open_in_memory() -> Result<Self, OpenStoreError> {
        let path = Utf8PathBuf::from(":memory:");
        let mut connection = Connection::open_in_memory().map_err(|source| OpenStoreError::Open {
            path: path.clone(),
            source,
        })?;
        initialise_schema(&mut connection)
            .map_err(|source| OpenStoreError::Schema { path, source })?;
        Ok(Self {
            connection,
            database: None,
        })
    }

    /// Location of the database file; `None` for in-memory sessions.
    #[must_use]
    pub fn database(&self) -> Option<&Utf8Path> {
        self.database.as_deref()
    }

    /// Underlying connection, for queries outside a transaction.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl GraphSession for SqliteSession {
    type Transaction<'s> = SqliteTransaction<'s>;

    fn open_transaction(
        &mut self,
        mode: TransactionMode,
    ) -> Result<Self::Transaction<'_>, StoreError> {
        let behavior = match mode {
            TransactionMode::Read => TransactionBehavior::Deferred,
            TransactionMode::Write => TransactionBehavior::Immediate,
        };
        let inner = self
            .connection
            .transaction_with_behavior(behavior)
            .map_err(|source| StoreError::Begin {
                mode,
                source: source.into(),
            })?;
        Ok(SqliteTransaction { inner, mode })
    }
}

/// Transaction on a [`SqliteSession`]. Dropping it rolls back.
#[derive(Debug)]
pub struct SqliteTransaction<'c> {
    inner: rusqlite::Transaction<'c>,
    mode: TransactionMode,
}

impl SqliteTransaction<'_> {
    fn run_read_only(&self, statement: &Statement) -> Result<(), rusqlite::Error> {
        let mut prepared = self.inner.prepare(statement.as_str())?;
        if !prepared.readonly() {
            return Err(rusqlite::Error::InvalidQuery);
        }
        let mut rows = prepared.query([])?;
        while rows.next()?.is_some() {}
        Ok(())
    }
}

impl GraphTransaction for SqliteTransaction<'_> {
    fn execute(&mut self, statement: &Statement) -> Result<(), StoreError> {
        let outcome = match self.mode {
            TransactionMode::Write => self.inner.execute_batch(statement.as_str()),
            TransactionMode::Read => self.run_read_only(statement),
        };
        outcome.map_err(|source| StoreError::Execute {
            statement: statement.to_string(),
            source: source.into(),
        })
    }

    fn commit(self) -> Result<(), StoreError> {
        self.inner.commit().map_err(|source| StoreError::Commit {
            source: source.into(),
        })
    }
}
