//! Store traits for executing rendered statements.
//!
//! A session is opened once per run and threaded explicitly through the
//! loader. Transactions borrow the session mutably, so at most one is open at
//! a time. A transaction handle that is dropped without [`GraphTransaction::commit`]
//! must roll back everything it executed.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::Statement;

/// Backend error carried as a source.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Access requested when opening a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionMode {
    /// Statements may only read.
    Read,
    /// Statements may insert.
    Write,
}

impl fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Errors reported by a store backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A transaction could not be opened.
    #[error("failed to open {mode} transaction")]
    Begin {
        /// Requested access mode.
        mode: TransactionMode,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// The store rejected a statement.
    #[error("store rejected statement `{statement}`")]
    Execute {
        /// Text of the rejected statement.
        statement: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// Committing failed; nothing from the transaction is visible.
    #[error("failed to commit transaction")]
    Commit {
        /// Backend error.
        #[source]
        source: BoxError,
    },
}

/// An open session against one database.
pub trait GraphSession {
    /// Transaction handle borrowing the session.
    type Transaction<'s>: GraphTransaction
    where
        Self: 's;

    /// Open a transaction in `mode`.
    fn open_transaction(
        &mut self,
        mode: TransactionMode,
    ) -> Result<Self::Transaction<'_>, StoreError>;
}

/// A unit of work. Consumed by [`commit`](Self::commit); rolled back on drop.
pub trait GraphTransaction {
    /// Execute one statement inside the transaction.
    fn execute(&mut self, statement: &Statement) -> Result<(), StoreError>;

    /// Make every executed statement visible.
    fn commit(self) -> Result<(), StoreError>;
}
