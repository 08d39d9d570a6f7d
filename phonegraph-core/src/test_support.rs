//! In-memory [`GraphSession`] used by unit and behaviour tests.
//!
//! The session keeps statements per transaction and only publishes them on
//! commit, which makes transaction boundaries observable without a database.

use crate::{GraphSession, GraphTransaction, Statement, StoreError, TransactionMode};

/// Session that records committed statements and can be told to reject one.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    committed: Vec<String>,
    executed: usize,
    fail_on: Option<usize>,
    opened: usize,
    rolled_back: usize,
}

impl ScriptedSession {
    /// A session that accepts every statement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `ordinal`-th statement executed over the session's lifetime
    /// (1-based).
    #[must_use]
    pub fn failing_on(ordinal: usize) -> Self {
        Self {
            fail_on: Some(ordinal),
            ..Self::default()
        }
    }

    /// Statements made visible by committed transactions, in commit order.
    #[must_use]
    pub fn committed(&self) -> &[String] {
        &self.committed
    }

    /// Number of statements passed to `execute`, including the rejected one.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Number of transactions opened.
    #[must_use]
    pub fn transactions_opened(&self) -> usize {
        self.opened
    }

    /// Number of transactions dropped without committing.
    #[must_use]
    pub fn rolled_back(&self) -> usize {
        self.rolled_back
    }
}

impl GraphSession for ScriptedSession {
    type Transaction<'s> = ScriptedTransaction<'s>;

    fn open_transaction(
        &mut self,
        mode: TransactionMode,
    ) -> Result<Self::Transaction<'_>, StoreError> {
        self.opened += 1;
        Ok(ScriptedTransaction {
            session: self,
            mode,
            pending: Vec::new(),
            finished: false,
        })
    }
}

/// Transaction handle of a [`ScriptedSession`].
#[derive(Debug)]
pub struct ScriptedTransaction<'s> {
    session: &'s mut ScriptedSession,
    mode: TransactionMode,
    pending: Vec<String>,
    finished: bool,
}

impl GraphTransaction for ScriptedTransaction<'_> {
    fn execute(&mut self, statement: &Statement) -> Result<(), StoreError> {
        self.session.executed += 1;
        if self.session.fail_on == Some(self.session.executed) {
            return Err(StoreError::Execute {
                statement: statement.to_string(),
                source: "scripted rejection".into(),
            });
        }
        if self.mode == TransactionMode::Read {
            return Err(StoreError::Execute {
                statement: statement.to_string(),
                source: "read transactions cannot insert".into(),
            });
        }
        self.pending.push(statement.to_string());
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let pending = std::mem::take(&mut self.pending);
        self.session.committed.extend(pending);
        self.finished = true;
        Ok(())
    }
}

impl Drop for ScriptedTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.session.rolled_back += 1;
        }
    }
}
