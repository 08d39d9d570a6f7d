//! Structured construction of insertion statements.
//!
//! Templates never concatenate record values into query text directly. Values
//! travel as [`Literal`]s, which quote and escape text on rendering, while
//! table, column and binding names are compile-time identifiers.
//!
//! Statements come in two shapes:
//! - a plain insert: `INSERT INTO company (name) VALUES ('Telecom');`
//! - a match-then-insert, where every [`Lookup`] is rendered as a common table
//!   expression ahead of the insert and bound columns select the matched id:
//!   `WITH provider AS (SELECT id FROM company WHERE name = 'Telecom') INSERT
//!   INTO contract (provider) SELECT (SELECT id FROM provider);`
//!
//! A lookup that matches nothing yields `NULL`, so relationship columns must
//! be declared `NOT NULL` for a dangling reference to fail loudly.

use std::fmt::{self, Write as _};

/// A value rendered into a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Quoted text; embedded single quotes are doubled.
    Text(String),
    /// Bare integer.
    Integer(i64),
    /// `TRUE` or `FALSE`.
    Boolean(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => {
                f.write_char('\'')?;
                for part in text.split_inclusive('\'') {
                    f.write_str(part)?;
                    if part.ends_with('\'') {
                        f.write_char('\'')?;
                    }
                }
                f.write_char('\'')
            }
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Resolve one entity by an identifying attribute and bind its id to a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    binding: &'static str,
    table: &'static str,
    key: &'static str,
    value: Literal,
}

impl Lookup {
    /// Match the row of `table` whose `key` column equals `value`.
    pub fn new(
        binding: &'static str,
        table: &'static str,
        key: &'static str,
        value: impl Into<Literal>,
    ) -> Self {
        Self {
            binding,
            table,
            key,
            value: value.into(),
        }
    }

    /// Name the matched id is bound to.
    #[must_use]
    pub fn binding(&self) -> &'static str {
        self.binding
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Literal(Literal),
    Bound(&'static str),
}

/// Builder for a single insert, optionally preceded by lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Insert {
    lookups: Vec<Lookup>,
    table: &'static str,
    columns: Vec<(&'static str, Value)>,
}

impl Insert {
    /// Set `column` to a literal value.
    pub fn value(mut self, column: &'static str, value: impl Into<Literal>) -> Self {
        self.columns.push((column, Value::Literal(value.into())));
        self
    }

    /// Set `column` to the id matched by the lookup named `binding`.
    pub fn bound(mut self, column: &'static str, binding: &'static str) -> Self {
        self.columns.push((column, Value::Bound(binding)));
        self
    }

    /// Render the statement text.
    pub fn build(self) -> Statement {
        let mut text = String::new();
        if !self.lookups.is_empty() {
            text.push_str("WITH ");
            for (index, lookup) in self.lookups.iter().enumerate() {
                if index > 0 {
                    text.push_str(", ");
                }
                // Writing into a String cannot fail.
                let _ = write!(
                    text,
                    "{} AS (SELECT id FROM {} WHERE {} = {})",
                    lookup.binding, lookup.table, lookup.key, lookup.value
                );
            }
            text.push(' ');
        }

        let _ = write!(text, "INSERT INTO {} (", self.table);
        for (index, (column, _)) in self.columns.iter().enumerate() {
            if index > 0 {
                text.push_str(", ");
            }
            text.push_str(column);
        }
        text.push_str(if self.lookups.is_empty() {
            ") VALUES ("
        } else {
            ") SELECT "
        });
        for (index, (_, value)) in self.columns.iter().enumerate() {
            if index > 0 {
                text.push_str(", ");
            }
            let _ = match value {
                Value::Literal(literal) => write!(text, "{literal}"),
                Value::Bound(binding) => write!(text, "(SELECT id FROM {binding})"),
            };
        }
        text.push_str(if self.lookups.is_empty() { ");" } else { ";" });
        Statement(text)
    }
}

/// A fully rendered statement, ready to hand to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement(String);

impl Statement {
    /// Start a plain insert into `table`.
    ///
    /// # Examples
    ///
    /// ```
    /// use phonegraph_core::Statement;
    ///
    /// let statement = Statement::insert("company").value("name", "O'Neil").build();
    /// assert_eq!(
    ///     statement.as_str(),
    ///     "INSERT INTO company (name) VALUES ('O''Neil');"
    /// );
    /// ```
    pub fn insert(table: &'static str) -> Insert {
        Self::matching(Vec::new(), table)
    }

    /// Start an insert into `table` that first resolves `lookups`.
    ///
    /// # Examples
    ///
    /// ```
    /// use phonegraph_core::{Lookup, Statement};
    ///
    /// let statement = Statement::matching(
    ///     vec![Lookup::new("owner", "person", "phone_number", "+1 100")],
    ///     "pet",
    /// )
    /// .bound("owner", "owner")
    /// .value("legs", 4_i64)
    /// .build();
    /// assert_eq!(
    ///     statement.as_str(),
    ///     "WITH owner AS (SELECT id FROM person WHERE phone_number = '+1 100') \
    ///      INSERT INTO pet (owner, legs) SELECT (SELECT id FROM owner), 4;"
    /// );
    /// ```
    pub fn matching(lookups: Vec<Lookup>, table: &'static str) -> Insert {
        Insert {
            lookups,
            table,
            columns: Vec::new(),
        }
    }

    /// Statement text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the statement, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
