//! Statement templates for each record kind of the phone-call graph.
//!
//! Every template is a pure function from a [`Record`] to a [`Statement`]. The
//! record is first read into a typed value ([`Company`], [`Person`],
//! [`Contract`], [`Call`]); field presence decides the variant once, and the
//! typed value then renders itself through the statement builder.
//!
//! The graph is stored as two entity tables (`company`, `person`) and two
//! relationship tables (`contract`, `call`) whose endpoints reference entity
//! ids.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::{Lookup, Record, Statement};

/// A template: one record in, one statement out.
pub type Template = fn(&Record) -> Result<Statement, TemplateError>;

/// Errors raised while turning a record into a statement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The record lacks a field the kind requires.
    #[error("{kind} record is missing required field `{field}`")]
    MissingField {
        /// Kind being rendered.
        kind: RecordKind,
        /// Name of the absent field.
        field: &'static str,
    },
    /// A numeric field did not hold an integer.
    #[error("{kind} field `{field}` must be an integer, found {value:?}")]
    InvalidInteger {
        /// Kind being rendered.
        kind: RecordKind,
        /// Name of the offending field.
        field: &'static str,
        /// Raw text found in the record.
        value: String,
    },
}

/// The kinds of record the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RecordKind {
    /// A telecom company.
    Company,
    /// A person identified by phone number.
    Person,
    /// A company providing service to a customer.
    Contract,
    /// A call from one person to another.
    Call,
}

impl RecordKind {
    /// Every kind, in the order a clean load must insert them.
    pub const LOAD_ORDER: [Self; 4] = [Self::Company, Self::Person, Self::Contract, Self::Call];

    /// Tag name of the fragments holding this kind.
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Person => "person",
            Self::Contract => "contract",
            Self::Call => "call",
        }
    }

    /// File name the kind is read from inside a data directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Company => "companies.xml",
            Self::Person => "people.xml",
            Self::Contract => "contracts.xml",
            Self::Call => "calls.xml",
        }
    }

    /// Whether statements of this kind reference previously loaded entities.
    #[must_use]
    pub const fn is_relationship(self) -> bool {
        matches!(self, Self::Contract | Self::Call)
    }

    /// The template rendering records of this kind.
    #[must_use]
    pub fn template(self) -> Template {
        match self {
            Self::Company => company_template,
            Self::Person => person_template,
            Self::Contract => contract_template,
            Self::Call => call_template,
        }
    }

    /// Render `record` with this kind's template.
    pub fn render(self, record: &Record) -> Result<Statement, TemplateError> {
        (self.template())(record)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::LOAD_ORDER
            .into_iter()
            .find(|kind| kind.selector().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown record kind {value:?}"))
    }
}

fn required<'r>(
    record: &'r Record,
    kind: RecordKind,
    field: &'static str,
) -> Result<&'r str, TemplateError> {
    record
        .get(field)
        .ok_or(TemplateError::MissingField { kind, field })
}

fn required_integer(
    record: &Record,
    kind: RecordKind,
    field: &'static str,
) -> Result<i64, TemplateError> {
    let raw = required(record, kind, field)?;
    raw.trim()
        .parse()
        .map_err(|_| TemplateError::InvalidInteger {
            kind,
            field,
            value: raw.to_owned(),
        })
}

/// A company entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    /// Company name, unique across the graph.
    pub name: String,
}

impl Company {
    /// Insert the company.
    #[must_use]
    pub fn statement(&self) -> Statement {
        Statement::insert("company")
            .value("name", self.name.as_str())
            .build()
    }
}

impl TryFrom<&Record> for Company {
    type Error = TemplateError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            name: required(record, RecordKind::Company, "name")?.to_owned(),
        })
    }
}

/// A person entity. Customers carry profile attributes; everyone else is
/// known only by phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Person {
    /// A customer of one of the companies.
    Customer {
        /// Identifying phone number.
        phone_number: String,
        /// Given name.
        first_name: String,
        /// Family name.
        last_name: String,
        /// City of residence.
        city: String,
        /// Age in years.
        age: i64,
    },
    /// Someone who only appears as a call participant.
    NonCustomer {
        /// Identifying phone number.
        phone_number: String,
    },
}

impl Person {
    /// Phone number identifying the person.
    #[must_use]
    pub fn phone_number(&self) -> &str {
        match self {
            Self::Customer { phone_number, .. } | Self::NonCustomer { phone_number } => {
                phone_number
            }
        }
    }

    /// Insert the person with the attributes of its variant.
    #[must_use]
    pub fn statement(&self) -> Statement {
        let insert = Statement::insert("person").value("phone_number", self.phone_number());
        match self {
            Self::Customer {
                first_name,
                last_name,
                city,
                age,
                ..
            } => insert
                .value("is_customer", true)
                .value("first_name", first_name.as_str())
                .value("last_name", last_name.as_str())
                .value("city", city.as_str())
                .value("age", *age)
                .build(),
            Self::NonCustomer { .. } => insert.value("is_customer", false).build(),
        }
    }
}

impl TryFrom<&Record> for Person {
    type Error = TemplateError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        const KIND: RecordKind = RecordKind::Person;
        let phone_number = required(record, KIND, "phone_number")?.to_owned();
        let Some(first_name) = record.get("first_name") else {
            return Ok(Self::NonCustomer { phone_number });
        };
        Ok(Self::Customer {
            phone_number,
            first_name: first_name.to_owned(),
            last_name: required(record, KIND, "last_name")?.to_owned(),
            city: required(record, KIND, "city")?.to_owned(),
            age: required_integer(record, KIND, "age")?,
        })
    }
}

/// A contract binding a provider company to a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    /// Name of the providing company.
    pub company_name: String,
    /// Phone number of the customer.
    pub person_id: String,
}

impl Contract {
    /// Match both parties, then insert the relationship.
    #[must_use]
    pub fn statement(&self) -> Statement {
        Statement::matching(
            vec![
                Lookup::new("provider", "company", "name", self.company_name.as_str()),
                Lookup::new("customer", "person", "phone_number", self.person_id.as_str()),
            ],
            "contract",
        )
        .bound("provider", "provider")
        .bound("customer", "customer")
        .build()
    }
}

impl TryFrom<&Record> for Contract {
    type Error = TemplateError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        const KIND: RecordKind = RecordKind::Contract;
        Ok(Self {
            company_name: required(record, KIND, "company_name")?.to_owned(),
            person_id: required(record, KIND, "person_id")?.to_owned(),
        })
    }
}

/// A call between two people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Phone number of the caller.
    pub caller_id: String,
    /// Phone number of the callee.
    pub callee_id: String,
    /// Start timestamp as found in the source, e.g. `2018-09-19T01:00:38`.
    pub started_at: String,
    /// Duration in seconds.
    pub duration: i64,
}

impl Call {
    /// Match both participants, then insert the call with its attributes.
    #[must_use]
    pub fn statement(&self) -> Statement {
        Statement::matching(
            vec![
                Lookup::new("caller", "person", "phone_number", self.caller_id.as_str()),
                Lookup::new("callee", "person", "phone_number", self.callee_id.as_str()),
            ],
            "call",
        )
        .bound("caller", "caller")
        .bound("callee", "callee")
        .value("started_at", self.started_at.as_str())
        .value("duration", self.duration)
        .build()
    }
}

impl TryFrom<&Record> for Call {
    type Error = TemplateError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        const KIND: RecordKind = RecordKind::Call;
        Ok(Self {
            caller_id: required(record, KIND, "caller_id")?.to_owned(),
            callee_id: required(record, KIND, "callee_id")?.to_owned(),
            started_at: required(record, KIND, "started_at")?.to_owned(),
            duration: required_integer(record, KIND, "duration")?,
        })
    }
}

/// Render a company record.
///
/// # Examples
///
/// ```
/// use phonegraph_core::{Record, company_template};
///
/// let statement = company_template(&Record::from([("name", "Telecom")]))?;
/// assert_eq!(statement.as_str(), "INSERT INTO company (name) VALUES ('Telecom');");
/// # Ok::<(), phonegraph_core::TemplateError>(())
/// ```
pub fn company_template(record: &Record) -> Result<Statement, TemplateError> {
    Company::try_from(record).map(|company| company.statement())
}

/// Render a person record; `first_name` decides whether it is a customer.
pub fn person_template(record: &Record) -> Result<Statement, TemplateError> {
    Person::try_from(record).map(|person| person.statement())
}

/// Render a contract record.
pub fn contract_template(record: &Record) -> Result<Statement, TemplateError> {
    Contract::try_from(record).map(|contract| contract.statement())
}

/// Render a call record.
pub fn call_template(record: &Record) -> Result<Statement, TemplateError> {
    Call::try_from(record).map(|call| call.statement())
}
