//! Core domain types for the phone-call graph loader.
//!
//! The crate holds everything that does not touch a file or a database:
//! extracted [`Record`]s, the [`RecordKind`] templates that render them into
//! [`Statement`]s, the [`Job`] description consumed by the loader, and the
//! [`GraphSession`]/[`GraphTransaction`] traits a store backend implements.
#![forbid(unsafe_code)]

mod job;
mod record;
mod statement;
pub mod store;
mod template;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use job::{Job, ParsePolicyError, TransactionPolicy};
pub use record::Record;
pub use statement::{Insert, Literal, Lookup, Statement};
pub use store::{BoxError, GraphSession, GraphTransaction, StoreError, TransactionMode};
pub use template::{
    Call, Company, Contract, Person, RecordKind, Template, TemplateError, call_template,
    company_template, contract_template, person_template,
};
