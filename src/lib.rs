//! Facade crate for the phone-call graph loader.
//!
//! This crate re-exports the core domain types together with the extraction,
//! SQLite store and loading APIs, so callers can load a dataset with one
//! dependency.

#![forbid(unsafe_code)]

pub use phonegraph_core::{
    GraphSession, GraphTransaction, Job, Record, RecordKind, Statement, StoreError, Template,
    TemplateError, TransactionMode, TransactionPolicy,
};

pub use phonegraph_data::{
    ExtractError, LoadError, LoadPlan, LoadReport, OpenStoreError, SqliteSession, extract_records,
    load_job,
};
