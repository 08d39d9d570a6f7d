//! Extraction, storage and loading for the phone-call graph.
//!
//! Responsibilities:
//! - Stream XML fragment sources into [`Record`](phonegraph_core::Record)s.
//! - Provide the SQLite-backed graph store and its schema.
//! - Drive jobs through templates into store transactions.
//!
//! Boundaries:
//! - Do not encode templates or record rules (live in `phonegraph-core`).
//! - Do not reorder jobs; callers own referential ordering.
//!
//! Invariants:
//! - Single-threaded and synchronous; one session per run.
//! - No global mutable state: extraction buffers live inside each iterator.

pub mod extract;
pub mod load;
mod source;
pub mod store;

pub use extract::{ExtractError, FragmentError, Fragments, extract_records};
pub use load::{JobReport, LoadError, LoadPlan, LoadReport, load_job};
pub use source::{is_bz2, open_source};
pub use store::{OpenStoreError, SchemaError, SqliteSession, SqliteTransaction};
