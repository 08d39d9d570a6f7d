//! Batch loading of jobs into a graph store.
//!
//! A job streams its source through the extractor, renders each record with
//! the job's template and executes the statements against a session. The
//! [`TransactionPolicy`] decides whether a job commits once or once per
//! record. Jobs run strictly in the order given; no reordering happens here,
//! so relationship jobs must come after the entity jobs they reference.
#![forbid(unsafe_code)]

use std::io::BufRead;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use phonegraph_core::{
    GraphSession, GraphTransaction, Job, RecordKind, Statement, StoreError, TemplateError,
    TransactionMode, TransactionPolicy,
};
use serde::Serialize;
use thiserror::Error;

use crate::extract::{ExtractError, Fragments, extract_records};
use crate::source::open_source;

/// Errors that abort a load. Later jobs never run after one of these.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The job's source could not be opened.
    #[error("failed to open source {path}")]
    OpenSource {
        /// Source path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Extraction failed part way through the source.
    #[error("failed to extract <{selector}> fragments from {path}")]
    Extract {
        /// Source path.
        path: Utf8PathBuf,
        /// Fragment tag being extracted.
        selector: String,
        /// Extraction failure.
        #[source]
        source: ExtractError,
    },
    /// A record could not be rendered into a statement.
    #[error("record {record} of {path} cannot be rendered")]
    Template {
        /// Source path.
        path: Utf8PathBuf,
        /// 1-based position of the record within the source.
        record: usize,
        /// Rendering failure.
        #[source]
        source: TemplateError,
    },
    /// The store refused a transaction or statement.
    #[error("store failed while loading {path}")]
    Store {
        /// Source path.
        path: Utf8PathBuf,
        /// Store failure.
        #[source]
        source: StoreError,
    },
}

/// Outcome of one successfully loaded job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    /// Source path.
    pub source: Utf8PathBuf,
    /// Fragment tag extracted from the source.
    pub selector: String,
    /// Kind of record loaded.
    pub kind: RecordKind,
    /// Number of records committed.
    pub records: usize,
}

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Policy every job ran under.
    pub policy: TransactionPolicy,
    /// One report per job, in run order.
    pub jobs: Vec<JobReport>,
}

impl LoadReport {
    /// Records committed across all jobs.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.jobs.iter().map(|job| job.records).sum()
    }
}

/// An ordered list of jobs sharing one transaction policy.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use phonegraph_core::TransactionPolicy;
/// use phonegraph_data::LoadPlan;
///
/// let plan = LoadPlan::phone_call_graph(Utf8Path::new("data"), TransactionPolicy::PerJob);
/// assert_eq!(plan.jobs().len(), 4);
/// assert_eq!(plan.jobs()[0].selector(), "company");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    jobs: Vec<Job>,
    policy: TransactionPolicy,
}

impl LoadPlan {
    /// Run `jobs` in the given order under `policy`.
    #[must_use]
    pub fn new(jobs: Vec<Job>, policy: TransactionPolicy) -> Self {
        Self { jobs, policy }
    }

    /// Companies, people, contracts and calls from `data_dir`, in that order.
    #[must_use]
    pub fn phone_call_graph(data_dir: &Utf8Path, policy: TransactionPolicy) -> Self {
        Self::new(Job::phone_call_graph(data_dir), policy)
    }

    /// Jobs in run order.
    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Policy applied to every job.
    #[must_use]
    pub fn policy(&self) -> TransactionPolicy {
        self.policy
    }

    /// Load every job in order, stopping at the first failure.
    pub fn run<S: GraphSession>(&self, session: &mut S) -> Result<LoadReport, LoadError> {
        let jobs = self
            .jobs
            .iter()
            .map(|job| load_job(session, job, self.policy))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LoadReport {
            policy: self.policy,
            jobs,
        })
    }
}

/// Load one job under `policy` and report how many records it committed.
///
/// On failure the enclosing transaction is rolled back: under
/// [`TransactionPolicy::PerJob`] nothing from the job remains, under
/// [`TransactionPolicy::PerRecord`] the records committed before the failure
/// remain.
pub fn load_job<S: GraphSession>(
    session: &mut S,
    job: &Job,
    policy: TransactionPolicy,
) -> Result<JobReport, LoadError> {
    info!(
        "loading {} records from {} (<{}>, {policy})",
        job.kind(),
        job.source(),
        job.selector()
    );
    let records = match policy {
        TransactionPolicy::PerJob => load_in_one_transaction(session, job)?,
        TransactionPolicy::PerRecord => load_record_by_record(session, job)?,
    };
    info!(
        "committed {records} {} records from {}",
        job.kind(),
        job.source()
    );
    Ok(JobReport {
        source: job.source().to_path_buf(),
        selector: job.selector().to_owned(),
        kind: job.kind(),
        records,
    })
}

fn load_in_one_transaction<S: GraphSession>(
    session: &mut S,
    job: &Job,
) -> Result<usize, LoadError> {
    let statements = JobStatements::open(job)?;
    let mut transaction = session
        .open_transaction(TransactionMode::Write)
        .map_err(|source| store_error(job, source))?;
    let mut records = 0;
    for statement in statements {
        let statement = statement?;
        debug!("{}: {statement}", job.selector());
        transaction
            .execute(&statement)
            .map_err(|source| store_error(job, source))?;
        records += 1;
    }
    transaction
        .commit()
        .map_err(|source| store_error(job, source))?;
    Ok(records)
}

fn load_record_by_record<S: GraphSession>(
    session: &mut S,
    job: &Job,
) -> Result<usize, LoadError> {
    let statements = JobStatements::open(job)?;
    let mut records = 0;
    for statement in statements {
        let statement = statement?;
        debug!("{}: {statement}", job.selector());
        let mut transaction = session
            .open_transaction(TransactionMode::Write)
            .map_err(|source| store_error(job, source))?;
        transaction
            .execute(&statement)
            .map_err(|source| store_error(job, source))?;
        transaction
            .commit()
            .map_err(|source| store_error(job, source))?;
        records += 1;
    }
    Ok(records)
}

fn store_error(job: &Job, source: StoreError) -> LoadError {
    LoadError::Store {
        path: job.source().to_path_buf(),
        source,
    }
}

/// Rendered statements of a job, in source order.
struct JobStatements<'j> {
    job: &'j Job,
    fragments: Fragments<Box<dyn BufRead>>,
    rendered: usize,
}

impl<'j> JobStatements<'j> {
    fn open(job: &'j Job) -> Result<Self, LoadError> {
        let reader = open_source(job.source()).map_err(|source| LoadError::OpenSource {
            path: job.source().to_path_buf(),
            source,
        })?;
        Ok(Self {
            job,
            fragments: extract_records(reader, job.selector()),
            rendered: 0,
        })
    }
}

impl Iterator for JobStatements<'_> {
    type Item = Result<Statement, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.fragments.next()? {
            Ok(record) => record,
            Err(source) => {
                return Some(Err(LoadError::Extract {
                    path: self.job.source().to_path_buf(),
                    selector: self.job.selector().to_owned(),
                    source,
                }));
            }
        };
        self.rendered += 1;
        Some(
            self.job
                .kind()
                .render(&record)
                .map_err(|source| LoadError::Template {
                    path: self.job.source().to_path_buf(),
                    record: self.rendered,
                    source,
                }),
        )
    }
}
