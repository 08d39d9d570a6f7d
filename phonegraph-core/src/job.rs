//! Jobs describe one source to load; the policy decides transaction scope.

use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::RecordKind;

/// One unit of loading work: a source file, the fragment tag to extract from
/// it, and the kind whose template renders each fragment.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use phonegraph_core::{Job, RecordKind};
///
/// let jobs = Job::phone_call_graph(Utf8Path::new("data"));
/// let kinds: Vec<_> = jobs.iter().map(Job::kind).collect();
/// assert_eq!(kinds, RecordKind::LOAD_ORDER);
/// assert_eq!(jobs[1].source(), Utf8Path::new("data/people.xml"));
/// assert_eq!(jobs[1].selector(), "person");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    source: Utf8PathBuf,
    selector: String,
    kind: RecordKind,
}

impl Job {
    /// Load `source` as records of `kind`, using the kind's default selector.
    pub fn new(source: impl Into<Utf8PathBuf>, kind: RecordKind) -> Self {
        Self {
            source: source.into(),
            selector: kind.selector().to_owned(),
            kind,
        }
    }

    /// Extract fragments tagged `selector` instead of the kind's default.
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// The four jobs of a phone-call graph stored under `data_dir`, entities
    /// first.
    #[must_use]
    pub fn phone_call_graph(data_dir: &Utf8Path) -> Vec<Self> {
        RecordKind::LOAD_ORDER
            .into_iter()
            .map(|kind| Self::new(data_dir.join(kind.file_name()), kind))
            .collect()
    }

    /// Path of the source file.
    #[must_use]
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }

    /// Fragment tag extracted from the source.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Kind whose template renders the records.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }
}

/// How statements of a job are grouped into transactions.
///
/// The policy applies to every job of a run; a single job never mixes both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TransactionPolicy {
    /// One transaction per job: a failure discards every insert of the job.
    #[default]
    PerJob,
    /// One transaction per record: records committed before a failure stay.
    PerRecord,
}

impl TransactionPolicy {
    /// Configuration spelling of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerJob => "per-job",
            Self::PerRecord => "per-record",
        }
    }
}

impl fmt::Display for TransactionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a policy name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown transaction policy {value:?} (expected `per-job` or `per-record`)")]
pub struct ParsePolicyError {
    /// Text that failed to parse.
    pub value: String,
}

impl FromStr for TransactionPolicy {
    type Err = ParsePolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "per-job" => Ok(Self::PerJob),
            "per-record" => Ok(Self::PerRecord),
            _ => Err(ParsePolicyError {
                value: value.to_owned(),
            }),
        }
    }
}
