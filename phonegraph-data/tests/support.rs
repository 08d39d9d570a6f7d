use bzip2::{Compression, write::BzEncoder};
use camino::{Utf8Path, Utf8PathBuf};
use phonegraph_data::SqliteSession;
use std::{fs, io::Write};
use tempfile::TempDir;

/// Directory holding the sample phone-call sources.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/phone_calls")
}

/// Scratch directory that is removed when dropped.
pub struct Scratch {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("failed to create temp dir: {err}"));
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .unwrap_or_else(|path| panic!("temp dir {path:?} is not UTF-8"));
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// Write a bzip2-compressed copy of the fixture `name` into `dir` and return
/// its path.
pub fn compress_fixture(dir: &Utf8Path, name: &str) -> Utf8PathBuf {
    let source = fixtures_dir().join(name);
    let contents = fs::read(&source)
        .unwrap_or_else(|err| panic!("failed to read fixture {source}: {err}"));
    let target = dir.join(format!("{name}.bz2"));
    let file = fs::File::create(&target)
        .unwrap_or_else(|err| panic!("failed to create {target}: {err}"));
    let mut encoder = BzEncoder::new(file, Compression::best());
    encoder
        .write_all(&contents)
        .unwrap_or_else(|err| panic!("failed to compress {source}: {err}"));
    encoder
        .finish()
        .unwrap_or_else(|err| panic!("failed to finish {target}: {err}"));
    target
}

/// Number of rows in `table`.
pub fn count_rows(session: &SqliteSession, table: &str) -> i64 {
    session
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap_or_else(|err| panic!("failed to count {table}: {err}"))
}
