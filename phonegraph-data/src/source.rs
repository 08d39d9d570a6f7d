//! Opening fragment sources, transparently decompressing `.bz2` files.

use std::io::{self, BufRead, BufReader};

use bzip2::read::MultiBzDecoder;
use camino::Utf8Path;
use phonegraph_fs::open_file;

/// Open `path` as a buffered line source.
pub fn open_source(path: &Utf8Path) -> io::Result<Box<dyn BufRead>> {
    let file = open_file(path)?;
    if is_bz2(path) {
        Ok(Box::new(BufReader::new(MultiBzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Whether `path` carries a `.bz2` extension, ignoring case.
#[must_use]
pub fn is_bz2(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("bz2"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::{Compression, write::BzEncoder};
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use std::{fs, io::Write};
    use tempfile::TempDir;

    #[rstest]
    #[case("calls.xml.bz2", true)]
    #[case("calls.XML.BZ2", true)]
    #[case("calls.xml", false)]
    #[case("callsbz2", false)]
    fn detects_bz2_extensions(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_bz2(Utf8Path::new(name)), expected, "is_bz2({name})");
    }

    #[rstest]
    fn reads_compressed_sources() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("companies.xml.bz2"))
            .expect("utf-8 path");
        let file = fs::File::create(&path).expect("create bz2 file");
        let mut encoder = BzEncoder::new(file, Compression::default());
        encoder
            .write_all(b"<companies>\n<company><name>Telecom</name></company>\n</companies>\n")
            .expect("compress source");
        encoder.finish().expect("finish compression");

        let lines: Vec<String> = open_source(&path)
            .expect("open compressed source")
            .lines()
            .collect::<Result<_, _>>()
            .expect("read lines");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "<company><name>Telecom</name></company>");
    }
}
