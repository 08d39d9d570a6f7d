//! Streaming extraction of tagged XML fragments.
//!
//! Sources hold one container element whose children are sibling fragments,
//! typically one line each but free to span several. The extractor scans
//! lines for the selector's opening tag, buffers until the matching closing
//! tag and parses only that buffer, so memory use is bounded by the largest
//! fragment rather than the file. Identically nested fragments are not
//! supported: tag matching is flat.
#![forbid(unsafe_code)]

mod fragment;

use std::io::{self, BufRead};

use log::warn;
use phonegraph_core::Record;
use thiserror::Error;

pub use fragment::FragmentError;

/// Errors yielded while extracting fragments.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source could not be read.
    #[error("failed to read line {line}")]
    Read {
        /// 1-based line that failed to read.
        line: usize,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A buffered fragment is not well-formed XML.
    #[error("malformed <{selector}> fragment ending at line {line}")]
    MalformedFragment {
        /// Tag of the fragment.
        selector: String,
        /// 1-based line holding the fragment's closing tag.
        line: usize,
        /// Parse failure.
        #[source]
        source: FragmentError,
    },
}

/// Lazily extract one [`Record`] per `<selector>` fragment in `reader`.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use phonegraph_data::extract_records;
///
/// let source = Cursor::new(
///     "<companies>\n<company><name>Telecom</name></company>\n</companies>\n",
/// );
/// let records: Vec<_> = extract_records(source, "company").collect::<Result<_, _>>()?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].get("name"), Some("Telecom"));
/// # Ok::<(), phonegraph_data::ExtractError>(())
/// ```
pub fn extract_records<R: BufRead>(reader: R, selector: impl Into<String>) -> Fragments<R> {
    Fragments::new(reader, selector.into())
}

/// Iterator over the fragments of one source.
///
/// The iterator owns its reader and buffer; nothing survives past it. After
/// yielding an error it is exhausted.
#[derive(Debug)]
pub struct Fragments<R> {
    reader: R,
    tags: Tags,
    line: String,
    line_number: usize,
    cursor: usize,
    buffer: Option<Buffered>,
    finished: bool,
}

#[derive(Debug)]
struct Tags {
    selector: String,
    open: String,
    open_with_attributes: String,
    close: String,
}

impl Tags {
    fn new(selector: String) -> Self {
        Self {
            open: format!("<{selector}>"),
            open_with_attributes: format!("<{selector} "),
            close: format!("</{selector}>"),
            selector,
        }
    }

    fn find_open(&self, text: &str) -> Option<usize> {
        [&self.open, &self.open_with_attributes]
            .into_iter()
            .filter_map(|tag| text.find(tag.as_str()))
            .min()
    }

    fn find_close_end(&self, text: &str) -> Option<usize> {
        text.find(self.close.as_str())
            .map(|start| start + self.close.len())
    }
}

#[derive(Debug)]
struct Buffered {
    text: String,
    started_at: usize,
}

impl<R: BufRead> Fragments<R> {
    fn new(reader: R, selector: String) -> Self {
        Self {
            reader,
            tags: Tags::new(selector),
            line: String::new(),
            line_number: 0,
            cursor: 0,
            buffer: None,
            finished: false,
        }
    }

    /// Tag whose fragments are extracted.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.tags.selector
    }

    /// Number of lines consumed so far.
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.line_number
    }

    /// Load the next line. `Ok(false)` signals end of input.
    fn advance_line(&mut self) -> Result<bool, ExtractError> {
        self.line.clear();
        self.cursor = 0;
        match self.reader.read_line(&mut self.line) {
            Ok(0) => Ok(false),
            Ok(_) => {
                self.line_number += 1;
                Ok(true)
            }
            Err(source) => Err(ExtractError::Read {
                line: self.line_number + 1,
                source,
            }),
        }
    }

    fn finish_source(&mut self) {
        self.finished = true;
        if let Some(buffered) = self.buffer.take() {
            warn!(
                "dropping unterminated <{}> fragment opened at line {}",
                self.tags.selector, buffered.started_at
            );
        }
    }
}

impl<R: BufRead> Iterator for Fragments<R> {
    type Item = Result<Record, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.cursor >= self.line.len() {
                match self.advance_line() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.finish_source();
                        return None;
                    }
                    Err(err) => {
                        self.finished = true;
                        return Some(Err(err));
                    }
                }
            }

            let rest = &self.line[self.cursor..];
            if self.buffer.is_none() {
                match self.tags.find_open(rest) {
                    Some(offset) => {
                        self.cursor += offset;
                        self.buffer = Some(Buffered {
                            text: String::new(),
                            started_at: self.line_number,
                        });
                    }
                    None => self.cursor = self.line.len(),
                }
                continue;
            }

            let close_end = self.tags.find_close_end(rest);
            let consumed = close_end.unwrap_or(rest.len());
            if let Some(buffered) = self.buffer.as_mut() {
                buffered.text.push_str(&rest[..consumed]);
            }
            self.cursor += consumed;
            if close_end.is_none() {
                continue;
            }
            let Some(Buffered { text, .. }) = self.buffer.take() else {
                continue;
            };

            return match fragment::parse_fragment(&text, &self.tags.selector) {
                Ok(record) => Some(Ok(record)),
                Err(source) => {
                    self.finished = true;
                    Some(Err(ExtractError::MalformedFragment {
                        selector: self.tags.selector.clone(),
                        line: self.line_number,
                        source,
                    }))
                }
            };
        }
    }
}
