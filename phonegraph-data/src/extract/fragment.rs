//! Parsing one buffered fragment into a flat record.

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

use phonegraph_core::Record;

/// Why a buffered fragment could not become a record.
#[derive(Debug, Error)]
pub enum FragmentError {
    /// The XML itself is malformed.
    #[error("invalid XML")]
    Xml(#[from] quick_xml::Error),
    /// The fragment's root element is not the selector.
    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        /// Selector tag.
        expected: String,
        /// Tag actually found.
        found: String,
    },
    /// The fragment ended with elements still open.
    #[error("fragment ends with unclosed elements")]
    Unclosed,
}

/// Collect each immediate child of the `selector` root as a field.
///
/// Child text is unescaped and trimmed. Text nested deeper than the immediate
/// children is ignored, and a repeated child keeps its last value.
pub(crate) fn parse_fragment(text: &str, selector: &str) -> Result<Record, FragmentError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut fields: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                depth += 1;
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                match depth {
                    1 => check_root(&name, selector)?,
                    2 => current = Some((name, String::new())),
                    _ => {}
                }
            }
            Event::Empty(empty) => {
                let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                match depth {
                    0 => check_root(&name, selector)?,
                    1 => fields.push((name, String::new())),
                    _ => {}
                }
            }
            Event::Text(content) if depth == 2 => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&content.unescape()?);
                }
            }
            Event::CData(content) if depth == 2 => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&content));
                }
            }
            Event::End(_) => {
                if depth == 2
                    && let Some((name, value)) = current.take()
                {
                    fields.push((name, value.trim().to_owned()));
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(FragmentError::Unclosed);
    }
    Ok(fields.into_iter().collect())
}

fn check_root(found: &str, expected: &str) -> Result<(), FragmentError> {
    if found == expected {
        Ok(())
    } else {
        Err(FragmentError::UnexpectedRoot {
            expected: expected.to_owned(),
            found: found.to_owned(),
        })
    }
}
