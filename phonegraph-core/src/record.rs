//! Flat field maps produced by fragment extraction.

use std::collections::BTreeMap;

/// One extracted fragment: child element names mapped to their text.
///
/// Records are built once and never mutated. Field order is irrelevant, so the
/// map is kept sorted to make debug output and comparisons deterministic.
///
/// # Examples
///
/// ```
/// use phonegraph_core::Record;
///
/// let record = Record::from([("name", "Telecom")]);
/// assert_eq!(record.get("name"), Some("Telecom"));
/// assert!(!record.contains("city"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Value of `field`, if the fragment carried it.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Whether the fragment carried `field`, even with empty text.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the fragment had no child elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    /// Later pairs replace earlier ones with the same field name.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Record;
    use rstest::rstest;

    #[rstest]
    fn later_duplicates_replace_earlier_values() {
        let record: Record = [("city", "Paris"), ("city", "Lyon")].into_iter().collect();
        assert_eq!(record.get("city"), Some("Lyon"));
        assert_eq!(record.len(), 1);
    }

    #[rstest]
    fn empty_values_still_count_as_present() {
        let record = Record::from([("first_name", "")]);
        assert!(record.contains("first_name"));
        assert_eq!(record.get("first_name"), Some(""));
    }

    #[rstest]
    fn iterates_in_field_order() {
        let record = Record::from([("b", "2"), ("a", "1")]);
        let pairs: Vec<_> = record.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }
}
