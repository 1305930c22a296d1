//! Resource parameters addressing one DICOM object on the archive.
//!
//! WADO servers disagree on which identifiers they require (strict servers
//! want `seriesUID` next to `studyUID` and `objectUID`), so parameters are an
//! ordered string mapping rather than a fixed struct. The conventional keys
//! are exported as constants.

use std::fmt;

/// Study Instance UID query key.
pub const STUDY_UID: &str = "studyUID";
/// Series Instance UID query key.
pub const SERIES_UID: &str = "seriesUID";
/// SOP Instance UID query key.
pub const OBJECT_UID: &str = "objectUID";
/// Requested media type query key.
pub const CONTENT_TYPE: &str = "contentType";
/// Requested transfer syntax query key.
pub const TRANSFER_SYNTAX: &str = "transferSyntax";
/// Request type query key, always set to `WADO` by the request builder.
pub const REQUEST_TYPE: &str = "requestType";

/// Insertion-ordered mapping from query key to value.
///
/// Inserting a key that is already present replaces its value in place, so
/// the original position is kept and requests stay reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceParameters {
    entries: Vec<(String, String)>,
}

impl ResourceParameters {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the common study/series/object triple.
    #[must_use]
    pub fn for_object(
        study_uid: impl Into<String>,
        series_uid: Option<String>,
        object_uid: impl Into<String>,
    ) -> Self {
        let mut params = Self::new();
        params.insert(STUDY_UID, study_uid);
        if let Some(series_uid) = series_uid {
            params.insert(SERIES_UID, series_uid);
        }
        params.insert(OBJECT_UID, object_uid);
        params
    }

    /// Inserts or replaces a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The `objectUID` value, used to name the saved file.
    #[must_use]
    pub fn object_uid(&self) -> Option<&str> {
        self.get(OBJECT_UID)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ResourceParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ResourceParameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl fmt::Display for ResourceParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
