//! Old→new tag replacement table.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::errors::{Result, RetagError};

/// Ordered mapping from an old tag token to its replacement.
///
/// Iteration follows the order of the source document. That order only
/// matters when two entries match overlapping text; the earlier entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, String>")]
pub struct TagMapping {
    entries: IndexMap<String, String>,
}

impl TagMapping {
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = IndexMap::new();
        for (old, new) in entries {
            let old = old.into();
            if map.insert(old.clone(), new.into()).is_some() {
                return Err(RetagError::config(format!(
                    "tag `{old}` appears more than once in the mapping"
                )));
            }
        }
        Self::try_from(map)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Exact lookup of a whole tag.
    pub fn get(&self, old: &str) -> Option<&str> {
        self.entries.get(old).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<IndexMap<String, String>> for TagMapping {
    type Error = RetagError;

    fn try_from(entries: IndexMap<String, String>) -> Result<Self> {
        if entries.is_empty() {
            return Err(RetagError::config("tag mapping must contain at least one entry"));
        }
        if let Some(old) = entries.keys().find(|k| k.trim().is_empty()) {
            return Err(RetagError::config(format!(
                "tag mapping contains an empty key `{old}`"
            )));
        }
        Ok(Self { entries })
    }
}
