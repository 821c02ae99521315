use serde::{Deserialize, Serialize};

use crate::QueryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDir {
    Asc,
    Desc,
}

/// One ordering key; `-field` means descending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

impl OrderKey {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let raw = raw.trim();
        let (field, dir) = match raw.strip_prefix('-') {
            Some(rest) => (rest, SortDir::Desc),
            None => (raw.strip_prefix('+').unwrap_or(raw), SortDir::Asc),
        };
        if field.is_empty() {
            return Err(QueryError::EmptyField(raw.to_string()));
        }
        Ok(Self {
            field: field.to_string(),
            dir,
        })
    }

    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Self>, QueryError> {
        raw.iter().map(|s| Self::parse(s.as_ref())).collect()
    }
}
