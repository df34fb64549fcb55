use regex::Regex;
use std::{any::Any, fmt::Display};

use crate::{
    collection::Document,
    errors::{ErrorKind, StoreError, StoreResult},
};

use super::FilterProvider;

/// `$like`: case-insensitive substring match.
///
/// `%` wildcard markers are stripped from the pattern before the
/// comparison, so `%smith%`, `smith%` and `smith` behave the same.
pub(crate) struct LikeFilter {
    field_name: String,
    pattern: String,
    needle: String,
}

impl LikeFilter {
    pub(crate) fn new(field_name: String, pattern: String) -> Self {
        let needle = pattern.replace('%', "").to_lowercase();
        LikeFilter {
            field_name,
            pattern,
            needle,
        }
    }
}

impl Display for LikeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} like {})", self.field_name, self.pattern)
    }
}

impl FilterProvider for LikeFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        match entry.get(&self.field_name).and_then(|v| v.as_str()) {
            Some(text) => text.to_lowercase().contains(&self.needle),
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$regex`: real regular expression match on string fields.
pub(crate) struct RegexFilter {
    field_name: String,
    pattern: Regex,
}

impl RegexFilter {
    /// Compiles the pattern; a pattern that does not compile is an
    /// [ErrorKind::InvalidFilter].
    pub(crate) fn new(field_name: String, pattern: &str, case_insensitive: bool) -> StoreResult<Self> {
        let compiled = regex::RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| {
                log::error!("Invalid regex pattern '{}': {}", pattern, e);
                StoreError::new(
                    &format!("Invalid regex pattern '{}': {}", pattern, e),
                    ErrorKind::InvalidFilter,
                )
            })?;

        Ok(RegexFilter {
            field_name,
            pattern: compiled,
        })
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} =~ {})", self.field_name, self.pattern.as_str())
    }
}

impl FilterProvider for RegexFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        match entry.get(&self.field_name).and_then(|v| v.as_str()) {
            Some(text) => self.pattern.is_match(text),
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
