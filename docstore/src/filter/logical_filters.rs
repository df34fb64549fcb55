use std::{any::Any, fmt::Display};

use crate::{collection::Document, common::Value};

use super::{Filter, FilterProvider};

fn join_filters(filters: &[Filter], separator: &str) -> String {
    let mut joined = String::with_capacity(filters.len() * 16);
    for (i, filter) in filters.iter().enumerate() {
        joined.push_str(&filter.to_string());
        if i < filters.len() - 1 {
            joined.push_str(separator);
        }
    }
    joined
}

pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    #[inline]
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", join_filters(&self.filters, " && "))
    }
}

impl FilterProvider for AndFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        self.filters.iter().all(|filter| filter.apply(entry))
    }

    fn id_lookup(&self) -> Option<&Value> {
        // any conjunct pinning `_id` pins the whole conjunction
        self.filters.iter().find_map(|filter| filter.id_lookup())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    #[inline]
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", join_filters(&self.filters, " || "))
    }
}

impl FilterProvider for OrFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        self.filters.iter().any(|filter| filter.apply(entry))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NorFilter {
    filters: Vec<Filter>,
}

impl NorFilter {
    #[inline]
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        NorFilter { filters }
    }
}

impl Display for NorFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(not ({}))", join_filters(&self.filters, " || "))
    }
}

impl FilterProvider for NorFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        !self.filters.iter().any(|filter| filter.apply(entry))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotFilter {
    filter: Filter,
}

impl NotFilter {
    #[inline]
    pub(crate) fn new(filter: Filter) -> Self {
        NotFilter { filter }
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(not {})", self.filter)
    }
}

impl FilterProvider for NotFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> bool {
        !self.filter.apply(entry)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
