use crate::collection::Document;
use crate::common::{Value, DOC_ID};
use std::any::Any;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use super::AllFilter;
use super::AndFilter;
use super::EqualsFilter;
use super::NorFilter;
use super::NotFilter;
use super::OrFilter;

/// A predicate over a single [Document].
///
/// Every filter in this module implements `FilterProvider`. Filters are
/// validated when they are constructed (by the fluent API or by
/// [Filter::parse]), so evaluation itself cannot fail: a field that is
/// missing or holds a value of the wrong type simply does not match.
pub trait FilterProvider: Any + Send + Sync + Display {
    /// Returns `true` when `entry` satisfies the filter.
    fn apply(&self, entry: &Document) -> bool;

    /// The `_id` value this filter pins, if it is a plain `_id` equality.
    ///
    /// Collections use it to answer id lookups without a scan.
    fn id_lookup(&self) -> Option<&Value> {
        None
    }

    /// `true` for the match-everything filter.
    fn is_all(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

/// A shareable, immutable filter.
///
/// Combine filters with [Filter::and], [Filter::or] and [Filter::not], or
/// with the free functions [and], [or], [nor] and [not].
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for Filter {
    fn default() -> Self {
        all()
    }
}

/// Matches every document.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

/// Matches the document whose `_id` equals `id`.
pub fn by_id<T: Into<Value>>(id: T) -> Filter {
    Filter::new(EqualsFilter::new(DOC_ID.to_string(), id.into()))
}

pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

pub fn nor(filters: Vec<Filter>) -> Filter {
    Filter::new(NorFilter::new(filters))
}

pub fn not(filter: Filter) -> Filter {
    Filter::new(NotFilter::new(filter))
}
