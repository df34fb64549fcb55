use crate::common::Value;
use crate::errors::StoreResult;

use super::{
    ComparisonFilter, ComparisonMode, EqualsFilter, ExistsFilter, Filter, InFilter, LikeFilter,
    NotEqualsFilter, NotInFilter, RegexFilter,
};

/// Starts a fluent filter on `field_name`.
///
/// Dotted names address embedded fields (`field("address.city")`).
///
/// ```rust
/// use docstore::filter::field;
///
/// let seniors = field("age").gte(50).and(field("status").eq("active"));
/// ```
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A filter builder bound to one field.
///
/// Each method consumes the builder and returns a [Filter] that can be used
/// with [DocStore::find](crate::DocStore::find) or combined with other filters.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    /// Matches when the field equals `value`. A missing field never matches.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(EqualsFilter::new(self.field_name, value.into()))
    }

    /// Matches when the field differs from `value`, including when it is
    /// missing.
    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(NotEqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Greater)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::GreaterEqual)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Lesser)
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::LesserEqual)
    }

    /// Matches when the field value is one of `values`.
    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(|v| v.into()).collect();
        Filter::new(InFilter::new(self.field_name, values))
    }

    /// Matches when the field value is none of `values`, or is missing.
    pub fn not_in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        let values = values.into_iter().map(|v| v.into()).collect();
        Filter::new(NotInFilter::new(self.field_name, values))
    }

    /// Case-insensitive substring match. `%` markers are ignored.
    pub fn like(self, pattern: &str) -> Filter {
        Filter::new(LikeFilter::new(self.field_name, pattern.to_string()))
    }

    /// Regular expression match; fails if `pattern` does not compile.
    pub fn regex(self, pattern: &str) -> StoreResult<Filter> {
        Ok(Filter::new(RegexFilter::new(self.field_name, pattern, false)?))
    }

    pub fn regex_case_insensitive(self, pattern: &str) -> StoreResult<Filter> {
        Ok(Filter::new(RegexFilter::new(self.field_name, pattern, true)?))
    }

    /// Matches on presence of the field. An explicit `null` is present.
    pub fn exists(self, exists: bool) -> Filter {
        Filter::new(ExistsFilter::new(self.field_name, exists))
    }

    fn compare(self, value: Value, mode: ComparisonMode) -> Filter {
        Filter::new(ComparisonFilter::new(self.field_name, value, mode))
    }
}
