use std::cmp::Ordering;

use crate::collection::Document;
use crate::common::{SortOrder, SortableFields, Value};

/// Sorting and pagination for [DocStore::find](crate::DocStore::find).
///
/// Results are ordered by the sort fields (stable; ties keep insertion
/// order), then sliced to `[skip, skip + limit)`.
///
/// ```rust
/// use docstore::collection::{order_by, FindOptions};
/// use docstore::common::SortOrder;
///
/// let page = order_by("annualSalary", SortOrder::Descending)
///     .sort_by("name", SortOrder::Ascending)
///     .skip(20)
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub(crate) sort_by: Option<SortableFields>,
    pub(crate) skip: Option<usize>,
    pub(crate) limit: Option<usize>,
}

pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

pub fn skip_by(skip: usize) -> FindOptions {
    FindOptions::new().skip(skip)
}

pub fn limit_to(limit: usize) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions {
            sort_by: None,
            skip: None,
            limit: None,
        }
    }

    pub fn skip(mut self, skip: usize) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Adds a sort key. Keys apply in the order they are added.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        let fields = self.sort_by.unwrap_or_default();
        self.sort_by = Some(fields.add_sorted_field(field_name.to_string(), sort_order));
        self
    }

    pub fn sortable_fields(&self) -> Option<&SortableFields> {
        self.sort_by.as_ref()
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<usize> {
        self.limit
    }

    pub(crate) fn apply(&self, mut documents: Vec<Document>) -> Vec<Document> {
        if let Some(fields) = &self.sort_by {
            sort_documents(&mut documents, fields);
        }
        paginate(documents, self.skip, self.limit)
    }
}

/// Stable multi-key sort using the total [Value] order; a missing field
/// sorts as `Null`.
pub(crate) fn sort_documents(documents: &mut [Document], fields: &SortableFields) {
    if fields.is_empty() {
        return;
    }
    documents.sort_by(|a, b| compare_documents(a, b, fields));
}

fn compare_documents(a: &Document, b: &Document, fields: &SortableFields) -> Ordering {
    static NULL: Value = Value::Null;
    for (field_name, order) in fields.sorting_order() {
        let left = a.get(field_name).unwrap_or(&NULL);
        let right = b.get(field_name).unwrap_or(&NULL);
        let ordering = match order {
            SortOrder::Ascending => left.cmp(right),
            SortOrder::Descending => right.cmp(left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

pub(crate) fn paginate(documents: Vec<Document>, skip: Option<usize>, limit: Option<usize>) -> Vec<Document> {
    let skip = skip.unwrap_or(0);
    if skip >= documents.len() {
        return Vec::new();
    }
    let iter = documents.into_iter().skip(skip);
    match limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}
