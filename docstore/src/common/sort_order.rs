/// Specifies the direction for sorting documents.
///
/// Used with [crate::collection::FindOptions::sort_by] and the `$sort`
/// aggregation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first; a missing field sorts as `null`, before everything else.
    Ascending,
    Descending,
}

impl SortOrder {
    /// The order written as `1` or `-1` in a `$sort` stage.
    pub fn from_direction(direction: i64) -> Option<SortOrder> {
        match direction {
            1 => Some(SortOrder::Ascending),
            -1 => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn direction(&self) -> i64 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

/// An ordered list of `(field, order)` pairs; earlier fields take precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortableFields {
    sorting_order: Vec<(String, SortOrder)>,
}

impl SortableFields {
    pub fn new() -> Self {
        SortableFields {
            sorting_order: Vec::new(),
        }
    }

    pub fn add_sorted_field(mut self, field_name: String, sort_order: SortOrder) -> Self {
        self.sorting_order.push((field_name, sort_order));
        self
    }

    pub fn sorting_order(&self) -> &[(String, SortOrder)] {
        &self.sorting_order
    }

    pub fn is_empty(&self) -> bool {
        self.sorting_order.is_empty()
    }
}
