use std::fmt::{Display, Formatter};

use crate::collection::{paginate, sort_documents, Document};
use crate::common::{SortOrder, SortableFields, Value};
use crate::errors::StoreResult;
use crate::filter::Filter;

use super::{invalid_pipeline, GroupStage};

/// One step of a [Pipeline].
#[derive(Debug, Clone)]
pub enum Stage {
    Match(Filter),
    Group(GroupStage),
    Sort(SortableFields),
    Skip(usize),
    Limit(usize),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::Group(_) => "$group",
            Stage::Sort(_) => "$sort",
            Stage::Skip(_) => "$skip",
            Stage::Limit(_) => "$limit",
        }
    }

    fn apply(&self, documents: Vec<Document>) -> Vec<Document> {
        match self {
            Stage::Match(filter) => documents.into_iter().filter(|doc| filter.apply(doc)).collect(),
            Stage::Group(group) => group.apply(documents),
            Stage::Sort(fields) => {
                let mut documents = documents;
                sort_documents(&mut documents, fields);
                documents
            }
            Stage::Skip(skip) => paginate(documents, Some(*skip), None),
            Stage::Limit(limit) => paginate(documents, None, Some(*limit)),
        }
    }

    fn parse(stage: &Document) -> StoreResult<Stage> {
        let mut entries = stage.iter();
        let (name, definition) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(invalid_pipeline(format!(
                    "A pipeline stage must have exactly one key, got {}",
                    stage
                )))
            }
        };

        match name.as_str() {
            "$match" => match definition {
                Value::Document(filter) => Ok(Stage::Match(Filter::parse(filter)?)),
                other => Err(invalid_pipeline(format!("$match takes a document, got {}", other))),
            },
            "$group" => Ok(Stage::Group(GroupStage::parse(definition)?)),
            "$sort" => parse_sort(definition).map(Stage::Sort),
            "$skip" => parse_count(name, definition).map(Stage::Skip),
            "$limit" => parse_count(name, definition).map(Stage::Limit),
            other => Err(invalid_pipeline(format!("Unknown pipeline stage {}", other))),
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Match(filter) => write!(f, "{{$match: {}}}", filter),
            Stage::Group(group) => write!(f, "{{$group: {:?}}}", group.key()),
            Stage::Sort(fields) => write!(f, "{{$sort: {:?}}}", fields.sorting_order()),
            Stage::Skip(n) | Stage::Limit(n) => write!(f, "{{{}: {}}}", self.name(), n),
        }
    }
}

fn parse_sort(definition: &Value) -> StoreResult<SortableFields> {
    let definition = match definition {
        Value::Document(doc) if !doc.is_empty() => doc,
        other => {
            return Err(invalid_pipeline(format!(
                "$sort takes a non-empty document, got {}",
                other
            )))
        }
    };

    let mut fields = SortableFields::new();
    for (field, direction) in definition.iter() {
        let order = match sort_direction(direction) {
            Some(order) => order,
            None => {
                return Err(invalid_pipeline(format!(
                    "$sort direction of {} must be 1 or -1, got {}",
                    field, direction
                )))
            }
        };
        fields = fields.add_sorted_field(field.clone(), order);
    }
    Ok(fields)
}

/// `1` or `-1` written as any number, so `-1.0` from a JSON caller works.
fn sort_direction(direction: &Value) -> Option<SortOrder> {
    match direction {
        Value::Int(i) => SortOrder::from_direction(*i),
        Value::Float(f) if *f == 1.0 => Some(SortOrder::Ascending),
        Value::Float(f) if *f == -1.0 => Some(SortOrder::Descending),
        _ => None,
    }
}

fn parse_count(stage: &str, definition: &Value) -> StoreResult<usize> {
    match definition {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        other => Err(invalid_pipeline(format!(
            "{} takes a non-negative integer, got {}",
            stage, other
        ))),
    }
}

/// An ordered list of stages run over a collection's documents.
///
/// ```rust
/// use docstore::aggregate::{Accumulator, GroupStage, Pipeline};
/// use docstore::common::SortOrder;
/// use docstore::filter::field;
///
/// let pipeline = Pipeline::new()
///     .filter(field("active").eq(true))
///     .group(GroupStage::by_field("department").accumulate("total", Accumulator::sum("bonus")))
///     .sort("total", SortOrder::Descending)
///     .limit(5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline { stages: Vec::new() }
    }

    /// Parses Mongo-shaped stage documents such as
    /// `[{"$match": {...}}, {"$group": {"_id": "$dept", "n": {"$sum": 1}}}]`.
    pub fn parse(stages: &[Document]) -> StoreResult<Pipeline> {
        let stages = stages.iter().map(Stage::parse).collect::<StoreResult<Vec<_>>>()?;
        Ok(Pipeline { stages })
    }

    pub fn stage(mut self, stage: Stage) -> Pipeline {
        self.stages.push(stage);
        self
    }

    /// Appends a `$match` stage.
    pub fn filter(self, filter: Filter) -> Pipeline {
        self.stage(Stage::Match(filter))
    }

    pub fn group(self, group: GroupStage) -> Pipeline {
        self.stage(Stage::Group(group))
    }

    /// Appends a `$sort` key; consecutive calls extend the same stage.
    pub fn sort(mut self, field: &str, order: SortOrder) -> Pipeline {
        if let Some(Stage::Sort(fields)) = self.stages.last_mut() {
            *fields = std::mem::take(fields).add_sorted_field(field.to_string(), order);
            return self;
        }
        self.stage(Stage::Sort(SortableFields::new().add_sorted_field(field.to_string(), order)))
    }

    pub fn skip(self, skip: usize) -> Pipeline {
        self.stage(Stage::Skip(skip))
    }

    pub fn limit(self, limit: usize) -> Pipeline {
        self.stage(Stage::Limit(limit))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub(crate) fn execute(&self, documents: Vec<Document>) -> Vec<Document> {
        self.stages
            .iter()
            .fold(documents, |documents, stage| {
                log::trace!("Running {} over {} document(s)", stage, documents.len());
                stage.apply(documents)
            })
    }
}
