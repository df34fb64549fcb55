use std::collections::{HashMap, HashSet};

use crate::collection::{Document, FindOptions};
use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::{field, Filter};

use super::AssociationDescriptor;

/// Read access the resolver needs. [DocStore](crate::DocStore) implements
/// it; tests wrap it to count lookups.
pub trait DocumentSource {
    fn has_collection(&self, name: &str) -> bool;

    fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>>;
}

/// Attaches the related documents of every descriptor to `results`.
///
/// Each descriptor costs exactly one `find` on its target collection,
/// whatever the number of results: the distinct foreign keys are gathered
/// first and fetched with a single `$in`. An array-valued foreign key
/// resolves to the array of related documents found.
pub fn resolve<S>(source: &S, results: Vec<Document>, descriptors: &[AssociationDescriptor]) -> StoreResult<Vec<Document>>
where
    S: DocumentSource + ?Sized,
{
    for descriptor in descriptors {
        for collection in [descriptor.source_collection(), descriptor.target_collection()] {
            if !source.has_collection(collection) {
                log::error!("Association {} uses undeclared collection {}", descriptor, collection);
                return Err(StoreError::new(
                    &format!("Association {} uses undeclared collection {}", descriptor, collection),
                    ErrorKind::CollectionNotFound,
                ));
            }
        }
    }

    let mut results = results;
    for descriptor in descriptors {
        results = resolve_one(source, results, descriptor)?;
    }
    Ok(results)
}

fn resolve_one<S>(source: &S, mut results: Vec<Document>, descriptor: &AssociationDescriptor) -> StoreResult<Vec<Document>>
where
    S: DocumentSource + ?Sized,
{
    let keys = distinct_keys(&results, descriptor.foreign_key_field());
    log::trace!("Resolving {} with {} distinct key(s)", descriptor, keys.len());

    let filter = field(descriptor.target_field_name()).in_array(keys);
    let related = source.find(descriptor.target_collection(), &filter, &FindOptions::new())?;

    let mut by_key: HashMap<String, Document> = HashMap::with_capacity(related.len());
    for document in related {
        if let Some(key) = document.get(descriptor.target_field_name()).map(Value::canonical_key) {
            by_key.entry(key).or_insert(document);
        }
    }

    for document in results.iter_mut() {
        let attached = match document.get(descriptor.foreign_key_field()) {
            None | Some(Value::Null) => Value::Null,
            Some(Value::Array(keys)) => Value::Array(
                keys.iter()
                    .filter_map(|key| by_key.get(&key.canonical_key()))
                    .cloned()
                    .map(Value::Document)
                    .collect(),
            ),
            Some(key) => by_key
                .get(&key.canonical_key())
                .cloned()
                .map(Value::Document)
                .unwrap_or(Value::Null),
        };
        document.put(descriptor.alias(), attached)?;
    }
    Ok(results)
}

/// Non-null foreign key values in first-seen order, array elements
/// flattened.
fn distinct_keys(results: &[Document], foreign_key_field: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    let mut push = |value: &Value| {
        if !value.is_null() && seen.insert(value.canonical_key()) {
            keys.push(value.clone());
        }
    };

    for document in results {
        match document.get(foreign_key_field) {
            Some(Value::Array(values)) => values.iter().for_each(&mut push),
            Some(value) => push(value),
            None => {}
        }
    }
    keys
}
