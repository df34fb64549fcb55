use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};

use super::{
    all, and, nor, not, or, ComparisonFilter, ComparisonMode, EqualsFilter, ExistsFilter, Filter,
    InFilter, LikeFilter, NotEqualsFilter, NotInFilter, RegexFilter,
};

const OPTIONS: &str = "$options";

impl Filter {
    /// Parses a Mongo-shaped filter document into a [Filter].
    ///
    /// Top-level keys are joined with an implicit `$and`; `{}` matches every
    /// document. The whole expression is validated here, so a malformed
    /// filter is rejected with [ErrorKind::InvalidFilter] before any
    /// document is looked at.
    ///
    /// ```rust
    /// use docstore::doc;
    /// use docstore::filter::Filter;
    ///
    /// let filter = Filter::parse(&doc! {
    ///     "departmentId": "D1",
    ///     "annualSalary": { "$gte": 50000 },
    ///     "$or": [ { "status": "active" }, { "status": { "$exists": false } } ],
    /// }).unwrap();
    /// ```
    pub fn parse(expression: &Document) -> StoreResult<Filter> {
        if expression.is_empty() {
            return Ok(all());
        }

        let mut filters = Vec::with_capacity(expression.size());
        for (key, value) in expression.iter() {
            let filter = if key.starts_with('$') {
                parse_logical(key, value)?
            } else {
                parse_field(key, value)?
            };
            filters.push(filter);
        }
        Ok(combine(filters))
    }
}

fn combine(mut filters: Vec<Filter>) -> Filter {
    if filters.len() == 1 {
        filters.remove(0)
    } else {
        and(filters)
    }
}

fn invalid(message: String) -> StoreError {
    log::error!("{}", message);
    StoreError::new(&message, ErrorKind::InvalidFilter)
}

fn parse_logical(operator: &str, operand: &Value) -> StoreResult<Filter> {
    let items = match operand {
        Value::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(invalid(format!(
                "{} requires a non-empty array of filters, found {}",
                operator, operand
            )))
        }
    };

    let mut filters = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Document(sub) => filters.push(Filter::parse(sub)?),
            other => {
                return Err(invalid(format!(
                    "{} operands must be filter documents, found {}",
                    operator, other
                )))
            }
        }
    }

    match operator {
        "$and" => Ok(and(filters)),
        "$or" => Ok(or(filters)),
        "$nor" => Ok(nor(filters)),
        _ => Err(invalid(format!("Unknown top-level operator {}", operator))),
    }
}

fn parse_field(field_name: &str, value: &Value) -> StoreResult<Filter> {
    if let Value::Document(operators) = value {
        if operators.is_empty() {
            return Err(invalid(format!("Empty operator object for field {}", field_name)));
        }

        let operator_keys = operators.iter().filter(|(k, _)| k.starts_with('$')).count();
        if operator_keys == operators.size() {
            return parse_operators(field_name, operators);
        }
        if operator_keys > 0 {
            return Err(invalid(format!(
                "Field {} mixes operators with plain keys in {}",
                field_name, operators
            )));
        }
    }

    // literal: whole-value equality, nested documents included
    Ok(Filter::new(EqualsFilter::new(field_name.to_string(), value.clone())))
}

fn parse_operators(field_name: &str, operators: &Document) -> StoreResult<Filter> {
    let options = operators.get_raw(OPTIONS);
    if options.is_some() && operators.get_raw("$regex").is_none() {
        return Err(invalid(format!("{} is only valid together with $regex", OPTIONS)));
    }

    let name = field_name.to_string();
    let mut filters = Vec::with_capacity(operators.size());
    for (operator, operand) in operators.iter() {
        let filter = match operator.as_str() {
            "$eq" => Filter::new(EqualsFilter::new(name.clone(), operand.clone())),
            "$ne" => Filter::new(NotEqualsFilter::new(name.clone(), operand.clone())),
            "$in" => Filter::new(InFilter::new(name.clone(), array_operand(operator, operand)?)),
            "$nin" => Filter::new(NotInFilter::new(name.clone(), array_operand(operator, operand)?)),
            "$gt" => comparison(&name, operand, ComparisonMode::Greater),
            "$gte" => comparison(&name, operand, ComparisonMode::GreaterEqual),
            "$lt" => comparison(&name, operand, ComparisonMode::Lesser),
            "$lte" => comparison(&name, operand, ComparisonMode::LesserEqual),
            "$like" => {
                let pattern = string_operand(operator, operand)?;
                Filter::new(LikeFilter::new(name.clone(), pattern.to_string()))
            }
            "$regex" => {
                let pattern = string_operand(operator, operand)?;
                let case_insensitive = regex_options(options)?;
                Filter::new(RegexFilter::new(name.clone(), pattern, case_insensitive)?)
            }
            "$exists" => match operand {
                Value::Bool(exists) => Filter::new(ExistsFilter::new(name.clone(), *exists)),
                other => {
                    return Err(invalid(format!("$exists requires a boolean, found {}", other)))
                }
            },
            "$not" => match operand {
                Value::Document(inner)
                    if !inner.is_empty() && inner.iter().all(|(k, _)| k.starts_with('$')) =>
                {
                    not(parse_operators(field_name, inner)?)
                }
                other => {
                    return Err(invalid(format!(
                        "$not on field {} requires an operator object, found {}",
                        field_name, other
                    )))
                }
            },
            OPTIONS => continue,
            unknown => {
                return Err(invalid(format!(
                    "Unknown operator {} on field {}",
                    unknown, field_name
                )))
            }
        };
        filters.push(filter);
    }
    Ok(combine(filters))
}

fn comparison(field_name: &str, operand: &Value, mode: ComparisonMode) -> Filter {
    Filter::new(ComparisonFilter::new(field_name.to_string(), operand.clone(), mode))
}

fn array_operand(operator: &str, operand: &Value) -> StoreResult<Vec<Value>> {
    match operand {
        Value::Array(items) => Ok(items.clone()),
        other => Err(invalid(format!("{} requires an array, found {}", operator, other))),
    }
}

fn string_operand<'a>(operator: &str, operand: &'a Value) -> StoreResult<&'a str> {
    operand
        .as_str()
        .ok_or_else(|| invalid(format!("{} requires a string, found {}", operator, operand)))
}

fn regex_options(options: Option<&Value>) -> StoreResult<bool> {
    match options {
        None => Ok(false),
        Some(Value::String(flags)) => {
            if flags.chars().all(|c| c == 'i') {
                Ok(flags.contains('i'))
            } else {
                Err(invalid(format!("Unsupported regex options '{}'", flags)))
            }
        }
        Some(other) => Err(invalid(format!("{} requires a string, found {}", OPTIONS, other))),
    }
}
