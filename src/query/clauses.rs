//! Renderers for the object-literal clauses of a query call: selection,
//! include, ordering, pagination and aggregation.
//!
//! Each renderer returns finished `key: value` entries whose continuation
//! lines are already indented for their nesting depth.

use super::request::{
    AggregateOption, CountOption, FieldSelect, Pagination, RelationOption, SortOption,
};
use crate::ast::Field;
use serde_json::{Map, Value};

pub(super) const INDENT: &str = "  ";

/// Indent every line after the first by `depth` levels.
pub(super) fn nest(text: &str, depth: usize) -> String {
    let pad = INDENT.repeat(depth);
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&pad);
            }
        }
        out.push_str(line);
    }
    out
}

/// Pretty-printed JSON value nested at `depth`.
pub(super) fn pretty(value: &Value, depth: usize) -> String {
    nest(&format!("{value:#}"), depth)
}

/// `{ "a": true, "b": true }` in the given key order. Repeated names collapse.
pub(super) fn true_map<'a>(names: impl IntoIterator<Item = &'a str>) -> Map<String, Value> {
    names
        .into_iter()
        .map(|name| (name.to_string(), Value::Bool(true)))
        .collect()
}

pub(super) fn selection<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    format!("select: {}", pretty(&Value::Object(true_map(names)), 1))
}

fn order_value(sort: &[SortOption]) -> Value {
    Value::Array(
        sort.iter()
            .map(|option| {
                let mut entry = Map::new();
                entry.insert(
                    option.field.clone(),
                    Value::String(option.order.as_str().to_string()),
                );
                Value::Object(entry)
            })
            .collect(),
    )
}

pub(super) fn order_by(sort: Option<&[SortOption]>) -> Option<String> {
    match sort {
        Some(sort) if !sort.is_empty() => {
            Some(format!("orderBy: {}", pretty(&order_value(sort), 1)))
        }
        _ => None,
    }
}

pub(super) fn pagination(pagination: Option<&Pagination>) -> Vec<String> {
    let Some(pagination) = pagination else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    if let Some(skip) = pagination.skip {
        entries.push(format!("skip: {skip}"));
    }
    if let Some(take) = pagination.take {
        entries.push(format!("take: {take}"));
    }
    if let Some(cursor) = &pagination.cursor {
        entries.push(format!("cursor: {{ {}: {} }}", cursor.field, cursor.value));
    }
    entries
}

/// `include` entry for the selected relation fields. Nothing is rendered
/// once `depth` reaches the configured `maxDepth`.
pub(super) fn include(
    relations: &[&Field],
    option: Option<&RelationOption>,
    identity_field: &str,
    depth: usize,
) -> Option<String> {
    if let Some(max_depth) = option.and_then(|o| o.max_depth) {
        if depth >= max_depth {
            return None;
        }
    }
    if relations.is_empty() {
        return None;
    }

    let mut include = Map::new();
    for field in relations {
        let config = option.and_then(|o| o.include.get(&field.name));

        let select = match config.and_then(|c| c.select.as_ref()) {
            Some(names) => true_map(names.iter().map(String::as_str)),
            None => true_map([identity_field]),
        };

        let mut entry = Map::new();
        entry.insert("select".to_string(), Value::Object(select));

        if let Some(sort) = config.and_then(|c| c.sort.as_deref()) {
            if !sort.is_empty() {
                entry.insert("orderBy".to_string(), order_value(sort));
            }
        }
        if let Some(pagination) = config.and_then(|c| c.pagination.as_ref()) {
            if let Some(skip) = pagination.skip {
                entry.insert("skip".to_string(), Value::from(skip));
            }
            if let Some(take) = pagination.take {
                entry.insert("take".to_string(), Value::from(take));
            }
            if let Some(cursor) = &pagination.cursor {
                let mut value = Map::new();
                value.insert(cursor.field.clone(), cursor.value.clone());
                entry.insert("cursor".to_string(), Value::Object(value));
            }
        }

        include.insert(field.name.clone(), Value::Object(entry));
    }

    Some(format!("include: {}", pretty(&Value::Object(include), 1)))
}

fn select_block(op: &str, fields: &FieldSelect) -> String {
    let select = pretty(
        &Value::Object(true_map(fields.select.iter().map(String::as_str))),
        2,
    );
    format!("{op}: {{\n{INDENT}{INDENT}select: {select}\n{INDENT}}}")
}

pub(super) fn aggregate(aggregate: Option<&AggregateOption>) -> Vec<String> {
    let Some(aggregate) = aggregate else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    match &aggregate.count {
        Some(CountOption::All(true)) => entries.push("_count: true".to_string()),
        Some(CountOption::Fields(fields)) => entries.push(select_block("_count", fields)),
        Some(CountOption::All(false)) | None => {}
    }

    let ops = [
        ("_sum", &aggregate.sum),
        ("_avg", &aggregate.avg),
        ("_min", &aggregate.min),
        ("_max", &aggregate.max),
    ];
    for (op, fields) in ops {
        if let Some(fields) = fields {
            entries.push(select_block(op, fields));
        }
    }

    entries
}
