//! `where` clause rendering.

use super::clauses::INDENT;
use super::request::{Condition, Conditions, Operator};
use crate::ast::Model;
use crate::types::PrimitiveTypes;
use tracing::warn;

pub const NO_CONDITION: &str = "// TODO: specify filter conditions";

/// Body of a `where: { ... }` block, every line indented by `depth` levels.
pub fn render_where(
    conditions: &Conditions,
    model: &Model,
    primitives: &PrimitiveTypes,
    depth: usize,
) -> String {
    let pad = INDENT.repeat(depth);
    match conditions {
        Conditions::Empty => format!("{pad}{NO_CONDITION}"),
        Conditions::And(list) => render_group("AND", list, model, primitives, &pad),
        Conditions::Or(list) => render_group("OR", list, model, primitives, &pad),
        Conditions::Single(condition) => {
            format!("{pad}{}", render_condition(condition, model, primitives))
        }
    }
}

fn render_group(
    key: &str,
    list: &[Condition],
    model: &Model,
    primitives: &PrimitiveTypes,
    pad: &str,
) -> String {
    if list.is_empty() {
        return format!("{pad}{key}: []");
    }

    let items: Vec<String> = list
        .iter()
        .map(|c| format!("{pad}{INDENT}{{ {} }}", render_condition(c, model, primitives)))
        .collect();
    format!("{pad}{key}: [\n{}\n{pad}]", items.join(",\n"))
}

/// One `field: ...` filter entry. Relation fields are filtered through
/// `some`, whatever their cardinality.
pub fn render_condition(condition: &Condition, model: &Model, primitives: &PrimitiveTypes) -> String {
    let Condition {
        field: name,
        operator,
        value,
    } = condition;

    let field = model.field(name);
    if field.is_some_and(|f| primitives.is_relation(f)) {
        return format!("{name}: {{ some: {{ {operator}: {value} }} }}");
    }

    if let Some(field) = field {
        if !operator.applicable_to(&field.typ) {
            warn!(
                model = %model.name,
                field = %name,
                %operator,
                typ = %field.typ,
                "operator does not apply to field type"
            );
        }
    }

    match operator {
        Operator::Equals => format!("{name}: {value}"),
        _ => format!("{name}: {{ {operator}: {value} }}"),
    }
}
