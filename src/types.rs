//! Scalar type classification.

use crate::ast::Field;
use std::collections::BTreeSet;

/// Scalar type names of the schema language.
pub const PRIMITIVE_TYPES: [&str; 8] = [
    "String", "Int", "Float", "Boolean", "DateTime", "BigInt", "Decimal", "Json",
];

const NUMERIC_TYPES: [&str; 4] = ["Int", "Float", "BigInt", "Decimal"];

/// Set of type names treated as scalars. Any other type name is a
/// reference to another model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimitiveTypes {
    names: BTreeSet<String>,
}

impl Default for PrimitiveTypes {
    fn default() -> Self {
        Self::new(PRIMITIVE_TYPES)
    }
}

impl PrimitiveTypes {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a scalar name, e.g. an enum that should not count as a relation.
    pub fn with_type(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn contains(&self, typ: &str) -> bool {
        self.names.contains(typ)
    }

    /// A field is relation-capable when it carries a relation or its type
    /// is not a scalar.
    pub fn is_relation(&self, field: &Field) -> bool {
        field.relation.is_some() || !self.contains(&field.typ)
    }
}

pub fn is_numeric(typ: &str) -> bool {
    NUMERIC_TYPES.contains(&typ)
}
