//! Generation request types, decoded from the configuration object the
//! editor UI sends.

use super::GenerateError;
use crate::ast::Model;
use crate::types::is_numeric;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Aggregate,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Aggregate => "aggregate",
        }
    }

    /// Client method invoked for this operation.
    pub fn method(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "findMany",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "aggregate" => Ok(Self::Aggregate),
            other => Err(GenerateError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl TryFrom<String> for Operation {
    type Error = GenerateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    Not,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
}

impl Operator {
    pub const NUMERIC: [Operator; 6] = [
        Self::Equals,
        Self::Not,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
    ];

    pub const TEXT: [Operator; 5] = [
        Self::Equals,
        Self::Not,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Not => "not",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
        }
    }

    /// Operators offered for a field of the given type.
    pub fn for_type(typ: &str) -> &'static [Operator] {
        if is_numeric(typ) {
            &Self::NUMERIC
        } else {
            &Self::TEXT
        }
    }

    pub fn applicable_to(self, typ: &str) -> bool {
        Self::for_type(typ).contains(&self)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Filter expression. `AND` takes precedence over `OR`, which takes
/// precedence over a bare condition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawConditions", into = "RawConditions")]
pub enum Conditions {
    #[default]
    Empty,
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Single(Condition),
}

/// Wire shape: an open object that may carry any combination of keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawConditions {
    #[serde(rename = "AND", default, skip_serializing_if = "Option::is_none")]
    and: Option<Vec<Condition>>,
    #[serde(rename = "OR", default, skip_serializing_if = "Option::is_none")]
    or: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl From<RawConditions> for Conditions {
    fn from(raw: RawConditions) -> Self {
        if let Some(and) = raw.and {
            return Self::And(and);
        }
        if let Some(or) = raw.or {
            return Self::Or(or);
        }
        match (raw.field, raw.operator) {
            (Some(field), Some(operator)) => Self::Single(Condition {
                field,
                operator,
                value: raw.value.unwrap_or(Value::Null),
            }),
            _ => Self::Empty,
        }
    }
}

impl From<Conditions> for RawConditions {
    fn from(conditions: Conditions) -> Self {
        match conditions {
            Conditions::Empty => Self::default(),
            Conditions::And(and) => Self {
                and: Some(and),
                ..Self::default()
            },
            Conditions::Or(or) => Self {
                or: Some(or),
                ..Self::default()
            },
            Conditions::Single(c) => Self {
                field: Some(c.field),
                operator: Some(c.operator),
                value: Some(c.value),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOption {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

/// Per-relation settings for an included relation field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IncludeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub include: IndexMap<String, IncludeConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSelect {
    pub select: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountOption {
    All(bool),
    Fields(FieldSelect),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateOption {
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<CountOption>,
    #[serde(rename = "_sum", default, skip_serializing_if = "Option::is_none")]
    pub sum: Option<FieldSelect>,
    #[serde(rename = "_avg", default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<FieldSelect>,
    #[serde(rename = "_min", default, skip_serializing_if = "Option::is_none")]
    pub min: Option<FieldSelect>,
    #[serde(rename = "_max", default, skip_serializing_if = "Option::is_none")]
    pub max: Option<FieldSelect>,
}

/// Everything about a query besides the model, operation and selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub model: Model,
    pub operation: Operation,
    #[serde(default)]
    pub selected_fields: Vec<String>,
    #[serde(flatten)]
    pub options: QueryOptions,
}

impl GenerationRequest {
    pub fn new<I, S>(model: Model, operation: Operation, selected_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model,
            operation,
            selected_fields: selected_fields.into_iter().map(Into::into).collect(),
            options: QueryOptions::default(),
        }
    }

    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.options.conditions = conditions;
        self
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Decode a request from JSON. An unknown `operation` is reported as
    /// [`GenerateError::UnsupportedOperation`] rather than a decode error.
    pub fn from_json(json: &str) -> Result<Self, GenerateError> {
        let value: Value = serde_json::from_str(json)?;
        if let Some(operation) = value.get("operation").and_then(Value::as_str) {
            operation.parse::<Operation>()?;
        }
        Ok(serde_json::from_value(value)?)
    }
}
