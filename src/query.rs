//! Query snippet generation.
//!
//! Turns one model plus a [`GenerationRequest`] into a query-builder call
//! expression such as
//!
//! ```text
//! const results = await prisma.user.findMany({
//!   where: {
//!     id: { gt: 100 }
//!   },
//!   select: {
//!     "id": true
//!   }
//! });
//! ```

mod clauses;
mod filter;
mod request;

pub use filter::{render_condition, render_where, NO_CONDITION};
pub use request::{
    AggregateOption, Condition, Conditions, CountOption, Cursor, FieldSelect, GenerationRequest,
    IncludeConfig, Operation, Operator, Pagination, QueryOptions, RelationOption, SortOption,
    SortOrder,
};

use crate::ast::{Field, Model};
use crate::types::PrimitiveTypes;
use clauses::INDENT;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),
}

/// The include renderer is entered once, at the top level.
const ROOT_DEPTH: usize = 0;

const CREATE_PLACEHOLDER: &str = "// TODO: specify the data to create";
const UPDATE_PLACEHOLDER: &str = "// TODO: specify the data to update";
const UPDATE_TARGET: &str = "id: 1 // TODO: specify the id of the record to update";
const DELETE_TARGET: &str = "id: 1 // TODO: specify the id of the record to delete";

#[derive(Debug, Clone)]
pub struct QueryGenerator {
    primitives: PrimitiveTypes,
    client: String,
    identity_field: String,
}

impl Default for QueryGenerator {
    fn default() -> Self {
        Self {
            primitives: PrimitiveTypes::default(),
            client: "prisma".to_string(),
            identity_field: "id".to_string(),
        }
    }
}

/// Selected fields split by how they are rendered.
struct Selection<'a> {
    regular: Vec<&'a str>,
    relations: Vec<&'a Field>,
}

impl QueryGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primitives(mut self, primitives: PrimitiveTypes) -> Self {
        self.primitives = primitives;
        self
    }

    /// Receiver identifier of the generated call, `prisma` by default.
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Field selected on included relations that have no explicit select list.
    pub fn with_identity_field(mut self, field: impl Into<String>) -> Self {
        self.identity_field = field.into();
        self
    }

    fn partition<'a>(&self, model: &'a Model, selected: &'a [String]) -> Selection<'a> {
        let mut selection = Selection {
            regular: Vec::new(),
            relations: Vec::new(),
        };

        for name in selected {
            match model.field(name) {
                Some(field) if self.primitives.is_relation(field) => {
                    if !selection.relations.iter().any(|f| f.name == field.name) {
                        selection.relations.push(field);
                    }
                }
                _ => selection.regular.push(name),
            }
        }

        selection
    }

    pub fn generate(&self, request: &GenerationRequest) -> String {
        let model = &request.model;
        let options = &request.options;
        let selection = self.partition(model, &request.selected_fields);

        debug!(
            model = %model.name,
            operation = %request.operation,
            fields = selection.regular.len(),
            relations = selection.relations.len(),
            "generating query"
        );

        let where_clause = || {
            format!(
                "where: {{\n{}\n{INDENT}}}",
                render_where(&options.conditions, model, &self.primitives, 2)
            )
        };
        let select = || clauses::selection(selection.regular.iter().copied());
        let include = || {
            clauses::include(
                &selection.relations,
                options.relation.as_ref(),
                &self.identity_field,
                ROOT_DEPTH,
            )
        };

        let mut entries = Vec::new();
        match request.operation {
            Operation::Aggregate => {
                entries.push(where_clause());
                entries.extend(clauses::aggregate(options.aggregate.as_ref()));
            }
            Operation::Create => {
                entries.push(placeholder_block("data", CREATE_PLACEHOLDER));
                entries.push(select());
                entries.extend(include());
            }
            Operation::Read => {
                entries.push(where_clause());
                entries.push(select());
                entries.extend(include());
                entries.extend(clauses::order_by(options.sort.as_deref()));
                entries.extend(clauses::pagination(options.pagination.as_ref()));
            }
            Operation::Update => {
                entries.push(placeholder_block("where", UPDATE_TARGET));
                entries.push(placeholder_block("data", UPDATE_PLACEHOLDER));
                entries.push(select());
                entries.extend(include());
            }
            Operation::Delete => {
                entries.push(placeholder_block("where", DELETE_TARGET));
                entries.push(select());
                entries.extend(include());
            }
        }

        let binding = match request.operation {
            Operation::Read => "results",
            _ => "result",
        };

        let separator = format!(",\n{INDENT}");
        format!(
            "const {binding} = await {}.{}.{}({{\n{INDENT}{}\n}});",
            self.client,
            model.root_name(),
            request.operation.method(),
            entries.join(separator.as_str()),
        )
    }
}

fn placeholder_block(key: &str, line: &str) -> String {
    format!("{key}: {{\n{INDENT}{INDENT}{line}\n{INDENT}}}")
}

/// Generate with the default configuration.
pub fn generate_query(request: &GenerationRequest) -> String {
    QueryGenerator::default().generate(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Relation;
    use serde_json::json;

    fn user() -> Model {
        let mut id = Field::new("id", "Int");
        id.is_id = true;
        id.is_unique = true;
        let mut email = Field::new("email", "String");
        email.is_unique = true;
        let mut name = Field::new("name", "String");
        name.is_required = false;
        let mut posts = Field::new("posts", "Post");
        posts.is_list = true;
        posts.relation = Some(Relation::default());

        let mut model = Model::new("User");
        model.fields = vec![id, email, name, posts];
        model
    }

    fn read(fields: &[&str]) -> GenerationRequest {
        GenerationRequest::new(user(), Operation::Read, fields.iter().copied())
    }

    #[test]
    fn test_read_query() {
        let out = generate_query(&read(&["id", "email"]));
        assert!(out.contains("prisma.user.findMany"));
        assert!(out.contains(r#""id": true"#));
        assert!(out.contains(r#""email": true"#));
        assert!(out.contains(NO_CONDITION));
        assert!(!out.contains(r#""name""#));
    }

    #[test]
    fn test_read_query_exact_shape() {
        let request = read(&["id", "email"]).with_conditions(Conditions::Single(Condition::new(
            "id",
            Operator::Gt,
            100,
        )));
        let expected = [
            "const results = await prisma.user.findMany({",
            "  where: {",
            "    id: { gt: 100 }",
            "  },",
            "  select: {",
            r#"    "id": true,"#,
            r#"    "email": true"#,
            "  }",
            "});",
        ]
        .join("\n");
        assert_eq!(generate_query(&request), expected);
    }

    #[test]
    fn test_empty_selection_renders_empty_object() {
        let out = generate_query(&read(&[]));
        assert!(out.contains("prisma.user.findMany"));
        assert!(out.contains("select: {}"));
    }

    #[test]
    fn test_all_fields_routes_relations_to_include() {
        let model = user();
        let names: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
        let out = generate_query(&read(&names));

        for regular in ["id", "email", "name"] {
            assert!(out.contains(&format!(r#""{regular}": true"#)));
        }
        assert!(!out.contains(r#""posts": true"#));
        assert!(out.contains("include: {"));
        assert!(out.contains(r#""posts": {"#));
    }

    #[test]
    fn test_create_query() {
        let request = GenerationRequest::new(user(), Operation::Create, ["email", "name"]);
        let out = generate_query(&request);
        assert!(out.starts_with("const result = await prisma.user.create({"));
        assert!(out.contains(CREATE_PLACEHOLDER));
        assert!(out.contains("select: {\n    \"email\": true,\n    \"name\": true\n  }"));
        assert!(!out.contains(r#""id": true"#));
        assert!(!out.contains("where"));
        assert!(out.ends_with("\n});"));
    }

    #[test]
    fn test_update_and_delete_use_placeholder_id() {
        for operation in [Operation::Update, Operation::Delete] {
            let mut model = user();
            model.fields[0].name = "uuid".to_string();
            let request = GenerationRequest::new(model, operation, ["email"]).with_conditions(
                Conditions::Single(Condition::new("email", Operator::Equals, "x")),
            );
            let out = generate_query(&request);
            assert!(out.contains(&format!("prisma.user.{}(", operation.method())));
            assert!(out.contains("where: {\n    id: 1 // TODO"));
            assert!(!out.contains(r#"email: "x""#));
            assert!(out.contains(r#""email": true"#));
        }
    }

    #[test]
    fn test_update_has_data_block() {
        let out = generate_query(&GenerationRequest::new(user(), Operation::Update, ["name"]));
        assert!(out.contains(UPDATE_PLACEHOLDER));
        let out = generate_query(&GenerationRequest::new(user(), Operation::Delete, ["name"]));
        assert!(!out.contains("data:"));
    }

    #[test]
    fn test_and_wins_over_bare_field() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "model": serde_json::to_value(user()).unwrap(),
            "operation": "read",
            "selectedFields": ["id"],
            "conditions": {
                "AND": [{ "field": "email", "operator": "contains", "value": "@example.com" }],
                "field": "name",
                "operator": "equals",
                "value": "bob"
            }
        }))
        .unwrap();
        let out = generate_query(&request);
        assert!(out.contains("AND: ["));
        assert!(out.contains(r#"{ email: { contains: "@example.com" } }"#));
        assert!(!out.contains("bob"));
    }

    #[test]
    fn test_relation_filter_in_where() {
        let request = read(&["id"]).with_conditions(Conditions::Single(Condition::new(
            "posts",
            Operator::Contains,
            "rust",
        )));
        let out = generate_query(&request);
        assert!(out.contains(r#"posts: { some: { contains: "rust" } }"#));
    }

    #[test]
    fn test_root_name() {
        let mut model = user();
        model.name = "UserProfile".to_string();
        let out = generate_query(&GenerationRequest::new(model, Operation::Read, ["id"]));
        assert!(out.contains("prisma.userProfile.findMany"));
    }

    #[test]
    fn test_read_with_sort_and_pagination() {
        let options = QueryOptions {
            sort: Some(vec![SortOption {
                field: "email".to_string(),
                order: SortOrder::Desc,
            }]),
            pagination: Some(Pagination {
                skip: Some(20),
                take: Some(10),
                cursor: None,
            }),
            ..QueryOptions::default()
        };
        let out = generate_query(&read(&["id"]).with_options(options));
        let order = out.find("orderBy: [").unwrap();
        let skip = out.find("skip: 20").unwrap();
        let take = out.find("take: 10").unwrap();
        assert!(out.find("select:").unwrap() < order);
        assert!(order < skip && skip < take);
        assert!(!out.contains("cursor"));
    }

    #[test]
    fn test_sort_and_pagination_only_for_read() {
        let options = QueryOptions {
            sort: Some(vec![SortOption {
                field: "email".to_string(),
                order: SortOrder::Asc,
            }]),
            pagination: Some(Pagination {
                take: Some(1),
                ..Pagination::default()
            }),
            ..QueryOptions::default()
        };
        let request = GenerationRequest::new(user(), Operation::Create, ["id"]).with_options(options);
        let out = generate_query(&request);
        assert!(!out.contains("orderBy"));
        assert!(!out.contains("take"));
    }

    #[test]
    fn test_max_depth_zero_suppresses_include() {
        let options = QueryOptions {
            relation: Some(RelationOption {
                max_depth: Some(0),
                ..RelationOption::default()
            }),
            ..QueryOptions::default()
        };
        let out = generate_query(&read(&["id", "posts"]).with_options(options));
        assert!(!out.contains("include"));
        assert!(!out.contains("posts"));

        let options = QueryOptions {
            relation: Some(RelationOption {
                max_depth: Some(5),
                ..RelationOption::default()
            }),
            ..QueryOptions::default()
        };
        let out = generate_query(&read(&["id", "posts"]).with_options(options));
        assert!(out.contains("include: {"));
    }

    #[test]
    fn test_aggregate_query() {
        let options = QueryOptions {
            conditions: Conditions::Single(Condition::new("id", Operator::Lte, 50)),
            aggregate: Some(AggregateOption {
                count: Some(CountOption::All(true)),
                avg: Some(FieldSelect {
                    select: vec!["id".to_string()],
                }),
                ..AggregateOption::default()
            }),
            ..QueryOptions::default()
        };
        let request = GenerationRequest::new(user(), Operation::Aggregate, ["email"]).with_options(options);
        let out = generate_query(&request);
        assert!(out.starts_with("const result = await prisma.user.aggregate({"));
        assert!(out.contains("id: { lte: 50 }"));
        assert!(out.contains("_count: true"));
        assert!(out.contains("_avg: {\n    select: {"));
        assert!(!out.contains("select: {\n    \"email\""));
    }

    #[test]
    fn test_aggregate_without_options() {
        let out = generate_query(&GenerationRequest::new(user(), Operation::Aggregate, ["id"]));
        assert!(out.contains(NO_CONDITION));
        assert!(!out.contains("_count"));
    }

    #[test]
    fn test_custom_client_and_identity() {
        let generator = QueryGenerator::new()
            .with_client("db")
            .with_identity_field("uuid");
        let out = generator.generate(&read(&["posts"]));
        assert!(out.contains("await db.user.findMany"));
        assert!(out.contains(r#""uuid": true"#));
    }

    #[test]
    fn test_custom_primitives_change_partition() {
        let mut model = user();
        model.fields.push(Field::new("role", "Role"));
        let request = GenerationRequest::new(model, Operation::Read, ["role"]);

        let out = generate_query(&request);
        assert!(!out.contains(r#""role": true"#));

        let generator =
            QueryGenerator::new().with_primitives(PrimitiveTypes::default().with_type("Role"));
        let out = generator.generate(&request);
        assert!(out.contains(r#""role": true"#));
    }
}
