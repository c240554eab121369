use crate::ast::{Field, Model, SchemaDocument};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelGraph {
    pub nodes: Vec<ModelNode>,
    pub edges: Vec<RelationEdge>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    pub fields: Vec<FieldRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRow {
    pub name: String,
    /// Type with list/optional suffixes, e.g. `Post[]`
    #[serde(rename = "type")]
    pub typ: String,
    pub is_id: bool,
    pub is_unique: bool,
    pub is_relation: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationEdge {
    pub from: String,
    pub to: String,
    pub field: String,
    pub kind: RelationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ModelGraph {
    pub fn from_document(doc: &SchemaDocument) -> Self {
        let nodes = doc
            .models
            .iter()
            .map(|m| ModelNode {
                id: m.name.clone(),
                db_name: m.db_name.clone(),
                fields: m
                    .fields
                    .iter()
                    .map(|f| FieldRow {
                        name: f.name.clone(),
                        typ: f.display_type(),
                        is_id: f.is_id,
                        is_unique: f.is_unique,
                        is_relation: f.relation.is_some(),
                    })
                    .collect(),
            })
            .collect();

        let edges = doc
            .models
            .iter()
            .flat_map(|source| {
                source.fields.iter().filter_map(move |field| {
                    let target = doc.model(&field.typ)?;
                    Some(RelationEdge {
                        from: source.name.clone(),
                        to: target.name.clone(),
                        field: field.name.clone(),
                        kind: relation_kind(field, target),
                        label: field.relation.as_ref().and_then(|r| r.name.clone()),
                    })
                })
            })
            .collect();

        ModelGraph { nodes, edges }
    }

    pub fn edges_from<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a RelationEdge> {
        self.edges.iter().filter(move |e| e.from == model)
    }
}

fn relation_kind(field: &Field, target: &Model) -> RelationKind {
    if field.is_list {
        return RelationKind::OneToMany;
    }

    let references_unique = field.relation.as_ref().is_some_and(|r| {
        r.references
            .iter()
            .any(|name| target.field(name).is_some_and(|f| f.is_unique))
    });

    if field.is_unique || references_unique {
        RelationKind::OneToOne
    } else {
        RelationKind::ManyToOne
    }
}
