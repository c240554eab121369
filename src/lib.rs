pub mod ast;
pub mod attributes;
pub mod crud;
pub mod graph;
pub mod lexer;
pub mod parser;
pub mod query;
pub mod summary;
pub mod types;

use wasm_bindgen::prelude::*;

use graph::ModelGraph;
use parser::parse_schema;
use query::{GenerationRequest, QueryGenerator};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn js_error(err: impl std::fmt::Display) -> js_sys::Error {
    js_sys::Error::new(&err.to_string())
}

/// Parse schema source into a JSON schema document
#[wasm_bindgen(js_name = "parseSchema")]
pub fn parse_schema_json(source: &str) -> Result<String, js_sys::Error> {
    let doc = parse_schema(source).map_err(js_error)?;
    serde_json::to_string(&doc).map_err(js_error)
}

/// Render a query snippet from a JSON generation request
#[wasm_bindgen(js_name = "generateQuery")]
pub fn generate_query_json(request: &str) -> Result<String, js_sys::Error> {
    let request = GenerationRequest::from_json(request).map_err(js_error)?;
    // Default primitives: enum-typed fields are routed to `include`.
    Ok(QueryGenerator::default().generate(&request))
}

/// Model nodes and relation edges as JSON
#[wasm_bindgen(js_name = "schemaGraph")]
pub fn schema_graph_json(source: &str) -> Result<String, js_sys::Error> {
    let doc = parse_schema(source).map_err(js_error)?;
    serde_json::to_string(&ModelGraph::from_document(&doc)).map_err(js_error)
}

/// CRUD helper module for one model of the schema
#[wasm_bindgen(js_name = "generateCrudModule")]
pub fn generate_crud_module(source: &str, model: &str) -> Result<String, js_sys::Error> {
    let doc = parse_schema(source).map_err(js_error)?;
    let model = doc
        .model(model)
        .ok_or_else(|| js_error(format!("Unknown model: {model}")))?;
    Ok(crud::crud_module(model, "prisma"))
}
