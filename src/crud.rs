//! Whole-model code: client setup, selection interfaces and CRUD modules.

use crate::ast::Model;

pub fn client_setup(client: &str) -> String {
    format!("import {{ PrismaClient }} from '@prisma/client';\n\nconst {client} = new PrismaClient();")
}

/// `interface <Model>Data` covering the selected fields, in model order.
/// Fields that are optional or carry a default are marked `?`.
pub fn type_definition(model: &Model, selected: &[String]) -> String {
    let fields: Vec<String> = model
        .fields
        .iter()
        .filter(|f| selected.contains(&f.name))
        .map(|f| {
            let optional = if !f.is_required || f.default.is_some() { "?" } else { "" };
            let list = if f.is_list { "[]" } else { "" };
            format!("  {}{optional}: {}{list};", f.name, f.typ)
        })
        .collect();

    format!("interface {}Data {{\n{}\n}}", model.name, fields.join("\n"))
}

/// Module with create/get/update/delete helpers for one model.
pub fn crud_module(model: &Model, client: &str) -> String {
    let name = &model.name;
    let root = model.root_name();

    format!(
        r#"{setup}

export async function create{name}(data: any) {{
  return await {client}.{root}.create({{ data }});
}}

export async function get{name}s() {{
  return await {client}.{root}.findMany();
}}

export async function update{name}(id: number, data: any) {{
  return await {client}.{root}.update({{
    where: {{ id }},
    data,
  }});
}}

export async function delete{name}(id: number) {{
  return await {client}.{root}.delete({{
    where: {{ id }},
  }});
}}
"#,
        setup = client_setup(client),
    )
}

/// File name used when writing [`crud_module`] output.
pub fn crud_file_name(model: &Model) -> String {
    format!("{}CRUD.ts", model.name)
}
