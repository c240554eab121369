//! Plain-text model cards for terminal output.

use crate::ast::{Field, Model, SchemaDocument};
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

const COLUMN_GAP: usize = 2;

/// Display width in terminal columns; wide characters count as two.
pub fn text_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn pad(out: &mut String, text: &str, width: usize) {
    out.push_str(text);
    let fill = width.saturating_sub(text_width(text)) + COLUMN_GAP;
    out.extend(std::iter::repeat_n(' ', fill));
}

fn badges(field: &Field) -> Vec<&'static str> {
    let mut badges = Vec::new();
    if field.is_id {
        badges.push("ID");
    }
    if field.is_unique {
        badges.push("Unique");
    }
    if field.relation.is_some() {
        badges.push("Relation");
    }
    badges
}

pub fn render_model(out: &mut String, model: &Model) {
    out.push_str("model ");
    out.push_str(&model.name);
    if let Some(db_name) = &model.db_name {
        write!(out, " → {db_name}").ok();
    }
    out.push('\n');

    let types: Vec<String> = model.fields.iter().map(Field::display_type).collect();
    let name_width = model
        .fields
        .iter()
        .map(|f| text_width(&f.name))
        .max()
        .unwrap_or(0);
    let type_width = types.iter().map(|t| text_width(t)).max().unwrap_or(0);

    for (field, typ) in model.fields.iter().zip(&types) {
        let mut line = String::from("  ");
        pad(&mut line, &field.name, name_width);
        pad(&mut line, typ, type_width);
        line.push_str(&badges(field).join(" "));
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

pub fn render_summary(doc: &SchemaDocument) -> String {
    let mut out = String::new();
    writeln!(out, "datasource: {}", doc.datasource.provider).ok();

    for model in &doc.models {
        out.push('\n');
        render_model(&mut out, model);
    }

    for e in &doc.enums {
        out.push('\n');
        writeln!(out, "enum {}", e.name).ok();
        for value in &e.values {
            writeln!(out, "  {value}").ok();
        }
    }

    out
}
