//! Line-oriented parser for `.prisma` schema text.
//!
//! Model and enum blocks are located by brace scanning (a block ends at its
//! first closing brace), then their interior lines are read one at a time.
//! Lines that do not look like field declarations are skipped.

use crate::ast::{Datasource, Enum, Field, Model, Relation, SchemaDocument};
use crate::attributes::{find_argument, parse_arguments, scan_attributes, ArgValue};
use crate::types::PrimitiveTypes;
use std::fmt;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Model,
    Enum,
}

impl BlockKind {
    fn keyword(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid {kind} definition: {header:?}")]
    MalformedBlock { kind: BlockKind, header: String },
}

#[derive(Debug, Clone, Default)]
pub struct SchemaParser {
    primitives: PrimitiveTypes,
}

impl SchemaParser {
    pub fn new(primitives: PrimitiveTypes) -> Self {
        Self { primitives }
    }

    /// Parse one field declaration line. Returns `None` for anything that
    /// does not start with a name followed by a type.
    pub fn parse_field(&self, line: &str) -> Option<Field> {
        let rest = line.trim_start();
        let (name, rest) = split_ident(rest)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let (typ, rest) = split_ident(rest.trim_start())?;

        let (is_list, rest) = match rest.strip_prefix("[]") {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let rest = rest.trim_start();
        let (is_optional, rest) = match rest.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };

        let attrs = scan_attributes(rest);
        let is_id = attrs.has("@id");
        let mut relation = attrs
            .get("@relation")
            .map(|attr| parse_relation(attr.args.as_deref().unwrap_or_default()));

        if relation.is_none() && !is_id && !self.primitives.contains(typ) {
            relation = Some(Relation::default());
        }

        Some(Field {
            name: name.to_string(),
            typ: typ.to_string(),
            is_required: !is_optional,
            is_list,
            is_id,
            is_unique: attrs.has("@unique"),
            default: attrs.args("@default").map(str::to_string),
            relation,
        })
    }

    /// Parse a model block, braces included.
    pub fn parse_model(&self, block: &str) -> Result<Model, ParseError> {
        let lines: Vec<&str> = block.lines().collect();
        let header = lines.first().copied().unwrap_or_default();
        let name = block_name(header, BlockKind::Model).ok_or_else(|| ParseError::MalformedBlock {
            kind: BlockKind::Model,
            header: header.trim().to_string(),
        })?;

        let mut model = Model::new(name);

        for line in interior(&lines) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("@@") {
                if model.db_name.is_none() {
                    model.db_name = table_name(line);
                }
                continue;
            }
            match self.parse_field(line) {
                Some(field) => model.fields.push(field),
                None => trace!(model = %model.name, line, "skipping non-field line"),
            }
        }

        Ok(model)
    }

    /// Parse an enum block, braces included.
    pub fn parse_enum(&self, block: &str) -> Result<Enum, ParseError> {
        let lines: Vec<&str> = block.lines().collect();
        let header = lines.first().copied().unwrap_or_default();
        let name = block_name(header, BlockKind::Enum).ok_or_else(|| ParseError::MalformedBlock {
            kind: BlockKind::Enum,
            header: header.trim().to_string(),
        })?;

        let values = interior(&lines)
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Enum {
            name: name.to_string(),
            values,
        })
    }

    pub fn parse(&self, text: &str) -> Result<SchemaDocument, ParseError> {
        let models = extract_blocks(text, BlockKind::Model)
            .into_iter()
            .map(|block| self.parse_model(block))
            .collect::<Result<Vec<_>, _>>()?;

        let enums = extract_blocks(text, BlockKind::Enum)
            .into_iter()
            .map(|block| self.parse_enum(block))
            .collect::<Result<Vec<_>, _>>()?;

        let datasource = find_provider(text)
            .map(|provider| Datasource {
                provider: provider.to_string(),
            })
            .unwrap_or_default();

        debug!(
            models = models.len(),
            enums = enums.len(),
            provider = %datasource.provider,
            "parsed schema"
        );

        Ok(SchemaDocument {
            models,
            enums,
            datasource,
        })
    }
}

pub fn parse_field(line: &str) -> Option<Field> {
    SchemaParser::default().parse_field(line)
}

pub fn parse_model(block: &str) -> Result<Model, ParseError> {
    SchemaParser::default().parse_model(block)
}

pub fn parse_schema(text: &str) -> Result<SchemaDocument, ParseError> {
    SchemaParser::default().parse(text)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Leading identifier of `s` and the remainder.
fn split_ident(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    if end == 0 {
        None
    } else {
        Some(s.split_at(end))
    }
}

/// Lines between the header line and the closing line.
fn interior<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    if lines.len() > 2 {
        &lines[1..lines.len() - 1]
    } else {
        &[]
    }
}

/// Name from a header line of the form `<keyword> <Name> {`.
fn block_name(header: &str, kind: BlockKind) -> Option<&str> {
    let rest = header.trim_start().strip_prefix(kind.keyword())?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, rest) = split_ident(rest.trim_start())?;
    rest.trim_start().starts_with('{').then_some(name)
}

/// Argument of a `@@map("...")` line.
fn table_name(line: &str) -> Option<String> {
    let attrs = scan_attributes(line);
    let args = parse_arguments(attrs.args("@@map")?).ok()?;
    match find_argument(&args, "name", true)? {
        ArgValue::Str(name) => Some(name.clone()),
        _ => None,
    }
}

fn parse_relation(args: &str) -> Relation {
    let args = match parse_arguments(args) {
        Ok(args) => args,
        Err(err) => {
            trace!(%err, "unreadable relation arguments");
            return Relation::default();
        }
    };

    let list = |name| match find_argument(&args, name, false) {
        Some(ArgValue::List(items)) => items.clone(),
        _ => Vec::new(),
    };
    let action = |name| match find_argument(&args, name, false) {
        Some(ArgValue::Ident(action)) => Some(action.clone()),
        _ => None,
    };

    Relation {
        name: match find_argument(&args, "name", true) {
            Some(ArgValue::Str(name)) => Some(name.clone()),
            _ => None,
        },
        fields: list("fields"),
        references: list("references"),
        on_delete: action("onDelete"),
        on_update: action("onUpdate"),
    }
}

/// Every `<keyword> <header> { ... }` block, in source order. The keyword
/// must open its line and the header may only hold identifier characters and
/// whitespace; the block closes at the first `}`.
fn extract_blocks(text: &str, kind: BlockKind) -> Vec<&str> {
    let keyword = kind.keyword();
    let mut blocks = Vec::new();
    let mut resume = 0;

    for (start, _) in text.match_indices(keyword) {
        if start < resume {
            continue;
        }

        let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
        if !text[line_start..start].trim().is_empty() {
            continue;
        }

        let after = &text[start + keyword.len()..];
        if after.starts_with(is_ident_char) {
            continue;
        }

        let Some(open) = after.find(|c: char| !(is_ident_char(c) || c.is_whitespace())) else {
            continue;
        };
        if !after[open..].starts_with('{') {
            continue;
        }
        let Some(close) = after[open..].find('}') else {
            continue;
        };

        let end = start + keyword.len() + open + close + 1;
        blocks.push(&text[start..end]);
        resume = end;
    }

    blocks
}

/// Value of the first `provider = "..."` assignment.
fn find_provider(text: &str) -> Option<&str> {
    text.match_indices("provider").find_map(|(start, key)| {
        let rest = text[start + key.len()..].trim_start();
        let rest = rest.strip_prefix('=')?.trim_start();
        let rest = rest.strip_prefix('"')?;
        let end = rest.find('"')?;
        (end > 0).then(|| &rest[..end])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOG: &str = r#"
datasource db {
  provider = "mysql"
  url      = env("DATABASE_URL")
}

model User {
  id        Int      @id @default(autoincrement())
  email     String   @unique
  name      String?
  role      Role     @default(USER)
  posts     Post[]
  profile   Profile?
  createdAt DateTime @default(now())

  @@map("users")
}

model Post {
  id       Int    @id @default(autoincrement())
  title    String
  author   User   @relation("UserPosts", fields: [authorId], references: [id], onDelete: Cascade, onUpdate: NoAction)
  authorId Int
}

enum Role {
  USER
  ADMIN
}
"#;

    #[test]
    fn test_parse_field_plain() {
        let field = parse_field("name String").unwrap();
        assert_eq!(field.name, "name");
        assert_eq!(field.typ, "String");
        assert!(field.is_required);
        assert!(!field.is_list);
        assert!(!field.is_id);
        assert!(!field.is_unique);
        assert_eq!(field.default, None);
        assert_eq!(field.relation, None);
    }

    #[test]
    fn test_parse_field_markers() {
        let field = parse_field("  tags String[]").unwrap();
        assert!(field.is_list);
        assert!(field.is_required);

        let field = parse_field("bio String? @db.Text").unwrap();
        assert!(!field.is_required);
        assert!(!field.is_list);
    }

    #[test]
    fn test_parse_field_attributes_any_order() {
        let a = parse_field("id Int @id @unique @default(autoincrement())").unwrap();
        let b = parse_field("id Int @default(autoincrement()) @unique @id").unwrap();
        assert_eq!(a, b);
        assert!(a.is_id);
        assert!(a.is_unique);
        assert_eq!(a.default.as_deref(), Some("autoincrement()"));
    }

    #[test]
    fn test_parse_field_default_verbatim() {
        let field = parse_field(r#"slug String @default("hello world")"#).unwrap();
        assert_eq!(field.default.as_deref(), Some(r#""hello world""#));

        let field = parse_field("id String @id @default(uuid())").unwrap();
        assert_eq!(field.default.as_deref(), Some("uuid()"));
    }

    #[test]
    fn test_parse_field_relation() {
        let field = parse_field(
            r#"author User @relation("UserPosts", fields: [authorId], references: [id], onDelete: Cascade, onUpdate: NoAction)"#,
        )
        .unwrap();
        let relation = field.relation.unwrap();
        assert_eq!(relation.name.as_deref(), Some("UserPosts"));
        assert_eq!(relation.fields, vec!["authorId"]);
        assert_eq!(relation.references, vec!["id"]);
        assert_eq!(relation.on_delete.as_deref(), Some("Cascade"));
        assert_eq!(relation.on_update.as_deref(), Some("NoAction"));
    }

    #[test]
    fn test_parse_field_named_relation_and_composite_keys() {
        let field = parse_field(
            r#"owner Account @relation(name: "Owner", fields: [ownerId, tenantId], references: [id, tenantId])"#,
        )
        .unwrap();
        let relation = field.relation.unwrap();
        assert_eq!(relation.name.as_deref(), Some("Owner"));
        assert_eq!(relation.fields, vec!["ownerId", "tenantId"]);
        assert_eq!(relation.references, vec!["id", "tenantId"]);
        assert_eq!(relation.on_delete, None);
    }

    #[test]
    fn test_parse_field_implicit_relation() {
        let field = parse_field("posts Post[]").unwrap();
        let relation = field.relation.unwrap();
        assert!(relation.fields.is_empty());
        assert!(relation.references.is_empty());

        let field = parse_field("profile Profile?").unwrap();
        assert!(field.relation.is_some());
    }

    #[test]
    fn test_parse_field_non_primitive_id_has_no_relation() {
        let field = parse_field("id Uuid @id").unwrap();
        assert!(field.is_id);
        assert_eq!(field.relation, None);
    }

    #[test]
    fn test_parse_field_custom_primitives() {
        let parser = SchemaParser::new(PrimitiveTypes::default().with_type("Role"));
        let field = parser.parse_field("role Role @default(USER)").unwrap();
        assert_eq!(field.relation, None);
        assert_eq!(field.default.as_deref(), Some("USER"));
    }

    #[test]
    fn test_parse_field_rejects_non_fields() {
        assert_eq!(parse_field(""), None);
        assert_eq!(parse_field("}"), None);
        assert_eq!(parse_field("// just a comment"), None);
        assert_eq!(parse_field("loneword"), None);
        assert_eq!(parse_field(r#"provider = "sqlite""#), None);
    }

    #[test]
    fn test_parse_model() {
        let block = "model Account {\n  id Int @id\n  owner String\n  @@map(\"accounts\")\n  @@index([owner])\n}";
        let model = parse_model(block).unwrap();
        assert_eq!(model.name, "Account");
        assert_eq!(model.db_name.as_deref(), Some("accounts"));
        let names: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "owner"]);
    }

    #[test]
    fn test_parse_model_missing_name() {
        let err = parse_model("model {\n  id Int @id\n}").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedBlock {
                kind: BlockKind::Model,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_schema() {
        let doc = parse_schema(BLOG).unwrap();
        assert_eq!(doc.datasource.provider, "mysql");
        assert_eq!(doc.models.len(), 2);
        assert_eq!(doc.enums.len(), 1);

        let user = doc.model("User").unwrap();
        assert_eq!(user.db_name.as_deref(), Some("users"));
        assert_eq!(user.fields.len(), 7);
        assert!(user.field("posts").unwrap().is_list);
        assert!(user.field("role").unwrap().relation.is_some());

        let post = doc.model("Post").unwrap();
        assert_eq!(post.db_name, None);
        let author = post.field("author").unwrap();
        assert_eq!(author.relation.as_ref().unwrap().fields, vec!["authorId"]);

        assert_eq!(doc.enums[0].name, "Role");
        assert_eq!(doc.enums[0].values, vec!["USER", "ADMIN"]);
    }

    #[test]
    fn test_parse_schema_empty() {
        for input in ["", "   \n\n", "generator client {\n  output = \"./x\"\n}"] {
            let doc = parse_schema(input).unwrap();
            assert!(doc.models.is_empty());
            assert!(doc.enums.is_empty());
            assert_eq!(doc.datasource.provider, "postgresql");
        }
    }

    #[test]
    fn test_parse_schema_first_provider_wins() {
        let input = "generator client {\n  provider = \"prisma-client-js\"\n}\ndatasource db {\n  provider = \"sqlite\"\n}";
        let doc = parse_schema(input).unwrap();
        assert_eq!(doc.datasource.provider, "prisma-client-js");
    }

    #[test]
    fn test_parse_schema_malformed_model() {
        let err = parse_schema("model User\n{\n  id Int @id\n}").unwrap_err();
        assert_eq!(err.to_string(), r#"Invalid model definition: "model User""#);
    }

    #[test]
    fn test_parse_schema_malformed_enum() {
        let err = parse_schema("enum {\n  A\n}").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedBlock {
                kind: BlockKind::Enum,
                ..
            }
        ));
    }

    #[test]
    fn test_extract_blocks_requires_line_start() {
        let input = "// the model Foo { is documented }\nmodel Bar {\n  id Int @id\n}\nmodelling stuff";
        let doc = parse_schema(input).unwrap();
        assert_eq!(doc.models.len(), 1);
        assert_eq!(doc.models[0].name, "Bar");
    }

    #[test]
    fn test_extract_blocks_ends_at_first_brace() {
        let input = "model A {\n  id Int @id\n}\nmodel B {\n  id Int @id\n  a A\n}";
        let doc = parse_schema(input).unwrap();
        assert_eq!(doc.models.len(), 2);
        assert_eq!(doc.models[1].fields.len(), 2);
    }

    #[test]
    fn test_enum_values_skip_blank_lines() {
        let input = "enum Status {\n\n  DRAFT\n\n  PUBLISHED\n}";
        let doc = parse_schema(input).unwrap();
        assert_eq!(doc.enums[0].values, vec!["DRAFT", "PUBLISHED"]);
    }
}
