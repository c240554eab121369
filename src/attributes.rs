//! Extraction of `@attribute(args)` spans from declaration text.
//!
//! Attributes are collected into a map keyed by their marker (`@id`,
//! `@default`, `@@map`, ...), so lookups do not depend on the order in which
//! they were written.

use crate::lexer::{LexError, Lexer, Token};
use indexmap::IndexMap;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Name without the leading `@`/`@@`, e.g. `default` or `db.VarChar`
    pub name: String,
    /// Raw text between the parentheses, if any
    pub args: Option<String>,
    /// Declared with `@@`
    pub block: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    items: IndexMap<String, Attribute>,
}

impl Attributes {
    /// Look up by marker, e.g. `"@id"` or `"@@map"`.
    pub fn get(&self, marker: &str) -> Option<&Attribute> {
        self.items.get(marker)
    }

    pub fn has(&self, marker: &str) -> bool {
        self.items.contains_key(marker)
    }

    pub fn args(&self, marker: &str) -> Option<&str> {
        self.get(marker).and_then(|a| a.args.as_deref())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.values()
    }

    fn insert(&mut self, attr: Attribute) {
        let marker = format!("{}{}", if attr.block { "@@" } else { "@" }, attr.name);
        self.items.entry(marker).or_insert(attr);
    }
}

/// Scan `text` for attribute spans. Quoted strings outside attributes are
/// skipped and a `//` comment ends the scan.
pub fn scan_attributes(text: &str) -> Attributes {
    let mut scanner = Scanner {
        text,
        chars: text.char_indices().peekable(),
    };
    let mut attrs = Attributes::default();

    while let Some((i, c)) = scanner.chars.next() {
        match c {
            '"' => scanner.skip_string(),
            '/' if text[i..].starts_with("//") => break,
            '@' => {
                let block = scanner.eat('@');
                let name = scanner.read_name();
                if name.is_empty() {
                    continue;
                }
                let args = if scanner.eat('(') {
                    Some(scanner.read_balanced().to_string())
                } else {
                    None
                };
                attrs.insert(Attribute { name, args, block });
            }
            _ => {}
        }
    }

    attrs
}

struct Scanner<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Scanner<'a> {
    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek().map(|&(_, c)| c) == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        name
    }

    fn skip_string(&mut self) {
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => {
                    self.chars.next();
                }
                '"' => break,
                _ => {}
            }
        }
    }

    /// Text up to the parenthesis closing the one just consumed. An
    /// unbalanced list runs to the end of the text.
    fn read_balanced(&mut self) -> &'a str {
        let text = self.text;
        let start = self
            .chars
            .peek()
            .map_or(text.len(), |&(i, _)| i);
        let mut depth = 1usize;

        while let Some((i, c)) = self.chars.next() {
            match c {
                '"' => self.skip_string(),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return &text[start..i];
                    }
                }
                _ => {}
            }
        }

        &text[start..]
    }
}

/// One argument of an attribute: `value` or `name: value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: ArgValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Ident(String),
    Num(String),
    List(Vec<String>),
    /// Function calls and anything else not inspected further
    Other,
}

/// Split an attribute argument list into top-level arguments.
pub fn parse_arguments(args: &str) -> Result<Vec<Argument>, LexError> {
    let tokens = Lexer::new(args).tokenize()?;
    Ok(ArgParser { tokens, pos: 0 }.parse())
}

/// Named argument, falling back to the first positional one when `name`
/// may also be given positionally.
pub fn find_argument<'a>(args: &'a [Argument], name: &str, positional: bool) -> Option<&'a ArgValue> {
    args.iter()
        .find(|a| a.name.as_deref() == Some(name))
        .or_else(|| {
            if positional {
                args.iter().find(|a| a.name.is_none())
            } else {
                None
            }
        })
        .map(|a| &a.value)
}

struct ArgParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ArgParser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        self.pos += 1;
        tok
    }

    fn parse(&mut self) -> Vec<Argument> {
        let mut args = Vec::new();

        while *self.peek() != Token::Eof {
            if *self.peek() == Token::Comma {
                self.advance();
                continue;
            }

            let name = match self.peek() {
                Token::Ident(name) if *self.peek_at(1) == Token::Colon => {
                    let name = name.clone();
                    self.pos += 2;
                    Some(name)
                }
                _ => None,
            };

            let value = self.parse_value();
            args.push(Argument { name, value });
        }

        args
    }

    fn parse_value(&mut self) -> ArgValue {
        let value = match self.advance() {
            Token::Str(s) => ArgValue::Str(s),
            Token::Num(n) => ArgValue::Num(n),
            Token::Ident(mut s) => {
                while *self.peek() == Token::Dot {
                    self.advance();
                    if let Token::Ident(part) = self.advance() {
                        s.push('.');
                        s.push_str(&part);
                    }
                }
                if *self.peek() == Token::LParen {
                    self.skip_group();
                    ArgValue::Other
                } else {
                    ArgValue::Ident(s)
                }
            }
            Token::LBracket => ArgValue::List(self.parse_list()),
            Token::LParen => {
                self.pos -= 1;
                self.skip_group();
                ArgValue::Other
            }
            _ => ArgValue::Other,
        };

        // Ignore whatever trails the value up to the next argument
        while !matches!(self.peek(), Token::Comma | Token::Eof) {
            self.advance();
        }

        value
    }

    /// Identifiers directly inside `[...]`; nested groups are skipped.
    fn parse_list(&mut self) -> Vec<String> {
        let mut items = Vec::new();
        loop {
            match self.peek().clone() {
                Token::RBracket => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                Token::Ident(s) => {
                    self.advance();
                    items.push(s);
                }
                Token::LParen | Token::LBracket => self.skip_group(),
                _ => {
                    self.advance();
                }
            }
        }
        items
    }

    fn skip_group(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Token::LParen | Token::LBracket => depth += 1,
                Token::RParen | Token::RBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                Token::Eof => {
                    self.pos -= 1;
                    break;
                }
                _ => {}
            }
        }
    }
}
