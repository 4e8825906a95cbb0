//! Declarative markup binding.
//!
//! Nodes carrying the markup attribute (`data-ui` by default) declare a
//! component as `key:value;key2:value2`. The first `:` of a declaration
//! separates key from value, so values may contain `:` themselves
//! (`href:http://x`). Empty declarations (`a:1;;b:2;`) are ignored.
//!
//! [`crate::Runtime::init`] walks a subtree, parses each declaration block
//! and constructs and renders the declared components in document order.

pub mod binder;
pub mod lexer;

use logos::Logos;

use lexer::Token;
use crate::surface::NodeId;

pub use binder::{InitOptions, ValueReplacer};

/// Markup errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkupError {
    #[error("declaration \"{0}\" has no ':' separator")]
    MissingSeparator(String),

    #[error("declaration \"{0}\" has an empty key")]
    EmptyKey(String),

    #[error("unreadable markup at offset {0}")]
    Invalid(usize),

    #[error("markup on node {node:?} does not name a widget type")]
    MissingType { node: NodeId },
}

#[derive(Default)]
struct Declaration {
    key: String,
    value: String,
    separated: bool,
    raw: String,
}

impl Declaration {
    fn push(&mut self, token: Token, text: &str) {
        self.raw.push_str(text);
        match token {
            Token::Colon if !self.separated => self.separated = true,
            _ if self.separated => self.value.push_str(text),
            _ => self.key.push_str(text),
        }
    }

    fn finish(self) -> Result<Option<(String, String)>, MarkupError> {
        if self.raw.trim().is_empty() {
            return Ok(None);
        }
        if !self.separated {
            return Err(MarkupError::MissingSeparator(self.raw.trim().to_owned()));
        }
        let key = self.key.trim();
        if key.is_empty() {
            return Err(MarkupError::EmptyKey(self.raw.trim().to_owned()));
        }
        Ok(Some((key.to_owned(), self.value.trim().to_owned())))
    }
}

/// Parse a declaration block into ordered `(key, value)` pairs, trimmed.
pub fn parse_declarations(input: &str) -> Result<Vec<(String, String)>, MarkupError> {
    let mut lexer = Token::lexer(input);
    let mut declarations = Vec::new();
    let mut current = Declaration::default();

    while let Some(token) = lexer.next() {
        let token = token.map_err(|()| MarkupError::Invalid(lexer.span().start))?;
        if token == Token::Semicolon {
            if let Some(pair) = std::mem::take(&mut current).finish()? {
                declarations.push(pair);
            }
            continue;
        }
        current.push(token, lexer.slice());
    }
    if let Some(pair) = current.finish()? {
        declarations.push(pair);
    }
    Ok(declarations)
}

/// `data-ui-child-name` style suffix → `childName`.
pub(crate) fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
