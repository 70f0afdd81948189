//! Verbatim function and class source carried as a value.
//!
//! The body is never parsed or evaluated: a [`CallableLiteral`] only checks
//! that its text is shaped like a function or class expression and then
//! holds on to it byte for byte, so emitting it again reproduces exactly what
//! was read.

use crate::error::SchemaError;
use crate::lexer::is_identifier_part;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallableKind {
    /// `function (...) { ... }`, including `async function` and generators.
    Function,
    /// `class Name { ... }`, with or without a name or `extends` clause.
    Class,
}

impl fmt::Display for CallableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallableKind::Function => write!(f, "function"),
            CallableKind::Class => write!(f, "class"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallableLiteral {
    text: String,
    kind: CallableKind,
}

impl CallableLiteral {
    /// Wraps `text` after checking that it starts with a function or class
    /// introducer and ends with the closing brace of its body.
    pub fn new(text: impl Into<String>) -> Result<Self, SchemaError> {
        let text = text.into();
        let kind = Self::classify(&text).ok_or_else(|| SchemaError::InvalidCallable {
            reason: format!(
                "`{}` does not start with `function`, `async function` or `class`",
                preview(&text)
            ),
        })?;
        let trimmed = text.trim();
        if !trimmed.ends_with('}') || !trimmed.contains('{') {
            return Err(SchemaError::InvalidCallable {
                reason: format!("`{}` has no braced body", preview(&text)),
            });
        }
        Ok(Self { text, kind })
    }

    /// Detects the introducer keyword, ignoring leading whitespace.
    pub fn classify(text: &str) -> Option<CallableKind> {
        let text = text.trim_start();
        if let Some(rest) = strip_keyword(text, "async") {
            return strip_keyword(rest.trim_start(), "function").map(|_| CallableKind::Function);
        }
        if strip_keyword(text, "function").is_some() {
            return Some(CallableKind::Function);
        }
        if strip_keyword(text, "class").is_some() {
            return Some(CallableKind::Class);
        }
        None
    }

    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    /// The stored source text, unmodified.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Strips `keyword` from the front of `text` when it is followed by a
/// character that cannot continue an identifier.
fn strip_keyword<'t>(text: &'t str, keyword: &str) -> Option<&'t str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        Some(c) if is_identifier_part(c) => None,
        _ => Some(rest),
    }
}

fn preview(text: &str) -> String {
    let line = text.trim().lines().next().unwrap_or_default();
    if line.chars().count() > 40 {
        let cut: String = line.chars().take(40).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

impl PartialEq for CallableLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.text.trim() == other.text.trim()
    }
}

impl Eq for CallableLiteral {}

impl fmt::Display for CallableLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for CallableLiteral {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
