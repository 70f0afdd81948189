//! Prints [`Value`]s as JavaScript object-literal text.
//!
//! Keys are written bare when they are identifiers and quoted otherwise.
//! Callables are written exactly as stored. Key order is the map's order,
//! which for marshalled objects is the schema's declared order.

use crate::lexer::is_identifier;
use crate::value::Value;
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    #[default]
    Single,
    Double,
}

impl QuoteStyle {
    fn char(self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

/// Layout settings for emitted text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Spaces per nesting level in pretty output.
    pub indent: usize,
    pub quote: QuoteStyle,
    /// Write a comma after the last member of multi-line objects and arrays.
    pub trailing_commas: bool,
    /// Write everything on one line.
    pub compact: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            quote: QuoteStyle::Single,
            trailing_commas: false,
            compact: false,
        }
    }
}

impl EmitOptions {
    pub fn compact() -> Self {
        Self {
            compact: true,
            ..Self::default()
        }
    }
}

/// Emits `value` as literal notation.
pub fn emit(value: &Value, options: &EmitOptions) -> String {
    let mut emitter = Emitter::new(options);
    emitter.write_value(value, 0);
    emitter.out
}

/// Emits `value` wrapped in a variable declaration, e.g.
/// `const options = { ... };`.
pub fn emit_declaration(keyword: &str, name: &str, value: &Value, options: &EmitOptions) -> String {
    format!("{keyword} {name} = {};", emit(value, options))
}

/// Quotes and escapes `s` for use as a string literal.
pub fn quote_string(s: &str, quote: QuoteStyle) -> String {
    let q = quote.char();
    let mut out = String::with_capacity(s.len() + 2);
    out.push(q);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c == q => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(q);
    out
}

/// Formats a number the way JavaScript source would spell it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

struct Emitter<'o> {
    options: &'o EmitOptions,
    out: String,
}

impl<'o> Emitter<'o> {
    fn new(options: &'o EmitOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    fn write_value(&mut self, value: &Value, level: usize) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => self.out.push_str(&format_number(*n)),
            Value::String(s) => self.out.push_str(&quote_string(s, self.options.quote)),
            Value::Callable(callable) => self.out.push_str(callable.as_str()),
            Value::Identifier(name) => self.out.push_str(name),
            Value::Array(items) => self.write_array(items, level),
            Value::Object(map) => {
                if map.is_empty() {
                    self.out.push_str("{}");
                    return;
                }
                self.out.push('{');
                let last = map.len() - 1;
                for (index, (key, item)) in map.iter().enumerate() {
                    self.open_member(index, level);
                    self.write_key(key);
                    self.out.push_str(": ");
                    self.write_value(item, level + 1);
                    self.close_member(index == last);
                }
                self.close_container('}', level);
            }
        }
    }

    fn write_array(&mut self, items: &[Value], level: usize) {
        if items.is_empty() {
            self.out.push_str("[]");
            return;
        }
        let inline = self.options.compact || items.iter().all(is_scalar);
        if inline {
            self.out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    self.out.push_str(", ");
                }
                self.write_value(item, level + 1);
            }
            self.out.push(']');
            return;
        }
        self.out.push('[');
        let last = items.len() - 1;
        for (index, item) in items.iter().enumerate() {
            self.open_member(index, level);
            self.write_value(item, level + 1);
            self.close_member(index == last);
        }
        self.close_container(']', level);
    }

    fn open_member(&mut self, index: usize, level: usize) {
        if self.options.compact {
            if index > 0 {
                self.out.push(' ');
            }
            return;
        }
        self.out.push('\n');
        self.push_indent(level + 1);
    }

    fn close_member(&mut self, is_last: bool) {
        if !is_last || (self.options.trailing_commas && !self.options.compact) {
            self.out.push(',');
        }
    }

    fn close_container(&mut self, close: char, level: usize) {
        if !self.options.compact {
            self.out.push('\n');
            self.push_indent(level);
        }
        self.out.push(close);
    }

    fn push_indent(&mut self, level: usize) {
        for _ in 0..level * self.options.indent {
            self.out.push(' ');
        }
    }

    fn write_key(&mut self, key: &str) {
        if is_identifier(key) {
            self.out.push_str(key);
        } else {
            self.out.push_str(&quote_string(key, self.options.quote));
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_) | Value::Callable(_))
}
