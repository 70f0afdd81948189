pub mod api;
pub mod ast;
pub mod callable;
pub mod catalog;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod marshal;
pub mod object;
pub mod parser;
pub mod schema;
pub mod validators;
pub mod value;

pub use api::{parse_literal, parse_literal_with, Document};
pub use callable::{CallableKind, CallableLiteral};
pub use emitter::{EmitOptions, QuoteStyle};
pub use error::{OptreeError, Result};
pub use marshal::Marshaller;
pub use object::{AttrValue, ConfigObject};
pub use parser::ParseOptions;
pub use schema::{Registry, Schema, SchemaEntry};
pub use validators::{EnforcedNull, Validator};
pub use value::Value;
