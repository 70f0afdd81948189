use crate::callable::CallableLiteral;
use crate::emitter::format_number;
use crate::error::ParserError;
use crate::lexer::{Lexer, Token, TokenType};
use crate::value::{Map, Value};
use miette::NamedSource;
use serde::Deserialize;
use std::sync::Arc;

/// Limits and switches for [`Parser`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Deepest allowed nesting of objects, arrays and callable brackets.
    pub max_depth: usize,
    /// Reject input that is not wrapped in `const|let|var name = ...`.
    pub require_declaration: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: 128,
            require_declaration: false,
        }
    }
}

/// The `const name =` wrapper around a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub keyword: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralDocument {
    pub declaration: Option<Declaration>,
    pub root: Value,
}

const DECLARATION_KEYWORDS: [&str; 3] = ["const", "let", "var"];

/// A recursive descent parser for object-literal notation.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    tokens: Vec<Token>,
    position: usize,
    source_text: &'a str,
    options: ParseOptions,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "literal.js".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        let source = Arc::new(NamedSource::new(name, source_text.to_string()));
        let mut lexer = Lexer::new(source_text);
        let tokens: Vec<Token> = lexer
            .lex()
            .into_iter()
            .filter(|t| !matches!(t.ttype, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();

        Self {
            source,
            tokens,
            position: 0,
            source_text,
            options: ParseOptions::default(),
            depth: 0,
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    // === Main Parsing Methods ===

    /// Document ::= [ Declaration ] Value [ ";" ] EOF
    pub fn parse_document(&mut self) -> Result<LiteralDocument, ParserError> {
        let declaration = self.parse_optional_declaration()?;
        if declaration.is_none() && self.options.require_declaration {
            let token = self.current_token()?;
            return Err(ParserError::VariableDeclaration {
                src: self.src(),
                span: (token.pos_start, token.pos_end - token.pos_start).into(),
                reason: "expected `const`, `let` or `var`".to_string(),
            });
        }

        let root = self.parse_value()?;
        self.match_token(TokenType::Semicolon);
        self.expect(TokenType::Eof)?;
        Ok(LiteralDocument { declaration, root })
    }

    /// Declaration ::= ( "const" | "let" | "var" ) Identifier "="
    fn parse_optional_declaration(&mut self) -> Result<Option<Declaration>, ParserError> {
        let start = self.current_token()?.clone();
        let keyword = match &start.ttype {
            TokenType::Identifier(word) if DECLARATION_KEYWORDS.contains(&word.as_str()) => {
                word.clone()
            }
            _ => return Ok(None),
        };
        self.advance();

        let name = match self.current_token()?.ttype.clone() {
            TokenType::Identifier(name) if !DECLARATION_KEYWORDS.contains(&name.as_str()) => name,
            _ => return Err(self.declaration_error(&start, "expected a variable name")),
        };
        self.advance();
        if !self.match_token(TokenType::Equals) {
            return Err(self.declaration_error(&start, "expected `=` after the variable name"));
        }

        log::debug!("Unwrapping `{keyword} {name}` declaration");
        Ok(Some(Declaration { keyword, name }))
    }

    /// Value ::= Object | Array | Callable | Reference | Literal
    fn parse_value(&mut self) -> Result<Value, ParserError> {
        let token = self.current_token()?.clone();
        match &token.ttype {
            TokenType::LBrace => self.parse_object(),
            TokenType::LBracket => self.parse_array(),
            TokenType::String(s) => {
                self.advance();
                Ok(Value::String(s.clone()))
            }
            TokenType::Template(raw) => {
                if raw.contains("${") {
                    return self.err_unexpected("a template string without `${...}` substitutions");
                }
                self.advance();
                Ok(Value::String(raw.clone()))
            }
            TokenType::Number(n) => {
                self.advance();
                Ok(Value::Number(*n))
            }
            TokenType::Minus => {
                self.advance();
                match self.current_token()?.ttype {
                    TokenType::Number(n) => {
                        self.advance();
                        Ok(Value::Number(-n))
                    }
                    _ => self.err_unexpected("a number after `-`"),
                }
            }
            TokenType::True => {
                self.advance();
                Ok(Value::Bool(true))
            }
            TokenType::False => {
                self.advance();
                Ok(Value::Bool(false))
            }
            TokenType::Null | TokenType::Undefined => {
                self.advance();
                Ok(Value::Null)
            }
            TokenType::Identifier(word) if self.starts_callable(word) => self.parse_callable(),
            TokenType::Identifier(_) => self.parse_reference(),
            TokenType::Unknown => Err(ParserError::InvalidToken {
                src: self.src(),
                span: (token.pos_start, token.pos_end - token.pos_start).into(),
            }),
            TokenType::Eof => Err(ParserError::UnexpectedEof {
                src: self.src(),
                span: (token.pos_start, 0).into(),
            }),
            _ => self.err_unexpected("a value"),
        }
    }

    /// Object ::= "{" [ MemberList ] "}"
    /// MemberList ::= Member { "," Member } [ "," ]
    /// Member ::= Key ":" Value
    ///
    /// Members whose value is `undefined` are left out; elsewhere `undefined`
    /// reads as `null`.
    fn parse_object(&mut self) -> Result<Value, ParserError> {
        let open = self.current_token()?.clone();
        self.expect(TokenType::LBrace)?;
        self.enter(&open)?;

        let mut map = Map::new();
        if !self.check(TokenType::RBrace) {
            loop {
                let key = self.parse_key()?;
                self.expect(TokenType::Colon)?;
                if self.match_token(TokenType::Undefined) {
                    // An `undefined` member is absent, as in `JSON.stringify`.
                    log::debug!("Dropping `{key}: undefined`");
                    map.shift_remove(&key);
                } else {
                    let value = self.parse_value()?;
                    map.insert(key, value);
                }

                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(TokenType::RBrace) {
                    break; // Allow trailing comma
                }
            }
        }
        self.expect(TokenType::RBrace)?;
        self.depth -= 1;
        Ok(Value::Object(map))
    }

    /// Array ::= "[" [ ValueList ] "]"
    /// ValueList ::= Value { "," Value } [ "," ]
    fn parse_array(&mut self) -> Result<Value, ParserError> {
        let open = self.current_token()?.clone();
        self.expect(TokenType::LBracket)?;
        self.enter(&open)?;

        let mut items = Vec::new();
        if !self.check(TokenType::RBracket) {
            loop {
                items.push(self.parse_value()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
                if self.check(TokenType::RBracket) {
                    break; // Allow trailing comma
                }
            }
        }
        self.expect(TokenType::RBracket)?;
        self.depth -= 1;
        Ok(Value::Array(items))
    }

    /// Key ::= Identifier | String | Number | Keyword
    fn parse_key(&mut self) -> Result<String, ParserError> {
        let key = match &self.current_token()?.ttype {
            TokenType::Identifier(s) | TokenType::String(s) => s.clone(),
            TokenType::Number(n) => format_number(*n),
            TokenType::True => "true".to_string(),
            TokenType::False => "false".to_string(),
            TokenType::Null => "null".to_string(),
            TokenType::Undefined => "undefined".to_string(),
            _ => return self.err_unexpected("a key"),
        };
        self.advance();
        Ok(key)
    }

    /// Reference ::= Identifier { "." Identifier }
    fn parse_reference(&mut self) -> Result<Value, ParserError> {
        let mut path = match &self.current_token()?.ttype {
            TokenType::Identifier(name) => name.clone(),
            _ => return self.err_unexpected("an identifier"),
        };
        self.advance();
        while self.check(TokenType::Dot) {
            self.advance();
            match &self.current_token()?.ttype {
                TokenType::Identifier(part) => {
                    path.push('.');
                    path.push_str(part);
                }
                _ => return self.err_unexpected("an identifier after `.`"),
            }
            self.advance();
        }
        Ok(Value::Identifier(path))
    }

    /// Callable ::= ( [ "async" ] "function" | "class" ) ... Body
    ///
    /// The tokens up to the brace that closes the body are not interpreted;
    /// they are only checked for balanced brackets. The value is the source
    /// text of the whole expression.
    fn parse_callable(&mut self) -> Result<Value, ParserError> {
        let start = self.current_token()?.clone();
        let kind = match &start.ttype {
            TokenType::Identifier(word) if word == "class" => "class",
            _ => "function",
        };
        let mut closers: Vec<TokenType> = Vec::new();
        let end = loop {
            let token = self.current_token()?.clone();
            match token.ttype {
                TokenType::Eof => return Err(self.unbalanced(&start, kind)),
                TokenType::LBrace | TokenType::LBracket | TokenType::LParen => {
                    if self.depth + closers.len() >= self.options.max_depth {
                        return Err(self.too_deep(&token));
                    }
                    closers.push(match token.ttype {
                        TokenType::LBrace => TokenType::RBrace,
                        TokenType::LBracket => TokenType::RBracket,
                        _ => TokenType::RParen,
                    });
                }
                TokenType::RBrace | TokenType::RBracket | TokenType::RParen => {
                    match closers.pop() {
                        Some(expected) if expected == token.ttype => {}
                        _ => return Err(self.unbalanced(&start, kind)),
                    }
                    if closers.is_empty() && token.ttype == TokenType::RBrace {
                        self.advance();
                        break token.pos_end;
                    }
                }
                _ => {}
            }
            self.advance();
        };

        let text = &self.source_text[start.pos_start..end];
        log::trace!("Captured {kind} literal spanning bytes {}..{end}", start.pos_start);
        CallableLiteral::new(text)
            .map(Value::Callable)
            .map_err(|err| ParserError::InvalidCallable {
                src: self.src(),
                span: (start.pos_start, end - start.pos_start).into(),
                reason: err.to_string(),
            })
    }

    fn starts_callable(&self, word: &str) -> bool {
        match word {
            "function" | "class" => true,
            "async" => matches!(
                self.tokens.get(self.position + 1).map(|t| &t.ttype),
                Some(TokenType::Identifier(next)) if next == "function"
            ),
            _ => false,
        }
    }

    // === Tokenizer Helper Methods ===

    fn src(&self) -> NamedSource<String> {
        (*self.source).clone()
    }

    fn current_token(&self) -> Result<&Token, ParserError> {
        self.tokens.get(self.position).ok_or_else(|| {
            let pos = self.source_text.len();
            ParserError::UnexpectedEof {
                src: self.src(),
                span: (pos, 0).into(),
            }
        })
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<(), ParserError> {
        let token = self.current_token()?.clone();
        if std::mem::discriminant(&token.ttype) == std::mem::discriminant(&expected) {
            self.advance();
            return Ok(());
        }
        match token.ttype {
            TokenType::Eof => Err(ParserError::UnexpectedEof {
                src: self.src(),
                span: (token.pos_start, 0).into(),
            }),
            TokenType::Unknown => Err(ParserError::InvalidToken {
                src: self.src(),
                span: (token.pos_start, token.pos_end - token.pos_start).into(),
            }),
            _ => self.err_unexpected(&describe(&expected)),
        }
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        if let Ok(token) = self.current_token() {
            std::mem::discriminant(&token.ttype) == std::mem::discriminant(&ttype)
        } else {
            false
        }
    }

    fn enter(&mut self, open: &Token) -> Result<(), ParserError> {
        if self.depth >= self.options.max_depth {
            return Err(self.too_deep(open));
        }
        self.depth += 1;
        Ok(())
    }

    fn too_deep(&self, token: &Token) -> ParserError {
        ParserError::NestingTooDeep {
            src: self.src(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            limit: self.options.max_depth,
        }
    }

    fn unbalanced(&self, start: &Token, kind: &str) -> ParserError {
        ParserError::UnbalancedCallable {
            src: self.src(),
            span: (start.pos_start, start.pos_end - start.pos_start).into(),
            kind: kind.to_string(),
        }
    }

    fn declaration_error(&self, start: &Token, reason: &str) -> ParserError {
        let end = self
            .current_token()
            .map(|t| t.pos_end)
            .unwrap_or(self.source_text.len());
        ParserError::VariableDeclaration {
            src: self.src(),
            span: (start.pos_start, end - start.pos_start).into(),
            reason: reason.to_string(),
        }
    }

    fn err_unexpected<T>(&self, expected: &str) -> Result<T, ParserError> {
        let token = self.current_token()?;
        Err(ParserError::UnexpectedToken {
            src: self.src(),
            span: (token.pos_start, token.pos_end - token.pos_start).into(),
            expected: expected.to_string(),
        })
    }
}

fn describe(ttype: &TokenType) -> String {
    match ttype {
        TokenType::LBrace => "`{`".to_string(),
        TokenType::RBrace => "`}` or `,`".to_string(),
        TokenType::RBracket => "`]` or `,`".to_string(),
        TokenType::Colon => "`:`".to_string(),
        TokenType::Eof => "the end of input".to_string(),
        other => format!("{other:?}"),
    }
}

/// Adds a trailing `type: '<tag>'` to an object that has no `type` key.
/// Returns whether the tag was added.
pub fn inject_type_tag(value: &mut Value, tag: &str) -> bool {
    match value {
        Value::Object(map) if !map.contains_key("type") => {
            map.insert("type".to_string(), Value::String(tag.to_string()));
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    fn parse_ok(source: &str) -> LiteralDocument {
        let mut parser = Parser::new_with_name(source, "test.js".to_string());
        match parser.parse_document() {
            Ok(doc) => doc,
            Err(err) => {
                let report = Report::from(err);
                panic!("{:?}", report);
            }
        }
    }

    fn parse_err(source: &str) -> ParserError {
        Parser::new(source)
            .parse_document()
            .expect_err("input should not parse")
    }

    #[test]
    fn test_empty_object() {
        let doc = parse_ok("{}");
        assert_eq!(doc.root, Value::Object(Map::new()));
        assert!(doc.declaration.is_none());
    }

    #[test]
    fn test_keys_and_scalars() {
        let doc = parse_ok(r#"{ plain: 1, 'single': -2.5, "double": true, 3: null, x: undefined, }"#);
        let map = doc.root.as_object().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["plain", "single", "double", "3"]);
        assert_eq!(map["single"], Value::Number(-2.5));
        assert_eq!(map["3"], Value::Null);
    }

    #[test]
    fn test_undefined_members_are_absent() {
        let doc = parse_ok("{ a: 1, b: 2, a: undefined, c: [1, undefined] }");
        let map = doc.root.as_object().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "c"]);
        assert_eq!(map["c"], Value::Array(vec![Value::Number(1.0), Value::Null]));
    }

    #[test]
    fn test_declaration_wrapper() {
        let doc = parse_ok("const options = { a: [1, 2,] };");
        assert_eq!(
            doc.declaration,
            Some(Declaration {
                keyword: "const".to_string(),
                name: "options".to_string()
            })
        );
        assert_eq!(doc.root.get("a"), Some(&Value::from(vec![1, 2])));
    }

    #[test]
    fn test_malformed_declaration() {
        assert!(matches!(parse_err("let = {}"), ParserError::VariableDeclaration { .. }));
        assert!(matches!(parse_err("var x {}"), ParserError::VariableDeclaration { .. }));

        let mut strict = Parser::new("{}").with_options(ParseOptions {
            require_declaration: true,
            ..ParseOptions::default()
        });
        assert!(matches!(
            strict.parse_document(),
            Err(ParserError::VariableDeclaration { .. })
        ));
    }

    #[test]
    fn test_dotted_reference() {
        let doc = parse_ok("{ color: Highcharts.theme.color }");
        assert_eq!(
            doc.root.get("color"),
            Some(&Value::Identifier("Highcharts.theme.color".to_string()))
        );
    }

    #[test]
    fn test_callable_capture_ignores_braces_in_strings_and_comments() {
        let source = "{\n  formatter: function () {\n    // }\n    return '}' + `{`;\n  },\n  next: 1\n}";
        let doc = parse_ok(source);
        let Some(Value::Callable(callable)) = doc.root.get("formatter") else {
            panic!("formatter should be a callable");
        };
        assert_eq!(
            callable.as_str(),
            "function () {\n    // }\n    return '}' + `{`;\n  }"
        );
        assert_eq!(doc.root.get("next"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_callable_with_braces_in_parameters() {
        let doc = parse_ok("{ f: function ({ a } = {}) { return a; } }");
        let Some(Value::Callable(callable)) = doc.root.get("f") else {
            panic!("f should be a callable");
        };
        assert_eq!(callable.as_str(), "function ({ a } = {}) { return a; }");
    }

    #[test]
    fn test_async_function_and_class() {
        let doc = parse_ok("[async function () { await x; }, class extends Base { m() {} }]");
        let items = doc.root.as_array().unwrap();
        assert!(matches!(&items[0], Value::Callable(c) if c.as_str().starts_with("async")));
        assert!(matches!(&items[1], Value::Callable(c) if c.as_str().ends_with("m() {} }")));
    }

    #[test]
    fn test_regex_in_callable_body_is_opaque() {
        let source = r#"{ f: function () { return String(this.y).replace(/\}/g, '') + /'/.test(s) + /[)]/.source; }, n: 1 }"#;
        let doc = parse_ok(source);
        let Some(Value::Callable(callable)) = doc.root.get("f") else {
            panic!("expected a callable, got {:?}", doc.root.get("f"));
        };
        assert!(callable.as_str().ends_with("/[)]/.source; }"));
        assert_eq!(doc.root.get("n"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_division_in_callable_body() {
        let doc = parse_ok("{ f: function (a) { return (a + 1) / 2 / a; } }");
        assert!(matches!(doc.root.get("f"), Some(Value::Callable(_))));
    }

    #[test]
    fn test_unbalanced_callable() {
        assert!(matches!(
            parse_err("{ f: function () { return [1, 2); } }"),
            ParserError::UnbalancedCallable { .. }
        ));
        assert!(matches!(
            parse_err("{ f: function () { if (a) {"),
            ParserError::UnbalancedCallable { .. }
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let options = ParseOptions {
            max_depth: 3,
            ..ParseOptions::default()
        };
        let mut ok = Parser::new("[[[1]]]").with_options(options.clone());
        assert!(ok.parse_document().is_ok());

        let mut deep = Parser::new("[[[[1]]]]").with_options(options);
        assert!(matches!(
            deep.parse_document(),
            Err(ParserError::NestingTooDeep { limit: 3, .. })
        ));
    }

    #[test]
    fn test_template_strings() {
        let doc = parse_ok("{ a: `plain {text}` }");
        assert_eq!(doc.root.get("a"), Some(&Value::from("plain {text}")));
        assert!(matches!(
            parse_err("{ a: `${x}` }"),
            ParserError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_grammar_errors() {
        assert!(matches!(parse_err("{ a: 1"), ParserError::UnexpectedEof { .. }));
        assert!(matches!(parse_err("{ a 1 }"), ParserError::UnexpectedToken { .. }));
        assert!(matches!(parse_err("{ a: 'open }"), ParserError::InvalidToken { .. }));
        assert!(matches!(parse_err("{ a: 1 } extra"), ParserError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_inject_type_tag() {
        let mut value = parse_ok("{ data: [1, 2] }").root;
        assert!(inject_type_tag(&mut value, "line"));
        assert!(!inject_type_tag(&mut value, "area"));
        assert_eq!(value.get("type"), Some(&Value::from("line")));
        assert_eq!(value.as_object().unwrap().keys().last().map(String::as_str), Some("type"));
    }
}
