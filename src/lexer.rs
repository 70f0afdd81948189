/// Represents the different kinds of tokens that the lexer can produce.
/// Each token is a meaningful unit of the object-literal syntax. Function and
/// class bodies are not tokenized into a grammar; the parser only walks their
/// tokens to find the matching closing brace.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input.
    Eof,
    /// Represents a sequence of one or more whitespace characters.
    Whitespace,
    /// A `// line` or `/* block */` comment. The associated `String` holds its trimmed text.
    Comment(String),
    /// A character (or unterminated construct) that is not part of the literal grammar.
    /// Legal inside callable bodies, an error anywhere else.
    Unknown,

    // == Literals ==
    /// An identifier, used for bare keys, keywords such as `function`, and references.
    Identifier(String),
    /// A string literal in single or double quotes, with escapes decoded.
    String(String),
    /// A backtick template string. The associated `String` is the raw text between the backticks.
    Template(String),
    /// A number literal: integer, decimal, scientific, hex, `NaN` or `Infinity`.
    Number(f64),
    /// A `/pattern/flags` regular expression. Holds the raw source text.
    Regex(String),

    // == Keywords ==
    /// The boolean `true` value.
    True,
    /// The boolean `false` value.
    False,
    /// The `null` keyword.
    Null,
    /// The `undefined` keyword.
    Undefined,

    // == Punctuation & Operators ==
    /// Left Brace: `{`
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Left Bracket: `[`
    LBracket,
    /// Right Bracket: `]`
    RBracket,
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Comma: `,`
    Comma,
    /// Colon: `:`
    Colon,
    /// Semicolon: `;` (terminates a variable declaration)
    Semicolon,
    /// Dot: `.` (used in dotted references such as `Highcharts.color`)
    Dot,
    /// Equals: `=` (used in variable declarations)
    Equals,
    /// Minus: `-` when not directly followed by a digit
    Minus,
}

/// A token with its type and byte position in the source.
#[derive(Debug, Clone)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
        }
    }
}

/// Returns `true` when `c` may start a JavaScript identifier.
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

/// Returns `true` when `c` may continue a JavaScript identifier.
pub fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Returns `true` when `s` can be written as a bare (unquoted) key.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
        _ => false,
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    // Whether a `/` here starts a regex rather than a division.
    regex_allowed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            regex_allowed: true,
        }
    }

    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token.ttype == TokenType::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    pub fn next_token(&mut self) -> Token {
        let start_pos = self.position;

        let first = self.advance();
        let ttype = if let Some(char) = first {
            match char {
                '{' => TokenType::LBrace,
                '}' => TokenType::RBrace,
                '[' => TokenType::LBracket,
                ']' => TokenType::RBracket,
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                ',' => TokenType::Comma,
                ':' => TokenType::Colon,
                ';' => TokenType::Semicolon,
                '=' => TokenType::Equals,

                '.' => {
                    if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.read_number(char)
                    } else {
                        TokenType::Dot
                    }
                }
                '-' => {
                    if self.peek().is_some_and(|c| c.is_ascii_digit() || *c == '.') {
                        self.read_number(char)
                    } else {
                        TokenType::Minus
                    }
                }
                '/' => match self.peek().copied() {
                    Some('/') => self.read_line_comment(),
                    Some('*') => self.read_block_comment(),
                    _ if self.regex_allowed => self.read_regex(),
                    _ => TokenType::Unknown,
                },
                '"' | '\'' => self.read_string(char),
                '`' => self.read_template(),
                c if c.is_whitespace() => self.read_whitespace(),
                c if is_identifier_start(c) => self.read_identifier(c),
                c if c.is_ascii_digit() => self.read_number(c),

                _ => TokenType::Unknown,
            }
        } else {
            TokenType::Eof
        };

        self.regex_allowed = match &ttype {
            TokenType::Whitespace | TokenType::Comment(_) => self.regex_allowed,
            TokenType::LParen
            | TokenType::LBracket
            | TokenType::LBrace
            | TokenType::RBrace
            | TokenType::Comma
            | TokenType::Colon
            | TokenType::Semicolon
            | TokenType::Equals
            | TokenType::Minus => true,
            TokenType::Identifier(word) => matches!(
                word.as_str(),
                "return" | "typeof" | "case" | "do" | "else" | "in" | "of" | "new" | "delete"
                    | "void" | "throw" | "instanceof" | "yield" | "await"
            ),
            TokenType::Unknown => {
                first.is_some_and(|c| "!&|?+*%<>~^".contains(c))
            }
            _ => false,
        };

        Token::new(ttype, start_pos, self.position)
    }

    /// The full source text this lexer was created with.
    pub fn input(&self) -> &'a str {
        self.input
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
        }
        char
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn advance_while(&mut self, buf: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(&c) = self.peek() {
            if !pred(c) {
                break;
            }
            buf.push(c);
            self.advance();
        }
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    fn read_line_comment(&mut self) -> TokenType {
        self.advance(); // Consume the second '/'
        let mut comment_text = String::new();
        self.advance_while(&mut comment_text, |c| c != '\n');
        TokenType::Comment(comment_text.trim().to_string())
    }

    fn read_block_comment(&mut self) -> TokenType {
        self.advance(); // Consume the '*'
        let mut comment_text = String::new();
        while let Some(c) = self.advance() {
            if c == '*' && self.peek() == Some(&'/') {
                self.advance();
                return TokenType::Comment(comment_text.trim().to_string());
            }
            comment_text.push(c);
        }
        TokenType::Unknown // Unclosed block comment
    }

    /// Reads a regex literal after its opening `/`. A `/` inside a `[...]`
    /// class or after a backslash does not close it.
    fn read_regex(&mut self) -> TokenType {
        let mut raw = String::from("/");
        let mut in_class = false;
        while let Some(c) = self.advance() {
            raw.push(c);
            match c {
                '\\' => match self.advance() {
                    Some('\n') | None => return TokenType::Unknown,
                    Some(escaped) => raw.push(escaped),
                },
                '\n' => return TokenType::Unknown,
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    self.advance_while(&mut raw, is_identifier_part);
                    return TokenType::Regex(raw);
                }
                _ => {}
            }
        }
        TokenType::Unknown // Unclosed regex
    }

    fn read_string(&mut self, quote: char) -> TokenType {
        let mut value = String::new();
        while let Some(c) = self.advance() {
            if c == quote {
                return TokenType::String(value);
            }
            if c == '\n' {
                return TokenType::Unknown; // Raw newline inside a quoted string
            }
            if c != '\\' {
                value.push(c);
                continue;
            }

            let Some(escaped_char) = self.advance() else {
                return TokenType::Unknown; // Unclosed escape sequence
            };
            match escaped_char {
                'n' => value.push('\n'),
                'r' => value.push('\r'),
                't' => value.push('\t'),
                'b' => value.push('\u{0008}'),
                'f' => value.push('\u{000C}'),
                'v' => value.push('\u{000B}'),
                '0' => value.push('\0'),
                '\n' => {} // Line continuation
                'x' => match self.read_hex_escape(2) {
                    Some(decoded) => value.push(decoded),
                    None => return TokenType::Unknown,
                },
                'u' => match self.read_unicode_escape() {
                    Some(decoded) => value.push(decoded),
                    None => return TokenType::Unknown,
                },
                // Covers \\, \', \", \/ and any identity escape.
                other => value.push(other),
            }
        }
        TokenType::Unknown // Unclosed string
    }

    fn read_hex_escape(&mut self, digits: usize) -> Option<char> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            let c = self.advance()?;
            if !c.is_ascii_hexdigit() {
                return None;
            }
            hex.push(c);
        }
        u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
    }

    fn read_unicode_escape(&mut self) -> Option<char> {
        if self.peek() != Some(&'{') {
            return self.read_hex_escape(4);
        }
        self.advance();
        let mut hex = String::new();
        self.advance_while(&mut hex, |c| c.is_ascii_hexdigit());
        if self.advance() != Some('}') || hex.is_empty() {
            return None;
        }
        u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
    }

    fn read_template(&mut self) -> TokenType {
        let mut raw = String::new();
        while let Some(c) = self.advance() {
            match c {
                '`' => return TokenType::Template(raw),
                '\\' => {
                    raw.push(c);
                    match self.advance() {
                        Some(escaped) => raw.push(escaped),
                        None => return TokenType::Unknown,
                    }
                }
                _ => raw.push(c),
            }
        }
        TokenType::Unknown // Unclosed template
    }

    fn read_identifier(&mut self, first_char: char) -> TokenType {
        let mut ident = String::new();
        ident.push(first_char);
        self.advance_while(&mut ident, is_identifier_part);

        match ident.as_str() {
            "true" => TokenType::True,
            "false" => TokenType::False,
            "null" => TokenType::Null,
            "undefined" => TokenType::Undefined,
            "NaN" => TokenType::Number(f64::NAN),
            "Infinity" => TokenType::Number(f64::INFINITY),
            _ => TokenType::Identifier(ident),
        }
    }

    fn read_number(&mut self, first_char: char) -> TokenType {
        let mut number_str = String::new();
        number_str.push(first_char);

        let leading_zero = first_char == '0'
            || (first_char == '-' && self.peek() == Some(&'0'));
        if leading_zero {
            if first_char == '-' {
                number_str.push('0');
                self.advance();
            }
            if matches!(self.peek(), Some('x') | Some('X')) {
                self.advance();
                let mut digits = String::new();
                self.advance_while(&mut digits, |c| c.is_ascii_hexdigit());
                let Ok(parsed) = u64::from_str_radix(&digits, 16) else {
                    return TokenType::Unknown;
                };
                let magnitude = parsed as f64;
                return TokenType::Number(if first_char == '-' {
                    -magnitude
                } else {
                    magnitude
                });
            }
        }

        let mut has_dot = first_char == '.';
        let mut has_exponent = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                number_str.push(*c);
                self.advance();
            } else if *c == '.' && !has_dot && !has_exponent {
                has_dot = true;
                number_str.push('.');
                self.advance();
            } else if (*c == 'e' || *c == 'E') && !has_exponent {
                has_exponent = true;
                number_str.push('e');
                self.advance();
                // Check for optional sign after 'e' or 'E'
                if let Some(sign_char) = self.peek() {
                    if *sign_char == '+' || *sign_char == '-' {
                        number_str.push(*sign_char);
                        self.advance();
                    }
                }
            } else {
                break;
            }
        }

        if let Ok(num) = number_str.parse::<f64>() {
            TokenType::Number(num)
        } else {
            TokenType::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens(input: &str, expected: Vec<TokenType>) {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.lex();
        let token_types: Vec<TokenType> = tokens.into_iter().map(|t| t.ttype).collect();

        // Filter out whitespace and comments for most tests
        let filtered_tokens: Vec<TokenType> = token_types
            .into_iter()
            .filter(|t| !matches!(t, TokenType::Whitespace | TokenType::Comment(_)))
            .collect();

        assert_eq!(filtered_tokens, expected);
    }

    #[test]
    fn test_eof() {
        assert_tokens("", vec![TokenType::Eof]);
    }

    #[test]
    fn test_single_char_tokens() {
        let input = "{}[](),:;=.";
        let expected = vec![
            TokenType::LBrace,
            TokenType::RBrace,
            TokenType::LBracket,
            TokenType::RBracket,
            TokenType::LParen,
            TokenType::RParen,
            TokenType::Comma,
            TokenType::Colon,
            TokenType::Semicolon,
            TokenType::Equals,
            TokenType::Dot,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_keywords() {
        let input = "true false null undefined function";
        let expected = vec![
            TokenType::True,
            TokenType::False,
            TokenType::Null,
            TokenType::Undefined,
            TokenType::Identifier("function".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_identifiers() {
        let input = "foo bar_123 _baz $el";
        let expected = vec![
            TokenType::Identifier("foo".to_string()),
            TokenType::Identifier("bar_123".to_string()),
            TokenType::Identifier("_baz".to_string()),
            TokenType::Identifier("$el".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_numbers() {
        let input = "123 45.67 -10 0.5 .25 -.5 1e3 2.5E-2 0x1F";
        let expected = vec![
            TokenType::Number(123.0),
            TokenType::Number(45.67),
            TokenType::Number(-10.0),
            TokenType::Number(0.5),
            TokenType::Number(0.25),
            TokenType::Number(-0.5),
            TokenType::Number(1000.0),
            TokenType::Number(0.025),
            TokenType::Number(31.0),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_minus_before_identifier() {
        assert_tokens(
            "-Infinity",
            vec![
                TokenType::Minus,
                TokenType::Number(f64::INFINITY),
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_strings_both_quotes() {
        let input = r#""hello world" '' 'it\'s' "say \"hi\"""#;
        let expected = vec![
            TokenType::String("hello world".to_string()),
            TokenType::String("".to_string()),
            TokenType::String("it's".to_string()),
            TokenType::String("say \"hi\"".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_strings_with_escapes() {
        let input = r#""tab\tnew\nline A\x42\u{1F600} \/""#;
        let expected = vec![
            TokenType::String("tab\tnew\nline AB\u{1F600} /".to_string()),
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }

    #[test]
    fn test_unterminated_string_is_unknown() {
        let mut lexer = Lexer::new("'open");
        let tokens = lexer.lex();
        assert_eq!(tokens[0].ttype, TokenType::Unknown);
    }

    #[test]
    fn test_regex_literal_is_one_token() {
        assert_tokens(
            r"(/[}'/]\//g)",
            vec![
                TokenType::LParen,
                TokenType::Regex(r"/[}'/]\//g".to_string()),
                TokenType::RParen,
                TokenType::Eof,
            ],
        );
    }

    #[test]
    fn test_slash_after_operand_is_division() {
        let mut lexer = Lexer::new("a / b / c");
        let types: Vec<TokenType> = lexer
            .lex()
            .into_iter()
            .map(|t| t.ttype)
            .filter(|t| !matches!(t, TokenType::Whitespace))
            .collect();
        assert_eq!(
            types,
            vec![
                TokenType::Identifier("a".to_string()),
                TokenType::Unknown,
                TokenType::Identifier("b".to_string()),
                TokenType::Unknown,
                TokenType::Identifier("c".to_string()),
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_template_string_is_one_token() {
        assert_tokens(
            "`a ${b} }`",
            vec![TokenType::Template("a ${b} }".to_string()), TokenType::Eof],
        );
    }

    #[test]
    fn test_comments_and_whitespace() {
        let input = " // this is a comment\n key: value /* another { one */";
        let mut lexer = Lexer::new(input);
        let tokens = lexer.lex();
        let token_types: Vec<TokenType> = tokens.into_iter().map(|t| t.ttype).collect();

        let expected = vec![
            TokenType::Whitespace,
            TokenType::Comment("this is a comment".to_string()),
            TokenType::Whitespace,
            TokenType::Identifier("key".to_string()),
            TokenType::Colon,
            TokenType::Whitespace,
            TokenType::Identifier("value".to_string()),
            TokenType::Whitespace,
            TokenType::Comment("another { one".to_string()),
            TokenType::Eof,
        ];

        assert_eq!(token_types, expected);
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let mut lexer = Lexer::new("{ é: 1 }");
        let tokens = lexer.lex();
        let number = tokens
            .iter()
            .find(|t| matches!(t.ttype, TokenType::Number(_)))
            .unwrap();
        assert_eq!(&lexer.input()[number.pos_start..number.pos_end], "1");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("marginTop"));
        assert!(is_identifier("$x"));
        assert!(!is_identifier("stroke-width"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_complex_literal_structure() {
        let input = r#"
const options = {
    // Chart settings
    chart: { type: 'line', marginTop: 12 },
    series: [{ data: [1, -2.5], }],
};
            "#;
        let expected = vec![
            TokenType::Identifier("const".to_string()),
            TokenType::Identifier("options".to_string()),
            TokenType::Equals,
            TokenType::LBrace,
            TokenType::Identifier("chart".to_string()),
            TokenType::Colon,
            TokenType::LBrace,
            TokenType::Identifier("type".to_string()),
            TokenType::Colon,
            TokenType::String("line".to_string()),
            TokenType::Comma,
            TokenType::Identifier("marginTop".to_string()),
            TokenType::Colon,
            TokenType::Number(12.0),
            TokenType::RBrace,
            TokenType::Comma,
            TokenType::Identifier("series".to_string()),
            TokenType::Colon,
            TokenType::LBracket,
            TokenType::LBrace,
            TokenType::Identifier("data".to_string()),
            TokenType::Colon,
            TokenType::LBracket,
            TokenType::Number(1.0),
            TokenType::Comma,
            TokenType::Number(-2.5),
            TokenType::RBracket,
            TokenType::Comma,
            TokenType::RBrace,
            TokenType::RBracket,
            TokenType::Comma,
            TokenType::RBrace,
            TokenType::Semicolon,
            TokenType::Eof,
        ];
        assert_tokens(input, expected);
    }
}
