use crate::ast::Comparison;
use crate::error::{ParseError, Position};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Keywords and identifiers
    Word(String),
    Str(String),
    Number(f64),
    /// `{name}` or `{page.name}`
    Variable { page: Option<String>, name: String },
    /// `{{NAME}}`
    Env(String),
    /// `@word`
    Tag(String),
    Op(Comparison),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Dot,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub begin: Position,
    pub end: Position,
}

impl Token {
    pub fn line(&self) -> usize {
        self.begin.line
    }

    pub fn is_word(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w == word)
    }
}

/// Tokens plus any lexical errors; lexing never stops at the first error.
#[derive(Debug, Clone, Default)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

pub fn tokenize(input: &str) -> LexResult {
    let mut lexer = Lexer {
        input,
        pos: 0,
        line: 1,
        line_start: 0,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    LexResult {
        tokens: lexer.tokens,
        errors: lexer.errors,
    }
}

impl<'a> Lexer<'a> {
    // ── Helpers ──────────────────────────────────────────────────────

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.pos - self.line_start)
    }

    fn push(&mut self, kind: TokenKind, begin: Position) {
        let end = self.position();
        self.tokens.push(Token { kind, begin, end });
    }

    fn error(&mut self, message: String, begin: Position) {
        let end = self.position();
        self.errors.push(ParseError::lex_error(message, begin, end));
    }

    fn skip_to_line_end(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '\n' {
                break;
            }
            self.advance(ch.len_utf8());
        }
    }

    // ── Main loop ───────────────────────────────────────────────────

    fn run(&mut self) {
        while let Some(ch) = self.peek_char() {
            let begin = self.position();
            match ch {
                '\n' => {
                    self.advance(1);
                    self.line += 1;
                    self.line_start = self.pos;
                }
                ' ' | '\t' | '\r' => self.advance(1),
                '#' => self.skip_to_line_end(),
                '/' if self.peek_second() == Some('/') => self.skip_to_line_end(),
                '"' => self.lex_string(begin),
                '{' => self.lex_open_brace(begin),
                '}' => {
                    self.advance(1);
                    self.push(TokenKind::RBrace, begin);
                }
                '(' => {
                    self.advance(1);
                    self.push(TokenKind::LParen, begin);
                }
                ')' => {
                    self.advance(1);
                    self.push(TokenKind::RParen, begin);
                }
                '.' => {
                    self.advance(1);
                    self.push(TokenKind::Dot, begin);
                }
                ',' => {
                    self.advance(1);
                    self.push(TokenKind::Comma, begin);
                }
                '@' => {
                    self.advance(1);
                    let len = identifier_len(self.remaining());
                    if len == 0 {
                        self.error("Expected a tag name after '@'".to_string(), begin);
                        continue;
                    }
                    let name = self.remaining()[..len].to_string();
                    self.advance(len);
                    self.push(TokenKind::Tag(name), begin);
                }
                '=' | '!' | '<' | '>' => self.lex_operator(begin),
                '-' => {
                    if self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
                        self.lex_number(begin);
                    } else {
                        self.advance(1);
                        self.error("Unexpected '-'".to_string(), begin);
                    }
                }
                c if c.is_ascii_digit() => self.lex_number(begin),
                c if c.is_alphabetic() || c == '_' => {
                    let len = identifier_len(self.remaining());
                    let word = self.remaining()[..len].to_string();
                    self.advance(len);
                    self.push(TokenKind::Word(word), begin);
                }
                other => {
                    self.advance(other.len_utf8());
                    self.error(format!("Unexpected character '{}'", other), begin);
                }
            }
        }
    }

    fn lex_operator(&mut self, begin: Position) {
        let two = self.remaining().get(..2).unwrap_or("");
        let symbol = match two {
            "!=" | ">=" | "<=" => two,
            _ => self.remaining().get(..1).unwrap_or(""),
        };
        match Comparison::from_symbol(symbol) {
            Some(op) => {
                self.advance(symbol.len());
                self.push(TokenKind::Op(op), begin);
            }
            None => {
                self.advance(1);
                self.error(format!("Unexpected '{}'", symbol), begin);
            }
        }
    }

    fn lex_number(&mut self, begin: Position) {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.advance(1);
        }
        self.eat_digits();
        if self.peek_char() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(1);
            self.eat_digits();
        }
        let text = &self.input[start..self.pos];
        match text.parse::<f64>() {
            Ok(n) => self.push(TokenKind::Number(n), begin),
            Err(_) => self.error(format!("Invalid number '{}'", text), begin),
        }
    }

    fn eat_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
    }

    fn lex_string(&mut self, begin: Position) {
        self.advance(1);
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    self.error("Unterminated string".to_string(), begin);
                    return;
                }
                Some('"') => {
                    self.advance(1);
                    self.push(TokenKind::Str(value), begin);
                    return;
                }
                Some('\\') => {
                    self.advance(1);
                    match self.peek_char() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some(c @ ('"' | '\\')) => value.push(c),
                        Some(c) if c != '\n' => {
                            value.push('\\');
                            value.push(c);
                        }
                        _ => continue,
                    }
                    if let Some(c) = self.peek_char() {
                        self.advance(c.len_utf8());
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance(c.len_utf8());
                }
            }
        }
    }

    /// `{` opens a block unless it is a `{name}`, `{page.name}` or
    /// `{{NAME}}` reference.
    fn lex_open_brace(&mut self, begin: Position) {
        let rest = self.remaining();
        if let Some(inner) = rest.strip_prefix("{{") {
            let len = identifier_len(inner);
            if len > 0 && inner[len..].starts_with("}}") {
                let name = inner[..len].to_string();
                self.advance(len + 4);
                self.push(TokenKind::Env(name), begin);
                return;
            }
        }
        let inner = &rest[1..];
        let first = identifier_len(inner);
        if first > 0 {
            let after = &inner[first..];
            if after.starts_with('}') {
                let name = inner[..first].to_string();
                self.advance(first + 2);
                self.push(TokenKind::Variable { page: None, name }, begin);
                return;
            }
            if let Some(tail) = after.strip_prefix('.') {
                let second = identifier_len(tail);
                if second > 0 && tail[second..].starts_with('}') {
                    let page = inner[..first].to_string();
                    let name = tail[..second].to_string();
                    self.advance(first + second + 3);
                    self.push(
                        TokenKind::Variable {
                            page: Some(page),
                            name,
                        },
                        begin,
                    );
                    return;
                }
            }
        }
        self.advance(1);
        self.push(TokenKind::LBrace, begin);
    }
}

/// Byte length of the identifier at the start of `s` (`0` if none).
pub(crate) fn identifier_len(s: &str) -> usize {
    let mut len = 0;
    for (i, ch) in s.char_indices() {
        let ok = if i == 0 {
            ch.is_alphabetic() || ch == '_'
        } else {
            ch.is_alphanumeric() || ch == '_'
        };
        if !ok {
            break;
        }
        len = i + ch.len_utf8();
    }
    len
}
