use crate::ast::*;
use crate::error::{ParseError, Position};
use crate::lexer::{tokenize, Token, TokenKind};

/// The parsed program plus every error met on the way.
///
/// Parsing recovers at statement granularity, so `program` is always
/// populated; callers must check `errors` before trusting it.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

/// Anything that can turn Vero source into a statement tree.
pub trait ScriptParser {
    fn parse_source(&self, source: &str) -> ParseResult;
}

/// The built-in tokenizer + parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct VeroParser;

impl ScriptParser for VeroParser {
    fn parse_source(&self, source: &str) -> ParseResult {
        parse_source(source)
    }
}

/// Tokenize and parse in one go, merging lexical and syntax errors.
pub fn parse_source(source: &str) -> ParseResult {
    let lexed = tokenize(source);
    let mut result = parse(&lexed.tokens);
    let mut errors = lexed.errors;
    errors.append(&mut result.errors);
    result.errors = errors;
    result
}

type PResult<T> = Result<T, ParseError>;

/// Parser state: tracks position in the token stream.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<ParseError>,
}

/// Parse a token stream into a program.
pub fn parse(tokens: &[Token]) -> ParseResult {
    let mut parser = Parser {
        tokens,
        pos: 0,
        errors: Vec::new(),
    };
    let mut program = Program::default();

    while let Some(token) = parser.peek() {
        let line = token.line();
        let start = parser.pos;
        let outcome = if token.kind == TokenKind::RBrace {
            Err(parser.error_here("Unexpected '}' outside of a block".to_string()))
        } else if token.is_word("PAGE") {
            parser.parse_page().map(|p| program.pages.push(p))
        } else if token.is_word("FEATURE") {
            parser.parse_feature().map(|f| program.features.push(f))
        } else {
            Err(parser.error_here("Expected PAGE or FEATURE".to_string()))
        };
        if let Err(err) = outcome {
            parser.errors.push(err);
            parser.recover(line);
            // `recover` stops in front of a closing brace; skip it here.
            if parser.pos == start {
                parser.pos += 1;
            }
        }
    }

    ParseResult {
        program,
        errors: parser.errors,
    }
}

impl<'a> Parser<'a> {
    // ── Helpers ──────────────────────────────────────────────────────

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> PResult<()> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.error_here(format!("Expected {}", word)))
        }
    }

    fn at_kind(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|t| &t.kind == kind)
    }

    fn eat_kind(&mut self, kind: &TokenKind) -> bool {
        if self.at_kind(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_kind(&mut self, kind: &TokenKind, what: &str) -> PResult<&'a Token> {
        match self.peek() {
            Some(token) if &token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error_here(format!("Expected {}", what))),
        }
    }

    fn expect_identifier(&mut self, what: &str) -> PResult<String> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) => {
                self.pos += 1;
                Ok(word.clone())
            }
            _ => Err(self.error_here(format!("Expected {}", what))),
        }
    }

    /// A statement that began on `line` ends at the first token on a later
    /// line, at a closing brace, or at end of input.
    fn at_statement_end(&self, line: usize) -> bool {
        match self.peek() {
            None => true,
            Some(token) => token.line() != line || token.kind == TokenKind::RBrace,
        }
    }

    fn expect_statement_end(&self, line: usize) -> PResult<()> {
        if self.at_statement_end(line) {
            Ok(())
        } else {
            Err(self.error_here("Unexpected token after statement".to_string()))
        }
    }

    fn current_position(&self) -> (Position, Position) {
        match self.peek() {
            Some(token) => (token.begin, token.end),
            None => {
                let end = self
                    .tokens
                    .last()
                    .map(|t| t.end)
                    .unwrap_or(Position::new(1, 0));
                (end, end)
            }
        }
    }

    fn error_here(&self, message: String) -> ParseError {
        let (begin, end) = self.current_position();
        let message = match self.peek() {
            Some(_) => message,
            None => format!("{} before end of input", message),
        };
        ParseError::syntax_error(message, begin, end)
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|t| t.line()).unwrap_or(1)
    }

    /// Skip the rest of the construct that began on `line`. A block opened
    /// on that line is skipped through its matching closing brace.
    fn recover(&mut self, line: usize) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && (token.line() != line || token.kind == TokenKind::RBrace) {
                break;
            }
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += 1;
        }
    }

    // ── Program structure ───────────────────────────────────────────

    fn parse_page(&mut self) -> PResult<Page> {
        let line = self.peek().map(|t| t.line()).unwrap_or(1);
        self.expect_word("PAGE")?;
        let name = self.expect_identifier("a page name")?;
        self.expect_kind(&TokenKind::LBrace, "'{'")?;

        let mut page = Page {
            name,
            fields: Vec::new(),
            actions: Vec::new(),
            line,
        };
        loop {
            let Some(token) = self.peek() else {
                return Err(self.error_here("Expected '}'".to_string()));
            };
            if token.kind == TokenKind::RBrace {
                self.pos += 1;
                return Ok(page);
            }
            let item_line = token.line();
            let outcome = if token.is_word("FIELD") {
                self.parse_page_field().map(|f| page.fields.push(f))
            } else {
                self.parse_page_action().map(|a| page.actions.push(a))
            };
            if let Err(err) = outcome {
                self.errors.push(err);
                self.recover(item_line);
            }
        }
    }

    fn parse_page_field(&mut self) -> PResult<PageField> {
        let line = self.peek().map(|t| t.line()).unwrap_or(1);
        self.expect_word("FIELD")?;
        let name = self.expect_identifier("a field name")?;
        self.expect_kind(&TokenKind::Op(Comparison::Equal), "'='")?;
        let target = self.parse_target()?;
        self.expect_statement_end(line)?;
        Ok(PageField { name, target, line })
    }

    fn parse_page_action(&mut self) -> PResult<PageAction> {
        let line = self.peek().map(|t| t.line()).unwrap_or(1);
        let name = self.expect_identifier("FIELD or an action name")?;
        let mut params = Vec::new();
        if self.eat_kind(&TokenKind::LParen) {
            if !self.eat_kind(&TokenKind::RParen) {
                loop {
                    params.push(self.expect_identifier("a parameter name")?);
                    if self.eat_kind(&TokenKind::Comma) {
                        continue;
                    }
                    self.expect_kind(&TokenKind::RParen, "')'")?;
                    break;
                }
            }
        }
        self.expect_kind(&TokenKind::LBrace, "'{'")?;
        let (statements, _) = self.parse_statement_list()?;
        Ok(PageAction {
            name,
            params,
            statements,
            line,
        })
    }

    fn parse_feature(&mut self) -> PResult<Feature> {
        let line = self.peek().map(|t| t.line()).unwrap_or(1);
        self.expect_word("FEATURE")?;
        let name = self.expect_identifier("a feature name")?;
        self.expect_kind(&TokenKind::LBrace, "'{'")?;

        let mut feature = Feature {
            name,
            uses: Vec::new(),
            scenarios: Vec::new(),
            line,
            end_line: line,
        };
        loop {
            let Some(token) = self.peek() else {
                feature.end_line = self.last_line();
                let err = self.error_here("Expected '}' to close FEATURE".to_string());
                self.errors.push(err);
                return Ok(feature);
            };
            if token.kind == TokenKind::RBrace {
                feature.end_line = token.line();
                self.pos += 1;
                return Ok(feature);
            }
            let item_line = token.line();
            let outcome = if token.is_word("USE") {
                self.pos += 1;
                self.expect_identifier("a page name")
                    .map(|page| feature.uses.push(page))
            } else {
                self.parse_scenario().map(|s| feature.scenarios.push(s))
            };
            if let Err(err) = outcome {
                self.errors.push(err);
                self.recover(item_line);
            }
        }
    }

    fn parse_scenario(&mut self) -> PResult<Scenario> {
        let mut annotations = Vec::new();
        while let Some(Token {
            kind: TokenKind::Tag(tag),
            ..
        }) = self.peek()
        {
            annotations.push(tag.clone());
            self.pos += 1;
        }
        let line = self.peek().map(|t| t.line()).unwrap_or(1);
        self.expect_word("SCENARIO")?;
        let name = match self.peek() {
            Some(Token {
                kind: TokenKind::Word(w) | TokenKind::Str(w),
                ..
            }) => {
                self.pos += 1;
                w.clone()
            }
            _ => return Err(self.error_here("Expected a scenario name".to_string())),
        };
        let mut tags = Vec::new();
        while let Some(Token {
            kind: TokenKind::Tag(tag),
            ..
        }) = self.peek()
        {
            tags.push(tag.clone());
            self.pos += 1;
        }
        self.expect_kind(&TokenKind::LBrace, "'{'")?;
        let (statements, end_line) = self.parse_statement_list()?;
        Ok(Scenario {
            name,
            tags,
            annotations,
            statements,
            line,
            end_line,
        })
    }

    /// Parse statements up to and including the closing brace, returning
    /// them with the closing brace's line.
    fn parse_statement_list(&mut self) -> PResult<(Vec<Statement>, usize)> {
        let mut statements = Vec::new();
        loop {
            let Some(token) = self.peek() else {
                return Err(self.error_here("Expected '}'".to_string()));
            };
            if token.kind == TokenKind::RBrace {
                self.pos += 1;
                return Ok((statements, token.line()));
            }
            let line = token.line();
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.recover(line);
                }
            }
        }
    }

    // ── Statement Dispatch ──────────────────────────────────────────

    fn parse_statement(&mut self) -> PResult<Statement> {
        let line = self.peek().map(|t| t.line()).unwrap_or(1);
        let keyword = self.expect_identifier("a statement")?;
        let stmt = match keyword.as_str() {
            "FOR" => return self.parse_for_each(line),
            "IF" => return self.parse_if(line),
            "TRY" => return self.parse_try(line),
            "REPEAT" => return self.parse_repeat(line),
            "OPEN" => Statement::Open {
                url: self.parse_expression()?,
                line,
            },
            "REFRESH" => Statement::Refresh { line },
            "GO" => {
                if self.eat_word("BACK") {
                    Statement::GoBack { line }
                } else {
                    self.expect_word("FORWARD")?;
                    Statement::GoForward { line }
                }
            }
            "SWITCH" => self.parse_switch(line)?,
            "CLOSE" => {
                self.expect_word("TAB")?;
                Statement::CloseTab { line }
            }
            "CLICK" => Statement::Click {
                target: self.parse_target()?,
                line,
            },
            "DOUBLE" => {
                self.expect_word("CLICK")?;
                Statement::DoubleClick {
                    target: self.parse_target()?,
                    line,
                }
            }
            "RIGHT" => {
                self.expect_word("CLICK")?;
                Statement::RightClick {
                    target: self.parse_target()?,
                    line,
                }
            }
            "FILL" => {
                let target = self.parse_target()?;
                self.expect_word("WITH")?;
                Statement::Fill {
                    target,
                    value: self.parse_expression()?,
                    line,
                }
            }
            "CLEAR" => Statement::Clear {
                target: self.parse_target()?,
                line,
            },
            "CHECK" => Statement::Check {
                target: self.parse_target()?,
                line,
            },
            "UNCHECK" => Statement::Uncheck {
                target: self.parse_target()?,
                line,
            },
            "SELECT" => {
                let option = self.parse_expression()?;
                self.expect_word("FROM")?;
                Statement::Select {
                    option,
                    target: self.parse_target()?,
                    line,
                }
            }
            "HOVER" => Statement::Hover {
                target: self.parse_target()?,
                line,
            },
            "FOCUS" => Statement::Focus {
                target: self.parse_target()?,
                line,
            },
            "PRESS" => Statement::Press {
                key: self.parse_expression()?,
                line,
            },
            "SCROLL" => self.parse_scroll(line)?,
            "DRAG" => {
                let source = self.parse_target()?;
                self.expect_word("TO")?;
                Statement::Drag {
                    source,
                    destination: self.parse_target()?,
                    line,
                }
            }
            "UPLOAD" => {
                let files = self.parse_expression_list()?;
                self.expect_word("TO")?;
                Statement::Upload {
                    files,
                    target: self.parse_target()?,
                    line,
                }
            }
            "WAIT" => self.parse_wait(line)?,
            "VERIFY" => self.parse_verify(line)?,
            "API" => self.parse_api(line)?,
            "LOAD" | "ROW" | "ROWS" | "COLUMN" | "COUNT" => self.parse_data(&keyword, line)?,
            "SET" => {
                let variable = self.expect_identifier("a variable name")?;
                self.expect_kind(&TokenKind::Op(Comparison::Equal), "'='")?;
                Statement::Set {
                    variable,
                    value: self.parse_expression()?,
                    line,
                }
            }
            "PERFORM" => self.parse_perform(line)?,
            "LOG" => Statement::Log {
                message: self.parse_expression()?,
                line,
            },
            "TAKE" => {
                self.expect_word("SCREENSHOT")?;
                let name = if self.eat_word("AS") {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Statement::TakeScreenshot { name, line }
            }
            other => {
                self.pos -= 1;
                return Err(self.error_here(format!("Unknown statement '{}'", other)));
            }
        };
        self.expect_statement_end(line)?;
        Ok(stmt)
    }

    fn parse_switch(&mut self, line: usize) -> PResult<Statement> {
        self.expect_word("TO")?;
        if self.eat_word("NEW") {
            self.expect_word("TAB")?;
            let url = if self.at_statement_end(line) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            return Ok(Statement::SwitchToNewTab { url, line });
        }
        if self.eat_word("TAB") {
            return Ok(Statement::SwitchToTab {
                index: self.parse_expression()?,
                line,
            });
        }
        if self.eat_word("MAIN") {
            self.expect_word("FRAME")?;
            return Ok(Statement::SwitchToMainFrame { line });
        }
        self.expect_word("FRAME")?;
        Ok(Statement::SwitchToFrame {
            target: self.parse_target()?,
            line,
        })
    }

    fn parse_scroll(&mut self, line: usize) -> PResult<Statement> {
        if self.eat_word("TO") {
            return Ok(Statement::ScrollTo {
                target: self.parse_target()?,
                line,
            });
        }
        let direction = match self.expect_identifier("TO or a direction")?.as_str() {
            "UP" => ScrollDirection::Up,
            "DOWN" => ScrollDirection::Down,
            "LEFT" => ScrollDirection::Left,
            "RIGHT" => ScrollDirection::Right,
            other => {
                self.pos -= 1;
                return Err(self.error_here(format!("Unknown scroll direction '{}'", other)));
            }
        };
        Ok(Statement::Scroll { direction, line })
    }

    fn parse_wait(&mut self, line: usize) -> PResult<Statement> {
        if self.eat_word("FOR") {
            if self.eat_word("NAVIGATION") {
                return Ok(Statement::WaitForNavigation { line });
            }
            if self.eat_word("URL") {
                return Ok(Statement::WaitForUrl {
                    pattern: self.parse_expression()?,
                    line,
                });
            }
            return Ok(Statement::WaitFor {
                target: self.parse_target()?,
                line,
            });
        }
        let duration = self.parse_expression()?;
        let unit = if self.eat_word("SECONDS") || self.eat_word("SECOND") {
            TimeUnit::Seconds
        } else if self.eat_word("MILLISECONDS") || self.eat_word("MS") {
            TimeUnit::Milliseconds
        } else {
            return Err(self.error_here("Expected SECONDS or MILLISECONDS".to_string()));
        };
        Ok(Statement::Wait {
            duration,
            unit,
            line,
        })
    }

    fn parse_verify(&mut self, line: usize) -> PResult<Statement> {
        if self.eat_word("URL") {
            let mode = self.parse_string_match()?;
            return Ok(Statement::VerifyUrl {
                mode,
                value: self.parse_expression()?,
                line,
            });
        }
        if self.eat_word("TITLE") {
            let mode = self.parse_string_match()?;
            return Ok(Statement::VerifyTitle {
                mode,
                value: self.parse_expression()?,
                line,
            });
        }
        if self.eat_word("SCREENSHOT") {
            let target = if self.at_statement_end(line) || self.at_word("AS") {
                None
            } else {
                Some(self.parse_target()?)
            };
            let name = if self.eat_word("AS") {
                Some(self.parse_expression()?)
            } else {
                None
            };
            return Ok(Statement::VerifyScreenshot { target, name, line });
        }
        if self.eat_word("VARIABLE") {
            let variable = self.expect_identifier("a variable name")?;
            let comparison = self.parse_comparison()?;
            return Ok(Statement::VerifyVariable {
                variable,
                comparison,
                value: self.parse_expression()?,
                line,
            });
        }
        if self.eat_word("RESPONSE") {
            let part = if self.eat_word("STATUS") {
                ResponsePart::Status
            } else {
                self.expect_word("BODY")?;
                ResponsePart::Body
            };
            let comparison = self.parse_comparison()?;
            return Ok(Statement::VerifyResponse {
                part,
                comparison,
                value: self.parse_expression()?,
                line,
            });
        }

        let target = self.parse_target()?;
        if self.eat_word("IS") {
            let negated = self.eat_word("NOT");
            let state = self.parse_element_state()?;
            return Ok(Statement::VerifyElement {
                target,
                negated,
                state,
                line,
            });
        }
        if self.eat_word("CONTAINS") {
            self.expect_word("TEXT")?;
            return Ok(Statement::VerifyText {
                target,
                mode: TextMatch::Contains,
                value: self.parse_expression()?,
                line,
            });
        }
        self.expect_word("HAS")?;
        if self.eat_word("TEXT") {
            return Ok(Statement::VerifyText {
                target,
                mode: TextMatch::Exact,
                value: self.parse_expression()?,
                line,
            });
        }
        if self.eat_word("VALUE") {
            return Ok(Statement::VerifyValue {
                target,
                value: self.parse_expression()?,
                line,
            });
        }
        if self.eat_word("COUNT") {
            return Ok(Statement::VerifyCount {
                target,
                count: self.parse_expression()?,
                line,
            });
        }
        self.expect_word("ATTRIBUTE")?;
        let attribute = self.parse_expression()?;
        self.expect_word("EQUAL")?;
        Ok(Statement::VerifyAttribute {
            target,
            attribute,
            value: self.parse_expression()?,
            line,
        })
    }

    fn parse_api(&mut self, line: usize) -> PResult<Statement> {
        let word = self.expect_identifier("an HTTP method")?;
        let Some(method) = HttpMethod::from_keyword(&word) else {
            self.pos -= 1;
            return Err(self.error_here(format!("Unknown HTTP method '{}'", word)));
        };
        let url = self.parse_expression()?;
        let body = if self.eat_word("BODY") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let result = if self.eat_word("AS") {
            Some(self.expect_identifier("a result variable")?)
        } else {
            None
        };
        Ok(Statement::ApiRequest {
            method,
            url,
            body,
            result,
            line,
        })
    }

    fn parse_data(&mut self, keyword: &str, line: usize) -> PResult<Statement> {
        let variable = self.expect_identifier("a variable name")?;
        self.expect_word("FROM")?;
        let table = self.parse_expression()?;
        let stmt = match keyword {
            "LOAD" => Statement::Load {
                variable,
                table,
                filter: self.parse_filter()?,
                line,
            },
            "ROW" => {
                let pick = if self.eat_word("FIRST") {
                    Some(RowPick::First)
                } else if self.eat_word("LAST") {
                    Some(RowPick::Last)
                } else if self.eat_word("RANDOM") {
                    Some(RowPick::Random)
                } else {
                    None
                };
                Statement::Row {
                    variable,
                    table,
                    pick,
                    filter: self.parse_filter()?,
                    line,
                }
            }
            "ROWS" => {
                let filter = self.parse_filter()?;
                let limit = if self.eat_word("LIMIT") {
                    Some(self.parse_count()?)
                } else {
                    None
                };
                Statement::Rows {
                    variable,
                    table,
                    filter,
                    limit,
                    line,
                }
            }
            "COLUMN" => {
                self.expect_word("FIELD")?;
                let column = self.parse_expression()?;
                Statement::Column {
                    variable,
                    table,
                    column,
                    filter: self.parse_filter()?,
                    line,
                }
            }
            _ => Statement::Count {
                variable,
                table,
                filter: self.parse_filter()?,
                line,
            },
        };
        Ok(stmt)
    }

    fn parse_filter(&mut self) -> PResult<Option<DataFilter>> {
        if !self.eat_word("WHERE") {
            return Ok(None);
        }
        let column = self.expect_identifier("a column name")?;
        let comparison = self.parse_comparison()?;
        let value = self.parse_expression()?;
        Ok(Some(DataFilter {
            column,
            comparison,
            value,
        }))
    }

    fn parse_perform(&mut self, line: usize) -> PResult<Statement> {
        let page = self.expect_identifier("a page name")?;
        self.expect_kind(&TokenKind::Dot, "'.'")?;
        let action = self.expect_identifier("an action name")?;
        let args = if self.eat_word("WITH") {
            self.parse_expression_list()?
        } else {
            Vec::new()
        };
        let result = if self.eat_word("AS") {
            Some(self.expect_identifier("a result variable")?)
        } else {
            None
        };
        Ok(Statement::Perform {
            page,
            action,
            args,
            result,
            line,
        })
    }

    // ── Blocks ──────────────────────────────────────────────────────

    fn expect_block_open(&mut self, line: usize) -> PResult<()> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::LBrace && token.line() == line => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error_here("Expected '{' at end of block header".to_string())),
        }
    }

    fn parse_for_each(&mut self, line: usize) -> PResult<Statement> {
        self.expect_word("EACH")?;
        let variable = self.expect_identifier("a loop variable")?;
        self.expect_word("IN")?;
        let collection = self.expect_identifier("a collection name")?;
        self.expect_block_open(line)?;
        let (body, _) = self.parse_statement_list()?;
        Ok(Statement::ForEach {
            variable,
            collection,
            body,
            line,
        })
    }

    fn parse_repeat(&mut self, line: usize) -> PResult<Statement> {
        let times = self.parse_expression()?;
        self.expect_word("TIMES")?;
        self.expect_block_open(line)?;
        let (body, _) = self.parse_statement_list()?;
        Ok(Statement::Repeat { times, body, line })
    }

    fn parse_if(&mut self, line: usize) -> PResult<Statement> {
        let condition = self.parse_condition()?;
        self.expect_block_open(line)?;
        let (then_body, close_line) = self.parse_statement_list()?;
        let mut else_body = Vec::new();
        let mut else_line = None;
        if self
            .peek()
            .is_some_and(|t| t.is_word("ELSE") && t.line() == close_line)
        {
            self.pos += 1;
            self.expect_block_open(close_line)?;
            else_line = Some(close_line);
            else_body = self.parse_statement_list()?.0;
        }
        Ok(Statement::If {
            condition,
            then_body,
            else_body,
            else_line,
            line,
        })
    }

    fn parse_try(&mut self, line: usize) -> PResult<Statement> {
        self.expect_block_open(line)?;
        let (try_body, close_line) = self.parse_statement_list()?;
        match self.peek() {
            Some(token) if token.is_word("CATCH") && token.line() == close_line => {
                self.pos += 1;
            }
            _ => return Err(self.error_here("Expected CATCH after TRY block".to_string())),
        }
        self.expect_block_open(close_line)?;
        let (catch_body, _) = self.parse_statement_list()?;
        Ok(Statement::TryCatch {
            try_body,
            catch_body,
            catch_line: close_line,
            line,
        })
    }

    fn parse_condition(&mut self) -> PResult<Condition> {
        let saved = self.pos;
        if let Ok(target) = self.parse_target() {
            if self.eat_word("IS") {
                let negated = self.eat_word("NOT");
                let state = self.parse_element_state()?;
                return Ok(Condition::Element {
                    target,
                    negated,
                    state,
                });
            }
        }
        self.pos = saved;
        let left = self.parse_expression()?;
        let comparison = self.parse_comparison()?;
        let right = self.parse_expression()?;
        Ok(Condition::Compare {
            left,
            comparison,
            right,
        })
    }

    // ── Operands ────────────────────────────────────────────────────

    fn parse_element_state(&mut self) -> PResult<ElementState> {
        let word = self.expect_identifier("an element state")?;
        match ElementState::from_keyword(&word) {
            Some(state) => Ok(state),
            None => {
                self.pos -= 1;
                Err(self.error_here(format!("Unknown element state '{}'", word)))
            }
        }
    }

    fn parse_string_match(&mut self) -> PResult<StringMatch> {
        let word = self.expect_identifier("CONTAINS, EQUALS or MATCHES")?;
        match StringMatch::from_keyword(&word) {
            Some(mode) => Ok(mode),
            None => {
                self.pos -= 1;
                Err(self.error_here("Expected CONTAINS, EQUALS or MATCHES".to_string()))
            }
        }
    }

    fn parse_comparison(&mut self) -> PResult<Comparison> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Op(op)) => {
                let op = *op;
                self.pos += 1;
                Ok(op)
            }
            Some(TokenKind::Word(w)) if w == "CONTAINS" => {
                self.pos += 1;
                Ok(Comparison::Contains)
            }
            _ => Err(self.error_here("Expected a comparison operator".to_string())),
        }
    }

    fn parse_count(&mut self) -> PResult<usize> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => {
                let n = *n as usize;
                self.pos += 1;
                Ok(n)
            }
            _ => Err(self.error_here("Expected a whole number".to_string())),
        }
    }

    fn parse_expression_list(&mut self) -> PResult<Vec<Expression>> {
        let mut items = vec![self.parse_expression()?];
        while self.eat_kind(&TokenKind::Comma) {
            items.push(self.parse_expression()?);
        }
        Ok(items)
    }

    fn parse_expression(&mut self) -> PResult<Expression> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("Expected a value".to_string()));
        };
        let expr = match &token.kind {
            TokenKind::Str(s) => Expression::String(s.clone()),
            TokenKind::Number(n) => Expression::Number(*n),
            TokenKind::Variable { page, name } => Expression::Variable {
                page: page.clone(),
                name: name.clone(),
            },
            TokenKind::Env(name) => Expression::Env { name: name.clone() },
            TokenKind::Word(w) if w == "TRUE" => Expression::Boolean(true),
            TokenKind::Word(w) if w == "FALSE" => Expression::Boolean(false),
            TokenKind::Word(page) if self.at_page_member() => {
                let page = page.clone();
                self.pos += 2;
                let name = self.expect_identifier("a member name")?;
                return Ok(Expression::Variable {
                    page: Some(page),
                    name,
                });
            }
            _ => return Err(self.error_here("Expected a value".to_string())),
        };
        self.pos += 1;
        Ok(expr)
    }

    /// `Word . Word` starting at the current token.
    fn at_page_member(&self) -> bool {
        matches!(
            (self.peek_at(1), self.peek_at(2)),
            (
                Some(Token {
                    kind: TokenKind::Dot,
                    ..
                }),
                Some(Token {
                    kind: TokenKind::Word(_),
                    ..
                })
            )
        )
    }

    fn parse_target(&mut self) -> PResult<Target> {
        let Some(token) = self.peek() else {
            return Err(self.error_here("Expected a target".to_string()));
        };
        match &token.kind {
            TokenKind::Str(text) => {
                self.pos += 1;
                Ok(Target::Text(text.clone()))
            }
            TokenKind::Word(page) if self.at_page_member() => {
                let page = page.clone();
                self.pos += 2;
                let field = self.expect_identifier("a field name")?;
                Ok(Target::PageField { page, field })
            }
            TokenKind::Word(word) => {
                let Some(kind) = SelectorKind::from_keyword(word) else {
                    return Err(self.error_here("Expected a target".to_string()));
                };
                self.pos += 1;
                let value = match self.advance() {
                    Some(Token {
                        kind: TokenKind::Str(value),
                        ..
                    }) => value.clone(),
                    _ => {
                        self.pos -= 1;
                        return Err(self.error_here("Expected a selector string".to_string()));
                    }
                };
                let modifiers = self.parse_modifiers()?;
                Ok(Target::Selector {
                    kind,
                    value,
                    modifiers,
                })
            }
            _ => Err(self.error_here("Expected a target".to_string())),
        }
    }

    fn parse_modifiers(&mut self) -> PResult<Vec<SelectorModifier>> {
        let mut modifiers = Vec::new();
        loop {
            if self.eat_word("FIRST") {
                modifiers.push(SelectorModifier::First);
            } else if self.eat_word("LAST") {
                modifiers.push(SelectorModifier::Last);
            } else if self.eat_word("NTH") {
                modifiers.push(SelectorModifier::Nth(self.parse_count()?));
            } else if self.at_word("WITH") && self.peek_at(1).is_some_and(|t| t.is_word("TEXT")) {
                self.pos += 2;
                modifiers.push(SelectorModifier::WithText(self.expect_string()?));
            } else if self.at_word("WITHOUT") {
                self.pos += 1;
                self.expect_word("TEXT")?;
                modifiers.push(SelectorModifier::WithoutText(self.expect_string()?));
            } else {
                return Ok(modifiers);
            }
        }
    }

    fn expect_string(&mut self) -> PResult<String> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Str(s),
                ..
            }) => {
                self.pos += 1;
                Ok(s.clone())
            }
            _ => Err(self.error_here("Expected a string".to_string())),
        }
    }
}
