use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 0-based column (character offset within the line)
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

/// A tokenizer or parser error with span information (begin..end).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub code: String,
    pub message: String,
    /// Start of the offending region
    pub begin: Position,
    /// End of the offending region (exclusive)
    pub end: Position,
}

impl ParseError {
    pub fn lex_error(message: String, begin: Position, end: Position) -> Self {
        ParseError {
            code: "vero-lex-error".to_string(),
            message,
            begin,
            end,
        }
    }

    pub fn syntax_error(message: String, begin: Position, end: Position) -> Self {
        ParseError {
            code: "vero-syntax-error".to_string(),
            message,
            begin,
            end,
        }
    }

    /// Lines covered by this error, inclusive.
    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.begin.line..=self.end.line.max(self.begin.line)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.begin == self.end {
            write!(
                f,
                "{}:{}: {} ({})",
                self.begin.line, self.begin.column, self.message, self.code
            )
        } else {
            write!(
                f,
                "{}:{}-{}:{}: {} ({})",
                self.begin.line,
                self.begin.column,
                self.end.line,
                self.end.column,
                self.message,
                self.code
            )
        }
    }
}

impl std::error::Error for ParseError {}

/// Why an editor operation refused to touch the source.
///
/// A rejected operation leaves the text, the history and the selection
/// exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("source has {0} parse error(s); fix them before editing visually")]
    ParseErrors(usize),

    #[error("unknown field '{path}' for {kind} step")]
    UnknownField { path: String, kind: &'static str },

    #[error("block starting on line {line} has no matching closing brace")]
    UnterminatedBlock { line: usize },

    #[error("line {0} is outside the source")]
    LineOutOfRange(usize),

    #[error("no scenario at index {0}")]
    NoScenario(usize),

    #[error("step '{0}' no longer exists in the current source")]
    StaleStep(String),

    #[error("cannot move step {from} to {to}: scenario has {len} top-level steps")]
    MoveOutOfRange { from: usize, to: usize, len: usize },

    #[error("block on line {line} opens and closes on the same line")]
    SingleLineBlock { line: usize },

    #[error("line {line} also closes the enclosing block")]
    ClosesEnclosingBlock { line: usize },

    #[error("cannot tell the step on line {line} apart from the other text on that line")]
    AmbiguousStep { line: usize },

    #[error("'{0}' is not a valid name")]
    InvalidName(String),

    #[error("no feature to add a scenario to")]
    NoFeature,

    #[error("nothing to {0}")]
    HistoryEmpty(&'static str),
}
