pub mod ast;
pub mod config;
pub mod editor;
pub mod emitter;
pub mod error;
pub mod factory;
pub mod field_value;
pub mod fields;
pub mod flatten;
pub mod history;
pub mod lexer;
pub mod parser;
pub mod state;
pub mod text;

pub use config::EditorConfig;
pub use editor::ScriptEditor;
pub use error::{EditError, ParseError};
pub use flatten::{FlatStep, ScenarioView};
pub use parser::{ScriptParser, VeroParser};

// ── Core API ───────────────────────────────────────────────────────

/// The visual-builder view of some Vero source.
pub struct BuilderView {
    pub scenarios: Vec<ScenarioView>,
    pub errors: Vec<ParseError>,
}

/// Parse `source` and flatten every scenario into addressable steps.
/// Scenarios touched by a parse error come back with no steps.
pub fn build_view(source: &str) -> BuilderView {
    let parsed = parser::parse_source(source);
    let scenarios = flatten::flatten_program(&parsed.program, &parsed.errors);
    BuilderView {
        scenarios,
        errors: parsed.errors,
    }
}

/// Re-emit `source` in canonical layout, or return its parse errors.
pub fn format_source(source: &str) -> Result<String, Vec<ParseError>> {
    let parsed = parser::parse_source(source);
    if parsed.errors.is_empty() {
        Ok(emitter::emit_program(&parsed.program))
    } else {
        Err(parsed.errors)
    }
}

#[cfg(test)]
mod tests;
