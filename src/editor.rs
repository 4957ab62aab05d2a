//! Bidirectional editing: every visual operation becomes a minimal splice of
//! the source text, and the visible steps are always re-derived by parsing
//! the result. The text is the only source of truth.

use crate::ast::{Program, Statement};
use crate::config::EditorConfig;
use crate::emitter::{emit_statement, INDENT};
use crate::error::EditError;
use crate::fields::{field_slot_mut, FieldPath};
use crate::flatten::{flatten_program, resolve_path, BlockLabel, FlatStep, ScenarioView};
use crate::history::ContentHistory;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::parser::{ScriptParser, VeroParser};
use crate::state::{reduce, BuilderAction, BuilderState};
use crate::text::{
    delete_lines, find_block_end_line, get_indent, get_line, insert_lines, replace_lines,
    splice_line,
};
use std::ops::Range;
use tracing::{debug, trace, warn};

/// Receives the full source after every editor-originated change.
pub type ContentListener = Box<dyn FnMut(&str)>;

pub struct ScriptEditor<P: ScriptParser = VeroParser> {
    parser: P,
    config: EditorConfig,
    state: BuilderState,
    listener: Option<ContentListener>,
}

impl ScriptEditor<VeroParser> {
    pub fn new(source: &str) -> Self {
        Self::with_parser(VeroParser, EditorConfig::default(), source)
    }
}

impl<P: ScriptParser> ScriptEditor<P> {
    pub fn with_parser(parser: P, config: EditorConfig, source: &str) -> Self {
        let history = ContentHistory::new(config.history_limit);
        let mut editor = ScriptEditor {
            parser,
            config,
            state: BuilderState::new(history),
            listener: None,
        };
        editor.load(source);
        editor
    }

    /// Register the owner of the text. It is called with the new source
    /// after each successful edit, undo and redo, but not after `load`.
    pub fn on_content_change(&mut self, listener: impl FnMut(&str) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn source(&self) -> &str {
        &self.state.source
    }

    pub fn scenarios(&self) -> &[ScenarioView] {
        &self.state.scenarios
    }

    pub fn active_scenario(&self) -> Option<&ScenarioView> {
        self.state.active()
    }

    pub fn selected_step(&self) -> Option<&FlatStep> {
        self.state.selected_step()
    }

    pub fn can_undo(&self) -> bool {
        self.state.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state.history.can_redo()
    }

    /// Replace the source from outside the builder (file open, typing in
    /// the text pane). This is not an undoable edit.
    pub fn load(&mut self, source: &str) {
        self.dispatch(BuilderAction::Loaded(source.to_string()));
        self.reparse();
    }

    pub fn select_step(&mut self, id: Option<&str>) {
        self.dispatch(BuilderAction::SelectStep(id.map(str::to_string)));
    }

    pub fn set_active_scenario(&mut self, index: usize) -> Result<(), EditError> {
        if index >= self.state.scenarios.len() {
            return Err(rejected("set_active_scenario", EditError::NoScenario(index)));
        }
        self.dispatch(BuilderAction::SetActiveScenario(index));
        Ok(())
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Set one field of `step` from form input and rewrite its line.
    pub fn edit_field(&mut self, step: &FlatStep, path: &str, raw: &str) -> Result<(), EditError> {
        let result = self.try_edit_field(step, path, raw);
        log_outcome("edit_field", result)
    }

    /// Remove `step`, including every line of a block statement.
    pub fn delete_step(&mut self, step: &FlatStep) -> Result<(), EditError> {
        let result = self.try_delete_step(step);
        log_outcome("delete_step", result)
    }

    /// Insert `statement` after `after`, or at the top of the active
    /// scenario when `after` is `None`. The new step is selected once the
    /// source has been reparsed.
    pub fn add_step(&mut self, after: Option<&FlatStep>, statement: Statement) -> Result<(), EditError> {
        let result = self.try_add_step(after, statement);
        log_outcome("add_step", result)
    }

    /// Reorder the top-level statements of the active scenario.
    pub fn move_step(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        let result = self.try_move_step(from, to);
        log_outcome("move_step", result)
    }

    /// Append an empty scenario to the feature holding the active one and
    /// make it active.
    pub fn add_scenario(&mut self, name: &str) -> Result<(), EditError> {
        let result = self.try_add_scenario(name);
        log_outcome("add_scenario", result)
    }

    pub fn undo(&mut self) -> Result<(), EditError> {
        if !self.state.history.can_undo() {
            return Err(rejected("undo", EditError::HistoryEmpty("undo")));
        }
        self.dispatch(BuilderAction::Undo);
        self.after_change();
        debug!(undo = self.state.history.undo_len(), "undo");
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), EditError> {
        if !self.state.history.can_redo() {
            return Err(rejected("redo", EditError::HistoryEmpty("redo")));
        }
        self.dispatch(BuilderAction::Redo);
        self.after_change();
        debug!(redo = self.state.history.redo_len(), "redo");
        Ok(())
    }

    // ── Implementation ──────────────────────────────────────────────

    fn try_edit_field(&mut self, step: &FlatStep, path: &str, raw: &str) -> Result<(), EditError> {
        self.ensure_clean()?;
        self.ensure_current(step)?;
        let path = FieldPath::parse(&step.statement, path)?;

        let mut updated = step.statement.clone();
        if let Some(slot) = field_slot_mut(&mut updated, path.as_str()) {
            slot.assign(raw)?;
        }

        let source = &self.state.source;
        let line = step.line;
        let current = get_line(source, line).ok_or(EditError::LineOutOfRange(line))?;
        let span = statement_span(source, line, &step.statement)?;
        let mut replacement = current.to_string();
        replacement.replace_range(span.range, &header_line(&updated, ""));

        if replacement == current {
            trace!(line, "edit produced identical text");
            return Ok(());
        }
        let next = splice_line(source, line, &replacement);
        debug!(line, field = path.as_str(), "field edited");
        self.apply_edit(next);
        Ok(())
    }

    fn try_delete_step(&mut self, step: &FlatStep) -> Result<(), EditError> {
        self.ensure_clean()?;
        self.ensure_current(step)?;
        let source = &self.state.source;
        let start = step.statement.line();

        let next = if step.statement.is_block() {
            let end = find_block_end_line(source, start)?;
            delete_lines(source, start, end)
        } else {
            let current = get_line(source, start).ok_or(EditError::LineOutOfRange(start))?;
            let span = statement_span(source, start, &step.statement)?;
            if span.alone {
                delete_lines(source, start, start)
            } else {
                let mut rest = current.to_string();
                rest.replace_range(span.range, "");
                splice_line(source, start, &rest)
            }
        };

        debug!(line = start, kind = step.kind.tag(), "step deleted");
        self.dispatch(BuilderAction::SelectStep(None));
        self.apply_edit(next);
        Ok(())
    }

    fn try_add_step(&mut self, after: Option<&FlatStep>, statement: Statement) -> Result<(), EditError> {
        self.ensure_clean()?;
        let (after_line, indent) = match after {
            Some(step) => {
                self.ensure_current(step)?;
                self.insertion_point(step)?
            }
            None => {
                let scenario = self
                    .state
                    .active()
                    .ok_or(EditError::NoScenario(self.state.active_scenario))?;
                if find_block_end_line(&self.state.source, scenario.line)? == scenario.line {
                    return Err(EditError::SingleLineBlock {
                        line: scenario.line,
                    });
                }
                (scenario.line, self.config.step_indent.clone())
            }
        };

        let lines = emit_statement(&statement, &indent);
        let next = insert_lines(&self.state.source, after_line, &lines);
        debug!(after_line, kind = statement.kind().tag(), "step added");
        self.dispatch(BuilderAction::SetPendingSelect(Some(after_line + 1)));
        self.apply_edit(next);
        Ok(())
    }

    /// The line to insert after, and the indentation to insert with.
    fn insertion_point(&self, step: &FlatStep) -> Result<(usize, String), EditError> {
        let source = &self.state.source;
        let (header, body) = match (&step.statement, step.block_label) {
            (Statement::TryCatch { catch_body, catch_line, .. }, Some(BlockLabel::Catch)) => {
                (*catch_line, Some(catch_body.as_slice()))
            }
            (stmt, _) => (step.line, stmt.primary_body()),
        };

        match body {
            Some(body) => match body.last() {
                Some(last) => {
                    let end = ensure_open_after(source, last)?;
                    Ok((end, get_indent(source, last.line()).to_string()))
                }
                None => {
                    // Nothing but the block's own braces may close on its header.
                    let tokens = line_tokens(source, header);
                    let open = tokens
                        .iter()
                        .rposition(|t| t.kind == TokenKind::LBrace)
                        .map_or(tokens.len(), |i| i + 1);
                    if closes_enclosing(&tokens[open..]) {
                        return Err(EditError::SingleLineBlock { line: header });
                    }
                    Ok((header, format!("{}{}", get_indent(source, header), INDENT)))
                }
            },
            None => {
                let end = ensure_open_after(source, &step.statement)?;
                Ok((end, get_indent(source, step.line).to_string()))
            }
        }
    }

    fn try_move_step(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        self.ensure_clean()?;
        let source = self.state.source.clone();
        let program = self.parse_clean(&source)?;
        let index = self.state.active_scenario;
        let scenario = program
            .scenarios()
            .nth(index)
            .ok_or(EditError::NoScenario(index))?;

        let len = scenario.statements.len();
        if from >= len || to >= len {
            return Err(EditError::MoveOutOfRange { from, to, len });
        }
        if from == to {
            return Ok(());
        }

        let close = find_block_end_line(&source, scenario.line)?;
        if close == scenario.line {
            return Err(EditError::SingleLineBlock {
                line: scenario.line,
            });
        }

        let mut order: Vec<(&Statement, &str)> = scenario
            .statements
            .iter()
            .map(|stmt| (stmt, get_indent(&source, stmt.line())))
            .collect();
        let moved = order.remove(from);
        order.insert(to, moved);

        let mut body = Vec::new();
        let mut moved_line = scenario.line + 1;
        for (i, (stmt, indent)) in order.iter().enumerate() {
            if i == to {
                moved_line = scenario.line + 1 + body.len();
            }
            body.extend(emit_statement(stmt, indent));
        }

        let next = replace_lines(&source, scenario.line + 1, close - 1, &body);
        debug!(from, to, scenario = scenario.name.as_str(), "step moved");
        self.dispatch(BuilderAction::SetPendingSelect(Some(moved_line)));
        self.apply_edit(next);
        Ok(())
    }

    fn try_add_scenario(&mut self, name: &str) -> Result<(), EditError> {
        self.ensure_clean()?;
        let source = self.state.source.clone();
        let program = self.parse_clean(&source)?;

        // Feature holding the active scenario, and how many scenarios
        // precede the insertion point.
        let mut seen = 0;
        let mut target = None;
        for (fi, feature) in program.features.iter().enumerate() {
            seen += feature.scenarios.len();
            if self.state.active_scenario < seen {
                target = Some((fi, seen));
                break;
            }
        }
        let (fi, new_index) = match target {
            Some(found) => found,
            None => (0, program.features.first().map_or(0, |f| f.scenarios.len())),
        };
        let feature = program.features.get(fi).ok_or(EditError::NoFeature)?;

        let close = find_block_end_line(&source, feature.line)?;
        if close == feature.line {
            return Err(EditError::SingleLineBlock { line: feature.line });
        }

        let mut scenario_name: String = name
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if scenario_name.is_empty() {
            scenario_name = self.config.default_scenario_name.clone();
        }
        let indent = format!("{}{}", get_indent(&source, feature.line), INDENT);
        let lines = vec![
            String::new(),
            format!("{}SCENARIO {} {{", indent, scenario_name),
            format!("{}}}", indent),
        ];

        let next = insert_lines(&source, close - 1, &lines);
        debug!(feature = feature.name.as_str(), scenario = scenario_name.as_str(), "scenario added");
        self.apply_edit(next);
        self.dispatch(BuilderAction::SetActiveScenario(new_index));
        Ok(())
    }

    // ── Plumbing ────────────────────────────────────────────────────

    /// Record the edit in history, hand the text to its owner and reparse.
    fn apply_edit(&mut self, next: String) {
        self.dispatch(BuilderAction::Edited(next));
        self.after_change();
    }

    fn after_change(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.state.source);
        }
        self.reparse();
    }

    fn reparse(&mut self) {
        let parsed = self.parser.parse_source(&self.state.source);
        let scenarios = flatten_program(&parsed.program, &parsed.errors);
        trace!(
            scenarios = scenarios.len(),
            errors = parsed.errors.len(),
            "source reparsed"
        );
        self.dispatch(BuilderAction::Parsed {
            scenarios,
            errors: parsed.errors,
        });
    }

    fn dispatch(&mut self, action: BuilderAction) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    fn parse_clean(&self, source: &str) -> Result<Program, EditError> {
        let parsed = self.parser.parse_source(source);
        if parsed.errors.is_empty() {
            Ok(parsed.program)
        } else {
            Err(EditError::ParseErrors(parsed.errors.len()))
        }
    }

    fn ensure_clean(&self) -> Result<(), EditError> {
        match self.state.parse_errors.len() {
            0 => Ok(()),
            n => Err(EditError::ParseErrors(n)),
        }
    }

    /// A step taken from an earlier parse must still describe the source.
    fn ensure_current(&self, step: &FlatStep) -> Result<(), EditError> {
        let stale = || EditError::StaleStep(step.id.clone());
        let view = self.state.active().ok_or_else(stale)?;
        let current = view.step(&step.id).ok_or_else(stale)?;
        if current.line != step.line || current.statement != step.statement {
            return Err(stale());
        }
        let parsed = self.parser.parse_source(&self.state.source);
        let scenario = parsed
            .program
            .scenarios()
            .nth(self.state.active_scenario)
            .ok_or_else(stale)?;
        match resolve_path(&scenario.statements, &step.statement_path) {
            Some(found) if *found == step.statement => Ok(()),
            _ => Err(stale()),
        }
    }
}

/// First emitted line of `stmt`: the whole statement for leaves, the
/// opening header for blocks.
fn header_line(stmt: &Statement, indent: &str) -> String {
    emit_statement(stmt, indent)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Where a statement's own text sits on `line`: a whole leaf, or a block
/// header through its opening brace.
struct LineSpan {
    /// Byte range within the line.
    range: Range<usize>,
    /// No other token shares the line.
    alone: bool,
}

fn line_tokens(source: &str, line: usize) -> Vec<Token> {
    tokenize(source)
        .tokens
        .into_iter()
        .filter(|t| t.line() == line)
        .collect()
}

fn is_brace(token: &Token) -> bool {
    matches!(token.kind, TokenKind::LBrace | TokenKind::RBrace)
}

/// Locate `stmt` among the tokens of `line`. Braces split the line into
/// runs; the statement is the run starting with its keyword. When several
/// runs qualify, only one spelled exactly as the emitter writes it is
/// accepted.
fn statement_span(source: &str, line: usize, stmt: &Statement) -> Result<LineSpan, EditError> {
    let current = get_line(source, line).ok_or(EditError::LineOutOfRange(line))?;
    let tokens = line_tokens(source, line);
    let header = header_line(stmt, "");
    let keyword = header.split_whitespace().next().unwrap_or_default();
    let block = stmt.is_block();

    let mut runs = Vec::new();
    let mut first = 0;
    for (i, token) in tokens.iter().enumerate() {
        if is_brace(token) {
            if first < i {
                runs.push((first, i));
            }
            first = i + 1;
        }
    }
    if first < tokens.len() {
        runs.push((first, tokens.len()));
    }

    let candidates: Vec<LineSpan> = runs
        .into_iter()
        .filter(|&(first, _)| tokens[first].is_word(keyword))
        .filter_map(|(first, end)| {
            let opens = tokens
                .get(end)
                .is_some_and(|t| t.kind == TokenKind::LBrace);
            let last = match (block, opens) {
                (true, true) => end,
                (false, false) => end - 1,
                _ => return None,
            };
            Some(LineSpan {
                range: tokens[first].begin.column..tokens[last].end.column,
                alone: first == 0 && last + 1 == tokens.len(),
            })
        })
        .collect();

    let mut found: Vec<LineSpan> = if candidates.len() > 1 {
        candidates
            .into_iter()
            .filter(|span| current.get(span.range.clone()) == Some(header.as_str()))
            .collect()
    } else {
        candidates
    };
    match found.len() {
        1 => Ok(found.remove(0)),
        _ => Err(EditError::AmbiguousStep { line }),
    }
}

/// Whether `tokens` close a block they did not open.
fn closes_enclosing(tokens: &[Token]) -> bool {
    let mut depth = 0usize;
    for token in tokens {
        match &token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace if depth == 0 => return true,
            TokenKind::RBrace => depth -= 1,
            _ => {}
        }
    }
    false
}

/// The last line of `stmt`, provided that nothing after the statement on
/// that line closes the block around it. Lines inserted after it then stay
/// inside that block.
fn ensure_open_after(source: &str, stmt: &Statement) -> Result<usize, EditError> {
    let line = stmt.line();
    let span = statement_span(source, line, stmt)?;
    let tokens = tokenize(source).tokens;
    let at = tokens
        .iter()
        .position(|t| t.line() == line && t.end.column == span.range.end)
        .ok_or(EditError::AmbiguousStep { line })?;

    let mut next = at + 1;
    if stmt.is_block() {
        let mut depth = 1usize;
        while depth > 0 {
            let token = tokens.get(next).ok_or(EditError::UnterminatedBlock { line })?;
            match &token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
            next += 1;
            let continues = tokens
                .get(next)
                .is_some_and(|t| t.is_word("ELSE") || t.is_word("CATCH"));
            if depth == 0 && continues {
                // `} ELSE {` and `} CATCH {` reopen the same statement.
                next += 2;
                depth = 1;
            }
        }
    }

    let end = tokens[next - 1].line();
    let rest: Vec<Token> = tokens[next..]
        .iter()
        .take_while(|t| t.line() == end)
        .cloned()
        .collect();
    if closes_enclosing(&rest) {
        Err(EditError::ClosesEnclosingBlock { line: end })
    } else {
        Ok(end)
    }
}

fn rejected(op: &'static str, err: EditError) -> EditError {
    warn!(op, error = %err, "edit rejected");
    err
}

fn log_outcome(op: &'static str, result: Result<(), EditError>) -> Result<(), EditError> {
    result.map_err(|err| rejected(op, err))
}
