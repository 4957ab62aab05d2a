use crate::error::ParseError;
use crate::flatten::{FlatStep, ScenarioView};
use crate::history::ContentHistory;

/// Everything the visual builder renders from.
#[derive(Debug, Clone, Default)]
pub struct BuilderState {
    pub scenarios: Vec<ScenarioView>,
    pub active_scenario: usize,
    pub selected_step_id: Option<String>,
    pub parse_errors: Vec<ParseError>,
    pub history: ContentHistory,
    pub source: String,
    /// Line of a just-inserted step, selected after the next parse.
    pub pending_select_line: Option<usize>,
}

impl BuilderState {
    pub fn new(history: ContentHistory) -> Self {
        BuilderState {
            history,
            ..Default::default()
        }
    }

    pub fn active(&self) -> Option<&ScenarioView> {
        self.scenarios.get(self.active_scenario)
    }

    pub fn selected_step(&self) -> Option<&FlatStep> {
        let id = self.selected_step_id.as_deref()?;
        self.active()?.step(id)
    }
}

#[derive(Debug, Clone)]
pub enum BuilderAction {
    /// Source replaced from outside (file open, raw text typing); no history.
    Loaded(String),
    /// Source replaced by an editor operation; the old text goes to history.
    Edited(String),
    /// Fresh parse of the current source.
    Parsed {
        scenarios: Vec<ScenarioView>,
        errors: Vec<ParseError>,
    },
    Undo,
    Redo,
    SelectStep(Option<String>),
    SetActiveScenario(usize),
    SetPendingSelect(Option<usize>),
}

/// Advance the builder state by one action.
pub fn reduce(mut state: BuilderState, action: BuilderAction) -> BuilderState {
    match action {
        BuilderAction::Loaded(source) => {
            state.source = source;
        }
        BuilderAction::Edited(source) => {
            let previous = std::mem::replace(&mut state.source, source);
            state.history.record(previous);
        }
        BuilderAction::Parsed { scenarios, errors } => {
            state.scenarios = scenarios;
            state.parse_errors = errors;
            if state.active_scenario >= state.scenarios.len() {
                state.active_scenario = state.scenarios.len().saturating_sub(1);
            }
            if let Some(line) = state.pending_select_line.take() {
                state.selected_step_id = state
                    .active()
                    .and_then(|view| view.step_at_line(line))
                    .map(|step| step.id.clone());
            }
            if state.selected_step().is_none() {
                state.selected_step_id = None;
            }
        }
        BuilderAction::Undo => {
            let current = state.source.clone();
            if let Some(previous) = state.history.undo(current) {
                state.source = previous;
            }
        }
        BuilderAction::Redo => {
            let current = state.source.clone();
            if let Some(next) = state.history.redo(current) {
                state.source = next;
            }
        }
        BuilderAction::SelectStep(id) => {
            state.selected_step_id = id;
            if state.selected_step().is_none() {
                state.selected_step_id = None;
            }
        }
        BuilderAction::SetActiveScenario(index) => {
            if index < state.scenarios.len() && index != state.active_scenario {
                state.active_scenario = index;
                state.selected_step_id = None;
            }
        }
        BuilderAction::SetPendingSelect(line) => {
            state.pending_select_line = line;
        }
    }
    state
}
