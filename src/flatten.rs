use crate::ast::*;
use crate::error::ParseError;
use serde::{Serialize, Serializer};

/// Which nested body of a block statement a path segment descends into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// `FOR EACH` / `REPEAT` body
    Loop,
    Try,
    Catch,
    Then,
    Else,
}

impl BodyKind {
    /// Negative marker used in the integer form of a path; never collides
    /// with a sibling index.
    pub fn sentinel(self) -> i64 {
        match self {
            BodyKind::Loop => -1,
            BodyKind::Try => -2,
            BodyKind::Catch => -3,
            BodyKind::Then => -4,
            BodyKind::Else => -5,
        }
    }

    pub fn from_sentinel(value: i64) -> Option<Self> {
        match value {
            -1 => Some(BodyKind::Loop),
            -2 => Some(BodyKind::Try),
            -3 => Some(BodyKind::Catch),
            -4 => Some(BodyKind::Then),
            -5 => Some(BodyKind::Else),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Index(usize),
    Body(BodyKind),
}

/// Location of a statement inside the nested AST of one scenario:
/// sibling indices interleaved with the body each index descends into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StatementPath(Vec<PathSegment>);

impl StatementPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    fn child(&self, segment: PathSegment) -> StatementPath {
        let mut segments = self.0.clone();
        segments.push(segment);
        StatementPath(segments)
    }

    /// Integer form: indices as-is, bodies as their negative sentinels.
    pub fn to_sentinels(&self) -> Vec<i64> {
        self.0
            .iter()
            .map(|segment| match segment {
                PathSegment::Index(i) => *i as i64,
                PathSegment::Body(kind) => kind.sentinel(),
            })
            .collect()
    }

    pub fn from_sentinels(values: &[i64]) -> Option<StatementPath> {
        values
            .iter()
            .map(|&v| {
                if v >= 0 {
                    Some(PathSegment::Index(v as usize))
                } else {
                    BodyKind::from_sentinel(v).map(PathSegment::Body)
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(StatementPath)
    }
}

impl Serialize for StatementPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_sentinels().serialize(serializer)
    }
}

/// Decode `path` into the statement it addresses.
pub fn resolve_path<'a>(statements: &'a [Statement], path: &StatementPath) -> Option<&'a Statement> {
    resolve_segments(statements, path.segments())
}

fn resolve_segments<'a>(statements: &'a [Statement], path: &[PathSegment]) -> Option<&'a Statement> {
    match path {
        [PathSegment::Index(i)] => statements.get(*i),
        [PathSegment::Index(i), PathSegment::Body(kind), rest @ ..] => {
            let body = body_of(statements.get(*i)?, *kind)?;
            resolve_segments(body, rest)
        }
        _ => None,
    }
}

fn body_of(stmt: &Statement, kind: BodyKind) -> Option<&[Statement]> {
    match (stmt, kind) {
        (Statement::ForEach { body, .. }, BodyKind::Loop)
        | (Statement::Repeat { body, .. }, BodyKind::Loop) => Some(body),
        (Statement::TryCatch { try_body, .. }, BodyKind::Try) => Some(try_body),
        (Statement::TryCatch { catch_body, .. }, BodyKind::Catch) => Some(catch_body),
        (Statement::If { then_body, .. }, BodyKind::Then) => Some(then_body),
        (Statement::If { else_body, .. }, BodyKind::Else) => Some(else_body),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockLabel {
    #[serde(rename = "TRY")]
    Try,
    #[serde(rename = "CATCH")]
    Catch,
}

impl BlockLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockLabel::Try => "TRY",
            BlockLabel::Catch => "CATCH",
        }
    }
}

/// One addressable row of the visual step list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatStep {
    pub id: String,
    /// Hierarchical display number, e.g. `2.1`
    pub number: String,
    pub depth: usize,
    pub category: StepCategory,
    pub kind: StatementKind,
    pub statement: Statement,
    pub line: usize,
    pub statement_path: StatementPath,
    /// Set on the synthetic `TRY` / `CATCH` header rows.
    pub block_label: Option<BlockLabel>,
}

/// One parsed scenario and its flattened steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioView {
    pub name: String,
    pub feature: String,
    pub tags: Vec<String>,
    pub annotations: Vec<String>,
    pub line: usize,
    pub end_line: usize,
    pub steps: Vec<FlatStep>,
}

impl ScenarioView {
    pub fn step(&self, id: &str) -> Option<&FlatStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_at_line(&self, line: usize) -> Option<&FlatStep> {
        self.steps.iter().find(|s| s.line == line)
    }
}

/// Flatten every scenario of `program`. A scenario whose lines contain a
/// parse error gets no steps.
pub fn flatten_program(program: &Program, errors: &[ParseError]) -> Vec<ScenarioView> {
    let mut views = Vec::new();
    for feature in &program.features {
        for scenario in &feature.scenarios {
            let broken = errors.iter().any(|err| {
                err.lines()
                    .any(|line| line >= scenario.line && line <= scenario.end_line)
            });
            let steps = if broken {
                Vec::new()
            } else {
                flatten_scenario(views.len(), &scenario.statements)
            };
            views.push(ScenarioView {
                name: scenario.name.clone(),
                feature: feature.name.clone(),
                tags: scenario.tags.clone(),
                annotations: scenario.annotations.clone(),
                line: scenario.line,
                end_line: scenario.end_line,
                steps,
            });
        }
    }
    views
}

/// Flatten one scenario's statements depth-first.
pub fn flatten_scenario(scenario_index: usize, statements: &[Statement]) -> Vec<FlatStep> {
    let mut flattener = Flattener {
        scenario_index,
        steps: Vec::new(),
    };
    let mut counter = 0;
    flattener.walk(statements, 0, "", &StatementPath::default(), &mut counter);
    flattener.steps
}

struct Flattener {
    scenario_index: usize,
    steps: Vec<FlatStep>,
}

impl Flattener {
    /// `counter` numbers siblings; it is shared between the bodies of one
    /// block so try/catch and then/else children number consecutively.
    fn walk(
        &mut self,
        statements: &[Statement],
        depth: usize,
        prefix: &str,
        parent: &StatementPath,
        counter: &mut usize,
    ) {
        for (i, stmt) in statements.iter().enumerate() {
            *counter += 1;
            let number = if prefix.is_empty() {
                counter.to_string()
            } else {
                format!("{}.{}", prefix, counter)
            };
            let path = parent.child(PathSegment::Index(i));
            let mut children = 0;

            match stmt {
                Statement::ForEach { body, .. } | Statement::Repeat { body, .. } => {
                    self.push(stmt, &number, depth, &path, None, stmt.line());
                    let body_path = path.child(PathSegment::Body(BodyKind::Loop));
                    self.walk(body, depth + 1, &number, &body_path, &mut children);
                }
                Statement::TryCatch {
                    try_body,
                    catch_body,
                    catch_line,
                    line,
                } => {
                    self.push(stmt, &number, depth, &path, Some(BlockLabel::Try), *line);
                    let try_path = path.child(PathSegment::Body(BodyKind::Try));
                    self.walk(try_body, depth + 1, &number, &try_path, &mut children);
                    self.push(stmt, &number, depth, &path, Some(BlockLabel::Catch), *catch_line);
                    let catch_path = path.child(PathSegment::Body(BodyKind::Catch));
                    self.walk(catch_body, depth + 1, &number, &catch_path, &mut children);
                }
                Statement::If {
                    then_body,
                    else_body,
                    ..
                } => {
                    self.push(stmt, &number, depth, &path, None, stmt.line());
                    let then_path = path.child(PathSegment::Body(BodyKind::Then));
                    self.walk(then_body, depth + 1, &number, &then_path, &mut children);
                    if !else_body.is_empty() {
                        let else_path = path.child(PathSegment::Body(BodyKind::Else));
                        self.walk(else_body, depth + 1, &number, &else_path, &mut children);
                    }
                }
                _ => self.push(stmt, &number, depth, &path, None, stmt.line()),
            }
        }
    }

    fn push(
        &mut self,
        stmt: &Statement,
        number: &str,
        depth: usize,
        path: &StatementPath,
        block_label: Option<BlockLabel>,
        line: usize,
    ) {
        let encoded = path
            .to_sentinels()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(".");
        let id = match block_label {
            Some(BlockLabel::Catch) => format!("s{}-{}-catch", self.scenario_index, encoded),
            _ => format!("s{}-{}", self.scenario_index, encoded),
        };
        self.steps.push(FlatStep {
            id,
            number: number.to_string(),
            depth,
            category: stmt.category(),
            kind: stmt.kind(),
            statement: stmt.clone(),
            line,
            statement_path: path.clone(),
            block_label,
        });
    }
}
