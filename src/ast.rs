/// Statement tree produced by the parser and consumed by the flattener,
/// emitter and editor. Every statement carries its 1-based source line;
/// `0` marks a node that has not been placed in a file yet.
use serde::Serialize;

/// A value appearing wherever a statement needs one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Expression {
    String(String),
    Number(f64),
    Boolean(bool),
    /// `{name}`, `{page.name}` or bare `Page.name`
    Variable { page: Option<String>, name: String },
    /// `{{NAME}}`
    Env { name: String },
}

impl Expression {
    pub fn string(s: impl Into<String>) -> Self {
        Expression::String(s.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable {
            page: None,
            name: name.into(),
        }
    }
}

/// How an element is located on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Target {
    /// `LoginPage.email`
    PageField { page: String, field: String },
    /// `css "#email" FIRST`
    Selector {
        kind: SelectorKind,
        value: String,
        modifiers: Vec<SelectorModifier>,
    },
    /// `"Sign in"`
    Text(String),
}

impl Target {
    pub fn text(s: impl Into<String>) -> Self {
        Target::Text(s.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectorKind {
    Css,
    Xpath,
    TestId,
    Role,
    Label,
    Placeholder,
    Alt,
    Title,
    Text,
}

impl SelectorKind {
    pub const ALL: [SelectorKind; 9] = [
        SelectorKind::Css,
        SelectorKind::Xpath,
        SelectorKind::TestId,
        SelectorKind::Role,
        SelectorKind::Label,
        SelectorKind::Placeholder,
        SelectorKind::Alt,
        SelectorKind::Title,
        SelectorKind::Text,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            SelectorKind::Css => "css",
            SelectorKind::Xpath => "xpath",
            SelectorKind::TestId => "testid",
            SelectorKind::Role => "role",
            SelectorKind::Label => "label",
            SelectorKind::Placeholder => "placeholder",
            SelectorKind::Alt => "alt",
            SelectorKind::Title => "title",
            SelectorKind::Text => "text",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == word)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum SelectorModifier {
    First,
    Last,
    Nth(usize),
    WithText(String),
    WithoutText(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementState {
    Visible,
    Hidden,
    Enabled,
    Disabled,
    Checked,
    Empty,
    Focused,
}

impl ElementState {
    pub const ALL: [ElementState; 7] = [
        ElementState::Visible,
        ElementState::Hidden,
        ElementState::Enabled,
        ElementState::Disabled,
        ElementState::Checked,
        ElementState::Empty,
        ElementState::Focused,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            ElementState::Visible => "VISIBLE",
            ElementState::Hidden => "HIDDEN",
            ElementState::Enabled => "ENABLED",
            ElementState::Disabled => "DISABLED",
            ElementState::Checked => "CHECKED",
            ElementState::Empty => "EMPTY",
            ElementState::Focused => "FOCUSED",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.keyword() == word)
    }
}

/// `HAS TEXT` (exact) vs `CONTAINS TEXT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextMatch {
    Exact,
    Contains,
}

/// Matching mode for URL and title assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StringMatch {
    Contains,
    Equals,
    Matches,
}

impl StringMatch {
    pub fn keyword(self) -> &'static str {
        match self {
            StringMatch::Contains => "CONTAINS",
            StringMatch::Equals => "EQUALS",
            StringMatch::Matches => "MATCHES",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "CONTAINS" => Some(StringMatch::Contains),
            "EQUALS" => Some(StringMatch::Equals),
            "MATCHES" => Some(StringMatch::Matches),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
}

impl Comparison {
    pub const ALL: [Comparison; 7] = [
        Comparison::Equal,
        Comparison::NotEqual,
        Comparison::Greater,
        Comparison::Less,
        Comparison::GreaterOrEqual,
        Comparison::LessOrEqual,
        Comparison::Contains,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::NotEqual => "!=",
            Comparison::Greater => ">",
            Comparison::Less => "<",
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessOrEqual => "<=",
            Comparison::Contains => "CONTAINS",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.symbol() == symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponsePart {
    Status,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn keyword(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

/// Which row `ROW` picks when several match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowPick {
    First,
    Last,
    Random,
}

/// `WHERE column op value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataFilter {
    pub column: String,
    pub comparison: Comparison,
    pub value: Expression,
}

/// The condition of an `IF` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// `t IS [NOT] VISIBLE`
    Element {
        target: Target,
        negated: bool,
        state: ElementState,
    },
    /// `e op e`
    Compare {
        left: Expression,
        comparison: Comparison,
        right: Expression,
    },
}

/// One script statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Statement {
    // Navigation
    Open { url: Expression, line: usize },
    Refresh { line: usize },
    GoBack { line: usize },
    GoForward { line: usize },
    SwitchToNewTab { url: Option<Expression>, line: usize },
    SwitchToTab { index: Expression, line: usize },
    CloseTab { line: usize },
    SwitchToFrame { target: Target, line: usize },
    SwitchToMainFrame { line: usize },

    // Actions
    Click { target: Target, line: usize },
    DoubleClick { target: Target, line: usize },
    RightClick { target: Target, line: usize },
    Fill { target: Target, value: Expression, line: usize },
    Clear { target: Target, line: usize },
    Check { target: Target, line: usize },
    Uncheck { target: Target, line: usize },
    Select { option: Expression, target: Target, line: usize },
    Hover { target: Target, line: usize },
    Focus { target: Target, line: usize },
    Press { key: Expression, line: usize },
    ScrollTo { target: Target, line: usize },
    Scroll { direction: ScrollDirection, line: usize },
    Drag { source: Target, destination: Target, line: usize },
    Upload { files: Vec<Expression>, target: Target, line: usize },

    // Waits
    Wait { duration: Expression, unit: TimeUnit, line: usize },
    WaitFor { target: Target, line: usize },
    WaitForNavigation { line: usize },
    WaitForUrl { pattern: Expression, line: usize },

    // Assertions
    VerifyElement { target: Target, negated: bool, state: ElementState, line: usize },
    VerifyText { target: Target, mode: TextMatch, value: Expression, line: usize },
    VerifyValue { target: Target, value: Expression, line: usize },
    VerifyCount { target: Target, count: Expression, line: usize },
    VerifyAttribute { target: Target, attribute: Expression, value: Expression, line: usize },
    VerifyUrl { mode: StringMatch, value: Expression, line: usize },
    VerifyTitle { mode: StringMatch, value: Expression, line: usize },
    VerifyScreenshot { target: Option<Target>, name: Option<Expression>, line: usize },
    VerifyVariable { variable: String, comparison: Comparison, value: Expression, line: usize },
    VerifyResponse { part: ResponsePart, comparison: Comparison, value: Expression, line: usize },

    // API
    ApiRequest {
        method: HttpMethod,
        url: Expression,
        body: Option<Expression>,
        result: Option<String>,
        line: usize,
    },

    // Data
    Load { variable: String, table: Expression, filter: Option<DataFilter>, line: usize },
    Row {
        variable: String,
        table: Expression,
        pick: Option<RowPick>,
        filter: Option<DataFilter>,
        line: usize,
    },
    Rows {
        variable: String,
        table: Expression,
        filter: Option<DataFilter>,
        limit: Option<usize>,
        line: usize,
    },
    Column {
        variable: String,
        table: Expression,
        column: Expression,
        filter: Option<DataFilter>,
        line: usize,
    },
    Count { variable: String, table: Expression, filter: Option<DataFilter>, line: usize },
    Set { variable: String, value: Expression, line: usize },

    // Control flow
    ForEach { variable: String, collection: String, body: Vec<Statement>, line: usize },
    If {
        condition: Condition,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
        /// Line of `} ELSE {`, when present.
        else_line: Option<usize>,
        line: usize,
    },
    TryCatch {
        try_body: Vec<Statement>,
        catch_body: Vec<Statement>,
        /// Line of `} CATCH {`.
        catch_line: usize,
        line: usize,
    },
    Repeat { times: Expression, body: Vec<Statement>, line: usize },

    // Perform
    Perform {
        page: String,
        action: String,
        args: Vec<Expression>,
        result: Option<String>,
        line: usize,
    },

    // Utility
    Log { message: Expression, line: usize },
    TakeScreenshot { name: Option<Expression>, line: usize },
}

impl Statement {
    pub fn line(&self) -> usize {
        *self.line_slot()
    }

    pub fn set_line(&mut self, line: usize) {
        *self.line_slot_mut() = line;
    }

    fn line_slot(&self) -> &usize {
        use Statement::*;
        match self {
            Open { line, .. } | Refresh { line } | GoBack { line } | GoForward { line }
            | SwitchToNewTab { line, .. } | SwitchToTab { line, .. } | CloseTab { line }
            | SwitchToFrame { line, .. } | SwitchToMainFrame { line } | Click { line, .. }
            | DoubleClick { line, .. } | RightClick { line, .. } | Fill { line, .. }
            | Clear { line, .. } | Check { line, .. } | Uncheck { line, .. }
            | Select { line, .. } | Hover { line, .. } | Focus { line, .. }
            | Press { line, .. } | ScrollTo { line, .. } | Scroll { line, .. }
            | Drag { line, .. } | Upload { line, .. } | Wait { line, .. }
            | WaitFor { line, .. } | WaitForNavigation { line } | WaitForUrl { line, .. }
            | VerifyElement { line, .. } | VerifyText { line, .. } | VerifyValue { line, .. }
            | VerifyCount { line, .. } | VerifyAttribute { line, .. } | VerifyUrl { line, .. }
            | VerifyTitle { line, .. } | VerifyScreenshot { line, .. }
            | VerifyVariable { line, .. } | VerifyResponse { line, .. }
            | ApiRequest { line, .. } | Load { line, .. } | Row { line, .. }
            | Rows { line, .. } | Column { line, .. } | Count { line, .. } | Set { line, .. }
            | ForEach { line, .. } | If { line, .. } | TryCatch { line, .. }
            | Repeat { line, .. } | Perform { line, .. } | Log { line, .. }
            | TakeScreenshot { line, .. } => line,
        }
    }

    fn line_slot_mut(&mut self) -> &mut usize {
        use Statement::*;
        match self {
            Open { line, .. } | Refresh { line } | GoBack { line } | GoForward { line }
            | SwitchToNewTab { line, .. } | SwitchToTab { line, .. } | CloseTab { line }
            | SwitchToFrame { line, .. } | SwitchToMainFrame { line } | Click { line, .. }
            | DoubleClick { line, .. } | RightClick { line, .. } | Fill { line, .. }
            | Clear { line, .. } | Check { line, .. } | Uncheck { line, .. }
            | Select { line, .. } | Hover { line, .. } | Focus { line, .. }
            | Press { line, .. } | ScrollTo { line, .. } | Scroll { line, .. }
            | Drag { line, .. } | Upload { line, .. } | Wait { line, .. }
            | WaitFor { line, .. } | WaitForNavigation { line } | WaitForUrl { line, .. }
            | VerifyElement { line, .. } | VerifyText { line, .. } | VerifyValue { line, .. }
            | VerifyCount { line, .. } | VerifyAttribute { line, .. } | VerifyUrl { line, .. }
            | VerifyTitle { line, .. } | VerifyScreenshot { line, .. }
            | VerifyVariable { line, .. } | VerifyResponse { line, .. }
            | ApiRequest { line, .. } | Load { line, .. } | Row { line, .. }
            | Rows { line, .. } | Column { line, .. } | Count { line, .. } | Set { line, .. }
            | ForEach { line, .. } | If { line, .. } | TryCatch { line, .. }
            | Repeat { line, .. } | Perform { line, .. } | Log { line, .. }
            | TakeScreenshot { line, .. } => line,
        }
    }

    pub fn kind(&self) -> StatementKind {
        use Statement as S;
        use StatementKind as K;
        match self {
            S::Open { .. } => K::Open,
            S::Refresh { .. } => K::Refresh,
            S::GoBack { .. } => K::GoBack,
            S::GoForward { .. } => K::GoForward,
            S::SwitchToNewTab { .. } => K::SwitchToNewTab,
            S::SwitchToTab { .. } => K::SwitchToTab,
            S::CloseTab { .. } => K::CloseTab,
            S::SwitchToFrame { .. } => K::SwitchToFrame,
            S::SwitchToMainFrame { .. } => K::SwitchToMainFrame,
            S::Click { .. } => K::Click,
            S::DoubleClick { .. } => K::DoubleClick,
            S::RightClick { .. } => K::RightClick,
            S::Fill { .. } => K::Fill,
            S::Clear { .. } => K::Clear,
            S::Check { .. } => K::Check,
            S::Uncheck { .. } => K::Uncheck,
            S::Select { .. } => K::Select,
            S::Hover { .. } => K::Hover,
            S::Focus { .. } => K::Focus,
            S::Press { .. } => K::Press,
            S::ScrollTo { .. } => K::ScrollTo,
            S::Scroll { .. } => K::Scroll,
            S::Drag { .. } => K::Drag,
            S::Upload { .. } => K::Upload,
            S::Wait { .. } => K::Wait,
            S::WaitFor { .. } => K::WaitFor,
            S::WaitForNavigation { .. } => K::WaitForNavigation,
            S::WaitForUrl { .. } => K::WaitForUrl,
            S::VerifyElement { .. } => K::VerifyElement,
            S::VerifyText { .. } => K::VerifyText,
            S::VerifyValue { .. } => K::VerifyValue,
            S::VerifyCount { .. } => K::VerifyCount,
            S::VerifyAttribute { .. } => K::VerifyAttribute,
            S::VerifyUrl { .. } => K::VerifyUrl,
            S::VerifyTitle { .. } => K::VerifyTitle,
            S::VerifyScreenshot { .. } => K::VerifyScreenshot,
            S::VerifyVariable { .. } => K::VerifyVariable,
            S::VerifyResponse { .. } => K::VerifyResponse,
            S::ApiRequest { .. } => K::ApiRequest,
            S::Load { .. } => K::Load,
            S::Row { .. } => K::Row,
            S::Rows { .. } => K::Rows,
            S::Column { .. } => K::Column,
            S::Count { .. } => K::Count,
            S::Set { .. } => K::Set,
            S::ForEach { .. } => K::ForEach,
            S::If { .. } => K::If,
            S::TryCatch { .. } => K::TryCatch,
            S::Repeat { .. } => K::Repeat,
            S::Perform { .. } => K::Perform,
            S::Log { .. } => K::Log,
            S::TakeScreenshot { .. } => K::TakeScreenshot,
        }
    }

    pub fn category(&self) -> StepCategory {
        self.kind().category()
    }

    /// Block statements own nested bodies and span several lines.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Statement::ForEach { .. }
                | Statement::If { .. }
                | Statement::TryCatch { .. }
                | Statement::Repeat { .. }
        )
    }

    /// The body a step inserted right after this block's header lands in.
    pub fn primary_body(&self) -> Option<&[Statement]> {
        match self {
            Statement::ForEach { body, .. } | Statement::Repeat { body, .. } => Some(body),
            Statement::If { then_body, .. } => Some(then_body),
            Statement::TryCatch { try_body, .. } => Some(try_body),
            _ => None,
        }
    }
}

/// Field-less mirror of [`Statement`], used by the step factory and menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementKind {
    Open,
    Refresh,
    GoBack,
    GoForward,
    SwitchToNewTab,
    SwitchToTab,
    CloseTab,
    SwitchToFrame,
    SwitchToMainFrame,
    Click,
    DoubleClick,
    RightClick,
    Fill,
    Clear,
    Check,
    Uncheck,
    Select,
    Hover,
    Focus,
    Press,
    ScrollTo,
    Scroll,
    Drag,
    Upload,
    Wait,
    WaitFor,
    WaitForNavigation,
    WaitForUrl,
    VerifyElement,
    VerifyText,
    VerifyValue,
    VerifyCount,
    VerifyAttribute,
    VerifyUrl,
    VerifyTitle,
    VerifyScreenshot,
    VerifyVariable,
    VerifyResponse,
    ApiRequest,
    Load,
    Row,
    Rows,
    Column,
    Count,
    Set,
    ForEach,
    If,
    TryCatch,
    Repeat,
    Perform,
    Log,
    TakeScreenshot,
}

const KIND_TAGS: &[(StatementKind, &str)] = &[
    (StatementKind::Open, "open"),
    (StatementKind::Refresh, "refresh"),
    (StatementKind::GoBack, "go-back"),
    (StatementKind::GoForward, "go-forward"),
    (StatementKind::SwitchToNewTab, "switch-to-new-tab"),
    (StatementKind::SwitchToTab, "switch-to-tab"),
    (StatementKind::CloseTab, "close-tab"),
    (StatementKind::SwitchToFrame, "switch-to-frame"),
    (StatementKind::SwitchToMainFrame, "switch-to-main-frame"),
    (StatementKind::Click, "click"),
    (StatementKind::DoubleClick, "double-click"),
    (StatementKind::RightClick, "right-click"),
    (StatementKind::Fill, "fill"),
    (StatementKind::Clear, "clear"),
    (StatementKind::Check, "check"),
    (StatementKind::Uncheck, "uncheck"),
    (StatementKind::Select, "select"),
    (StatementKind::Hover, "hover"),
    (StatementKind::Focus, "focus"),
    (StatementKind::Press, "press"),
    (StatementKind::ScrollTo, "scroll-to"),
    (StatementKind::Scroll, "scroll"),
    (StatementKind::Drag, "drag"),
    (StatementKind::Upload, "upload"),
    (StatementKind::Wait, "wait"),
    (StatementKind::WaitFor, "wait-for"),
    (StatementKind::WaitForNavigation, "wait-for-navigation"),
    (StatementKind::WaitForUrl, "wait-for-url"),
    (StatementKind::VerifyElement, "verify-element"),
    (StatementKind::VerifyText, "verify-text"),
    (StatementKind::VerifyValue, "verify-value"),
    (StatementKind::VerifyCount, "verify-count"),
    (StatementKind::VerifyAttribute, "verify-attribute"),
    (StatementKind::VerifyUrl, "verify-url"),
    (StatementKind::VerifyTitle, "verify-title"),
    (StatementKind::VerifyScreenshot, "verify-screenshot"),
    (StatementKind::VerifyVariable, "verify-variable"),
    (StatementKind::VerifyResponse, "verify-response"),
    (StatementKind::ApiRequest, "api-request"),
    (StatementKind::Load, "load"),
    (StatementKind::Row, "row"),
    (StatementKind::Rows, "rows"),
    (StatementKind::Column, "column"),
    (StatementKind::Count, "count"),
    (StatementKind::Set, "set"),
    (StatementKind::ForEach, "for-each"),
    (StatementKind::If, "if"),
    (StatementKind::TryCatch, "try-catch"),
    (StatementKind::Repeat, "repeat"),
    (StatementKind::Perform, "perform"),
    (StatementKind::Log, "log"),
    (StatementKind::TakeScreenshot, "take-screenshot"),
];

impl StatementKind {
    /// Every kind, in "add step" menu order.
    pub fn all() -> impl Iterator<Item = StatementKind> {
        KIND_TAGS.iter().map(|(kind, _)| *kind)
    }

    pub fn tag(self) -> &'static str {
        KIND_TAGS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, tag)| *tag)
            .unwrap_or("log")
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        KIND_TAGS
            .iter()
            .find(|(_, t)| *t == tag)
            .map(|(kind, _)| *kind)
    }

    pub fn category(self) -> StepCategory {
        use StatementKind as K;
        match self {
            K::Open
            | K::Refresh
            | K::GoBack
            | K::GoForward
            | K::SwitchToNewTab
            | K::SwitchToTab
            | K::CloseTab
            | K::SwitchToFrame
            | K::SwitchToMainFrame => StepCategory::Navigation,
            K::Click
            | K::DoubleClick
            | K::RightClick
            | K::Fill
            | K::Clear
            | K::Check
            | K::Uncheck
            | K::Select
            | K::Hover
            | K::Focus
            | K::Press
            | K::ScrollTo
            | K::Scroll
            | K::Drag
            | K::Upload => StepCategory::Action,
            K::Wait | K::WaitFor | K::WaitForNavigation | K::WaitForUrl => StepCategory::Wait,
            K::VerifyElement
            | K::VerifyText
            | K::VerifyValue
            | K::VerifyCount
            | K::VerifyAttribute
            | K::VerifyUrl
            | K::VerifyTitle
            | K::VerifyScreenshot
            | K::VerifyVariable
            | K::VerifyResponse => StepCategory::Assertion,
            K::ApiRequest => StepCategory::Api,
            K::Load | K::Row | K::Rows | K::Column | K::Count | K::Set => StepCategory::Data,
            K::ForEach | K::If | K::TryCatch | K::Repeat => StepCategory::ControlFlow,
            K::Perform => StepCategory::Perform,
            K::Log | K::TakeScreenshot => StepCategory::Utility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepCategory {
    Navigation,
    Action,
    Wait,
    Assertion,
    Api,
    Data,
    ControlFlow,
    Perform,
    Utility,
}

// ── Program structure ───────────────────────────────────────────────

/// A whole parsed file.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub pages: Vec<Page>,
    pub features: Vec<Feature>,
}

impl Program {
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.features.iter().flat_map(|f| f.scenarios.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub name: String,
    pub fields: Vec<PageField>,
    pub actions: Vec<PageAction>,
    pub line: usize,
}

/// `FIELD name = target`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageField {
    pub name: String,
    pub target: Target,
    pub line: usize,
}

/// `name(param, ...) { statements }` inside a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAction {
    pub name: String,
    pub params: Vec<String>,
    pub statements: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub name: String,
    pub uses: Vec<String>,
    pub scenarios: Vec<Scenario>,
    pub line: usize,
    /// Line of the closing brace.
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub name: String,
    /// `@tag` after the scenario name
    pub tags: Vec<String>,
    /// `@annotation` before the `SCENARIO` keyword
    pub annotations: Vec<String>,
    pub statements: Vec<Statement>,
    pub line: usize,
    /// Line of the closing brace.
    pub end_line: usize,
}
