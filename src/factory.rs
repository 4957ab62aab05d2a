//! Placeholder statements for the "add step" menu.

use crate::ast::*;

fn text(s: &str) -> Target {
    Target::text(s)
}

fn string(s: &str) -> Expression {
    Expression::string(s)
}

/// A new, unplaced statement of `kind` with placeholder values that emit as
/// valid script text.
pub fn default_statement(kind: StatementKind) -> Statement {
    use StatementKind as K;
    let line = 0;
    match kind {
        K::Open => Statement::Open {
            url: string("https://example.com"),
            line,
        },
        K::Refresh => Statement::Refresh { line },
        K::GoBack => Statement::GoBack { line },
        K::GoForward => Statement::GoForward { line },
        K::SwitchToNewTab => Statement::SwitchToNewTab { url: None, line },
        K::SwitchToTab => Statement::SwitchToTab {
            index: Expression::Number(1.0),
            line,
        },
        K::CloseTab => Statement::CloseTab { line },
        K::SwitchToFrame => Statement::SwitchToFrame {
            target: Target::Selector {
                kind: SelectorKind::Css,
                value: "iframe".to_string(),
                modifiers: Vec::new(),
            },
            line,
        },
        K::SwitchToMainFrame => Statement::SwitchToMainFrame { line },
        K::Click => Statement::Click {
            target: text("Button"),
            line,
        },
        K::DoubleClick => Statement::DoubleClick {
            target: text("Button"),
            line,
        },
        K::RightClick => Statement::RightClick {
            target: text("Button"),
            line,
        },
        K::Fill => Statement::Fill {
            target: text("Field"),
            value: string("value"),
            line,
        },
        K::Clear => Statement::Clear {
            target: text("Field"),
            line,
        },
        K::Check => Statement::Check {
            target: text("Checkbox"),
            line,
        },
        K::Uncheck => Statement::Uncheck {
            target: text("Checkbox"),
            line,
        },
        K::Select => Statement::Select {
            option: string("Option"),
            target: text("Dropdown"),
            line,
        },
        K::Hover => Statement::Hover {
            target: text("Element"),
            line,
        },
        K::Focus => Statement::Focus {
            target: text("Field"),
            line,
        },
        K::Press => Statement::Press {
            key: string("Enter"),
            line,
        },
        K::ScrollTo => Statement::ScrollTo {
            target: text("Element"),
            line,
        },
        K::Scroll => Statement::Scroll {
            direction: ScrollDirection::Down,
            line,
        },
        K::Drag => Statement::Drag {
            source: text("Item"),
            destination: text("Target"),
            line,
        },
        K::Upload => Statement::Upload {
            files: vec![string("file.txt")],
            target: text("Upload"),
            line,
        },
        K::Wait => Statement::Wait {
            duration: Expression::Number(1.0),
            unit: TimeUnit::Seconds,
            line,
        },
        K::WaitFor => Statement::WaitFor {
            target: text("Element"),
            line,
        },
        K::WaitForNavigation => Statement::WaitForNavigation { line },
        K::WaitForUrl => Statement::WaitForUrl {
            pattern: string("/"),
            line,
        },
        K::VerifyElement => Statement::VerifyElement {
            target: text("Element"),
            negated: false,
            state: ElementState::Visible,
            line,
        },
        K::VerifyText => Statement::VerifyText {
            target: text("Element"),
            mode: TextMatch::Exact,
            value: string("text"),
            line,
        },
        K::VerifyValue => Statement::VerifyValue {
            target: text("Field"),
            value: string("value"),
            line,
        },
        K::VerifyCount => Statement::VerifyCount {
            target: text("Item"),
            count: Expression::Number(1.0),
            line,
        },
        K::VerifyAttribute => Statement::VerifyAttribute {
            target: text("Element"),
            attribute: string("class"),
            value: string("value"),
            line,
        },
        K::VerifyUrl => Statement::VerifyUrl {
            mode: StringMatch::Contains,
            value: string("/"),
            line,
        },
        K::VerifyTitle => Statement::VerifyTitle {
            mode: StringMatch::Contains,
            value: string("Title"),
            line,
        },
        K::VerifyScreenshot => Statement::VerifyScreenshot {
            target: None,
            name: None,
            line,
        },
        K::VerifyVariable => Statement::VerifyVariable {
            variable: "result".to_string(),
            comparison: Comparison::Equal,
            value: string("expected"),
            line,
        },
        K::VerifyResponse => Statement::VerifyResponse {
            part: ResponsePart::Status,
            comparison: Comparison::Equal,
            value: Expression::Number(200.0),
            line,
        },
        K::ApiRequest => Statement::ApiRequest {
            method: HttpMethod::Get,
            url: string("https://api.example.com"),
            body: None,
            result: Some("response".to_string()),
            line,
        },
        K::Load => Statement::Load {
            variable: "data".to_string(),
            table: string("table"),
            filter: None,
            line,
        },
        K::Row => Statement::Row {
            variable: "row".to_string(),
            table: string("table"),
            pick: None,
            filter: None,
            line,
        },
        K::Rows => Statement::Rows {
            variable: "rows".to_string(),
            table: string("table"),
            filter: None,
            limit: None,
            line,
        },
        K::Column => Statement::Column {
            variable: "values".to_string(),
            table: string("table"),
            column: string("column"),
            filter: None,
            line,
        },
        K::Count => Statement::Count {
            variable: "total".to_string(),
            table: string("table"),
            filter: None,
            line,
        },
        K::Set => Statement::Set {
            variable: "name".to_string(),
            value: string("value"),
            line,
        },
        K::ForEach => Statement::ForEach {
            variable: "item".to_string(),
            collection: "items".to_string(),
            body: Vec::new(),
            line,
        },
        K::If => Statement::If {
            condition: Condition::Element {
                target: text("Element"),
                negated: false,
                state: ElementState::Visible,
            },
            then_body: Vec::new(),
            else_body: Vec::new(),
            else_line: None,
            line,
        },
        K::TryCatch => Statement::TryCatch {
            try_body: Vec::new(),
            catch_body: Vec::new(),
            catch_line: 0,
            line,
        },
        K::Repeat => Statement::Repeat {
            times: Expression::Number(3.0),
            body: Vec::new(),
            line,
        },
        K::Perform => Statement::Perform {
            page: "Page".to_string(),
            action: "action".to_string(),
            args: Vec::new(),
            result: None,
            line,
        },
        K::Log => Statement::Log {
            message: string("message"),
            line,
        },
        K::TakeScreenshot => Statement::TakeScreenshot { name: None, line },
    }
}

/// Look a kind up by its menu tag. Unknown tags produce a `LOG` step.
pub fn create_default_statement(tag: &str) -> Statement {
    let kind = StatementKind::from_tag(tag).unwrap_or(StatementKind::Log);
    default_statement(kind)
}
