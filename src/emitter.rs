//! Statement tree → Vero source.
//!
//! The emitter is the structural inverse of the parser: re-parsing emitted
//! text yields an equal tree (modulo `line`). Output is deterministic for a
//! given node and indentation, which keeps diffs stable across saves.

use crate::ast::*;
use crate::lexer::identifier_len;

/// One nesting level.
pub const INDENT: &str = "    ";

pub fn emit_expression(expr: &Expression) -> String {
    match expr {
        Expression::String(s) => emit_string_literal(s),
        Expression::Number(n) => format!("{}", n),
        Expression::Boolean(true) => "TRUE".to_string(),
        Expression::Boolean(false) => "FALSE".to_string(),
        Expression::Variable {
            page: Some(page),
            name,
        } => {
            if page.starts_with(|c: char| c.is_uppercase()) {
                format!("{}.{}", page, name)
            } else {
                format!("{{{}.{}}}", page, name)
            }
        }
        Expression::Variable { page: None, name } => format!("{{{}}}", name),
        Expression::Env { name } => format!("{{{{{}}}}}", name),
    }
}

/// Quote and escape a string literal.
pub fn emit_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn emit_target(target: &Target) -> String {
    match target {
        Target::PageField { page, field } => format!("{}.{}", page, field),
        Target::Text(text) => emit_string_literal(text),
        Target::Selector {
            kind,
            value,
            modifiers,
        } => {
            let mut out = format!("{} {}", kind.keyword(), emit_string_literal(value));
            for modifier in modifiers {
                out.push(' ');
                out.push_str(&emit_modifier(modifier));
            }
            out
        }
    }
}

fn emit_modifier(modifier: &SelectorModifier) -> String {
    match modifier {
        SelectorModifier::First => "FIRST".to_string(),
        SelectorModifier::Last => "LAST".to_string(),
        SelectorModifier::Nth(n) => format!("NTH {}", n),
        SelectorModifier::WithText(t) => format!("WITH TEXT {}", emit_string_literal(t)),
        SelectorModifier::WithoutText(t) => format!("WITHOUT TEXT {}", emit_string_literal(t)),
    }
}

fn emit_expression_list(items: &[Expression]) -> String {
    items
        .iter()
        .map(emit_expression)
        .collect::<Vec<_>>()
        .join(", ")
}

fn emit_filter(filter: &Option<DataFilter>) -> String {
    match filter {
        Some(f) => format!(
            " WHERE {} {} {}",
            f.column,
            f.comparison.symbol(),
            emit_expression(&f.value)
        ),
        None => String::new(),
    }
}

fn emit_condition(condition: &Condition) -> String {
    match condition {
        Condition::Element {
            target,
            negated,
            state,
        } => format!(
            "{} IS {}{}",
            emit_target(target),
            if *negated { "NOT " } else { "" },
            state.keyword()
        ),
        Condition::Compare {
            left,
            comparison,
            right,
        } => format!(
            "{} {} {}",
            emit_expression(left),
            comparison.symbol(),
            emit_expression(right)
        ),
    }
}

/// Render a statement list, one or more lines per statement.
pub fn emit_statements(statements: &[Statement], indent: &str) -> Vec<String> {
    statements
        .iter()
        .flat_map(|stmt| emit_statement(stmt, indent))
        .collect()
}

/// Render one statement at `indent`. Leaf statements produce exactly one
/// line; blocks produce a header, their bodies one level deeper, and the
/// closing brace line(s).
pub fn emit_statement(stmt: &Statement, indent: &str) -> Vec<String> {
    let inner = format!("{}{}", indent, INDENT);
    match stmt {
        Statement::ForEach {
            variable,
            collection,
            body,
            ..
        } => block(
            indent,
            format!("FOR EACH {} IN {} {{", variable, collection),
            emit_statements(body, &inner),
        ),
        Statement::Repeat { times, body, .. } => block(
            indent,
            format!("REPEAT {} TIMES {{", emit_expression(times)),
            emit_statements(body, &inner),
        ),
        Statement::If {
            condition,
            then_body,
            else_body,
            else_line,
            ..
        } => {
            let mut lines = vec![format!("{}IF {} {{", indent, emit_condition(condition))];
            lines.extend(emit_statements(then_body, &inner));
            if !else_body.is_empty() || else_line.is_some() {
                lines.push(format!("{}}} ELSE {{", indent));
                lines.extend(emit_statements(else_body, &inner));
            }
            lines.push(format!("{}}}", indent));
            lines
        }
        Statement::TryCatch {
            try_body,
            catch_body,
            ..
        } => {
            let mut lines = vec![format!("{}TRY {{", indent)];
            lines.extend(emit_statements(try_body, &inner));
            lines.push(format!("{}}} CATCH {{", indent));
            lines.extend(emit_statements(catch_body, &inner));
            lines.push(format!("{}}}", indent));
            lines
        }
        leaf => vec![format!("{}{}", indent, emit_leaf(leaf))],
    }
}

fn block(indent: &str, header: String, body: Vec<String>) -> Vec<String> {
    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(format!("{}{}", indent, header));
    lines.extend(body);
    lines.push(format!("{}}}", indent));
    lines
}

fn emit_leaf(stmt: &Statement) -> String {
    use Statement as S;
    let e = emit_expression;
    let t = emit_target;
    match stmt {
        S::Open { url, .. } => format!("OPEN {}", e(url)),
        S::Refresh { .. } => "REFRESH".to_string(),
        S::GoBack { .. } => "GO BACK".to_string(),
        S::GoForward { .. } => "GO FORWARD".to_string(),
        S::SwitchToNewTab { url: Some(url), .. } => format!("SWITCH TO NEW TAB {}", e(url)),
        S::SwitchToNewTab { url: None, .. } => "SWITCH TO NEW TAB".to_string(),
        S::SwitchToTab { index, .. } => format!("SWITCH TO TAB {}", e(index)),
        S::CloseTab { .. } => "CLOSE TAB".to_string(),
        S::SwitchToFrame { target, .. } => format!("SWITCH TO FRAME {}", t(target)),
        S::SwitchToMainFrame { .. } => "SWITCH TO MAIN FRAME".to_string(),
        S::Click { target, .. } => format!("CLICK {}", t(target)),
        S::DoubleClick { target, .. } => format!("DOUBLE CLICK {}", t(target)),
        S::RightClick { target, .. } => format!("RIGHT CLICK {}", t(target)),
        S::Fill { target, value, .. } => format!("FILL {} WITH {}", t(target), e(value)),
        S::Clear { target, .. } => format!("CLEAR {}", t(target)),
        S::Check { target, .. } => format!("CHECK {}", t(target)),
        S::Uncheck { target, .. } => format!("UNCHECK {}", t(target)),
        S::Select { option, target, .. } => format!("SELECT {} FROM {}", e(option), t(target)),
        S::Hover { target, .. } => format!("HOVER {}", t(target)),
        S::Focus { target, .. } => format!("FOCUS {}", t(target)),
        S::Press { key, .. } => format!("PRESS {}", e(key)),
        S::ScrollTo { target, .. } => format!("SCROLL TO {}", t(target)),
        S::Scroll { direction, .. } => format!(
            "SCROLL {}",
            match direction {
                ScrollDirection::Up => "UP",
                ScrollDirection::Down => "DOWN",
                ScrollDirection::Left => "LEFT",
                ScrollDirection::Right => "RIGHT",
            }
        ),
        S::Drag {
            source,
            destination,
            ..
        } => format!("DRAG {} TO {}", t(source), t(destination)),
        S::Upload { files, target, .. } => {
            format!("UPLOAD {} TO {}", emit_expression_list(files), t(target))
        }
        S::Wait { duration, unit, .. } => format!(
            "WAIT {} {}",
            e(duration),
            match unit {
                TimeUnit::Seconds => "SECONDS",
                TimeUnit::Milliseconds => "MILLISECONDS",
            }
        ),
        S::WaitFor { target, .. } => format!("WAIT FOR {}", t(target)),
        S::WaitForNavigation { .. } => "WAIT FOR NAVIGATION".to_string(),
        S::WaitForUrl { pattern, .. } => format!("WAIT FOR URL {}", e(pattern)),
        S::VerifyElement {
            target,
            negated,
            state,
            ..
        } => format!(
            "VERIFY {} IS {}{}",
            t(target),
            if *negated { "NOT " } else { "" },
            state.keyword()
        ),
        S::VerifyText {
            target,
            mode,
            value,
            ..
        } => match mode {
            TextMatch::Exact => format!("VERIFY {} HAS TEXT {}", t(target), e(value)),
            TextMatch::Contains => format!("VERIFY {} CONTAINS TEXT {}", t(target), e(value)),
        },
        S::VerifyValue { target, value, .. } => {
            format!("VERIFY {} HAS VALUE {}", t(target), e(value))
        }
        S::VerifyCount { target, count, .. } => {
            format!("VERIFY {} HAS COUNT {}", t(target), e(count))
        }
        S::VerifyAttribute {
            target,
            attribute,
            value,
            ..
        } => format!(
            "VERIFY {} HAS ATTRIBUTE {} EQUAL {}",
            t(target),
            e(attribute),
            e(value)
        ),
        S::VerifyUrl { mode, value, .. } => {
            format!("VERIFY URL {} {}", mode.keyword(), e(value))
        }
        S::VerifyTitle { mode, value, .. } => {
            format!("VERIFY TITLE {} {}", mode.keyword(), e(value))
        }
        S::VerifyScreenshot { target, name, .. } => {
            let mut out = "VERIFY SCREENSHOT".to_string();
            if let Some(target) = target {
                out.push(' ');
                out.push_str(&t(target));
            }
            if let Some(name) = name {
                out.push_str(" AS ");
                out.push_str(&e(name));
            }
            out
        }
        S::VerifyVariable {
            variable,
            comparison,
            value,
            ..
        } => format!(
            "VERIFY VARIABLE {} {} {}",
            variable,
            comparison.symbol(),
            e(value)
        ),
        S::VerifyResponse {
            part,
            comparison,
            value,
            ..
        } => format!(
            "VERIFY RESPONSE {} {} {}",
            match part {
                ResponsePart::Status => "STATUS",
                ResponsePart::Body => "BODY",
            },
            comparison.symbol(),
            e(value)
        ),
        S::ApiRequest {
            method,
            url,
            body,
            result,
            ..
        } => {
            let mut out = format!("API {} {}", method.keyword(), e(url));
            if let Some(body) = body {
                out.push_str(" BODY ");
                out.push_str(&e(body));
            }
            if let Some(result) = result {
                out.push_str(" AS ");
                out.push_str(result);
            }
            out
        }
        S::Load {
            variable,
            table,
            filter,
            ..
        } => format!("LOAD {} FROM {}{}", variable, e(table), emit_filter(filter)),
        S::Row {
            variable,
            table,
            pick,
            filter,
            ..
        } => {
            let pick = match pick {
                Some(RowPick::First) => " FIRST",
                Some(RowPick::Last) => " LAST",
                Some(RowPick::Random) => " RANDOM",
                None => "",
            };
            format!("ROW {} FROM {}{}{}", variable, e(table), pick, emit_filter(filter))
        }
        S::Rows {
            variable,
            table,
            filter,
            limit,
            ..
        } => {
            let mut out = format!("ROWS {} FROM {}{}", variable, e(table), emit_filter(filter));
            if let Some(limit) = limit {
                out.push_str(&format!(" LIMIT {}", limit));
            }
            out
        }
        S::Column {
            variable,
            table,
            column,
            filter,
            ..
        } => format!(
            "COLUMN {} FROM {} FIELD {}{}",
            variable,
            e(table),
            e(column),
            emit_filter(filter)
        ),
        S::Count {
            variable,
            table,
            filter,
            ..
        } => format!("COUNT {} FROM {}{}", variable, e(table), emit_filter(filter)),
        S::Set {
            variable, value, ..
        } => format!("SET {} = {}", variable, e(value)),
        S::Perform {
            page,
            action,
            args,
            result,
            ..
        } => {
            let mut out = format!("PERFORM {}.{}", page, action);
            if !args.is_empty() {
                out.push_str(" WITH ");
                out.push_str(&emit_expression_list(args));
            }
            if let Some(result) = result {
                out.push_str(" AS ");
                out.push_str(result);
            }
            out
        }
        S::Log { message, .. } => format!("LOG {}", e(message)),
        S::TakeScreenshot { name: Some(name), .. } => format!("TAKE SCREENSHOT AS {}", e(name)),
        S::TakeScreenshot { name: None, .. } => "TAKE SCREENSHOT".to_string(),
        S::ForEach { .. } | S::If { .. } | S::TryCatch { .. } | S::Repeat { .. } => {
            // Blocks are rendered by `emit_statement`; this is only its first line.
            emit_statement(stmt, "")
                .into_iter()
                .next()
                .unwrap_or_default()
        }
    }
}

// ── Whole files ─────────────────────────────────────────────────────

/// Re-format a whole program.
pub fn emit_program(program: &Program) -> String {
    let mut sections: Vec<Vec<String>> = Vec::new();

    for page in &program.pages {
        let mut lines = vec![format!("PAGE {} {{", page.name)];
        for field in &page.fields {
            lines.push(format!(
                "{}FIELD {} = {}",
                INDENT,
                field.name,
                emit_target(&field.target)
            ));
        }
        for action in &page.actions {
            let params = if action.params.is_empty() {
                String::new()
            } else {
                format!("({})", action.params.join(", "))
            };
            lines.push(format!("{}{}{} {{", INDENT, action.name, params));
            lines.extend(emit_statements(
                &action.statements,
                &format!("{}{}", INDENT, INDENT),
            ));
            lines.push(format!("{}}}", INDENT));
        }
        lines.push("}".to_string());
        sections.push(lines);
    }

    for feature in &program.features {
        let mut lines = vec![format!("FEATURE {} {{", feature.name)];
        for page in &feature.uses {
            lines.push(format!("{}USE {}", INDENT, page));
        }
        for (i, scenario) in feature.scenarios.iter().enumerate() {
            if i > 0 || !feature.uses.is_empty() {
                lines.push(String::new());
            }
            lines.extend(emit_scenario(scenario, INDENT));
        }
        lines.push("}".to_string());
        sections.push(lines);
    }

    let mut out = sections
        .into_iter()
        .map(|lines| lines.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

/// Header, body and closing brace of one scenario.
pub fn emit_scenario(scenario: &Scenario, indent: &str) -> Vec<String> {
    let mut header = String::from(indent);
    for annotation in &scenario.annotations {
        header.push('@');
        header.push_str(annotation);
        header.push(' ');
    }
    header.push_str("SCENARIO ");
    if identifier_len(&scenario.name) == scenario.name.len() && !scenario.name.is_empty() {
        header.push_str(&scenario.name);
    } else {
        header.push_str(&emit_string_literal(&scenario.name));
    }
    for tag in &scenario.tags {
        header.push_str(" @");
        header.push_str(tag);
    }
    header.push_str(" {");

    let mut lines = vec![header];
    lines.extend(emit_statements(
        &scenario.statements,
        &format!("{}{}", indent, INDENT),
    ));
    lines.push(format!("{}}}", indent));
    lines
}
