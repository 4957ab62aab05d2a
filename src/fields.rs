//! Typed access to the editable fields of a statement by dot-path
//! (`"target.text"`, `"value"`, `"filter.column"`, `"args.0"`, ...).

use crate::ast::*;
use crate::emitter::{emit_expression, emit_target};
use crate::error::EditError;
use crate::field_value::{parse_bool_field, parse_field_value, parse_number_field, strip_quotes};
use crate::lexer::identifier_len;
use serde::Serialize;

/// A mutable view of one field, classified by how raw text is parsed into it.
#[derive(Debug)]
pub enum FieldSlot<'a> {
    Expression(&'a mut Expression),
    OptionalExpression(&'a mut Option<Expression>),
    Number(&'a mut usize),
    OptionalNumber(&'a mut Option<usize>),
    Boolean(&'a mut bool),
    Text(&'a mut String),
    /// A page, field, action, variable or column name.
    Identifier(&'a mut String),
    OptionalIdentifier(&'a mut Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Expression,
    Number,
    Boolean,
    Text,
    Identifier,
}

impl<'a> FieldSlot<'a> {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldSlot::Expression(_) | FieldSlot::OptionalExpression(_) => FieldKind::Expression,
            FieldSlot::Number(_) | FieldSlot::OptionalNumber(_) => FieldKind::Number,
            FieldSlot::Boolean(_) => FieldKind::Boolean,
            FieldSlot::Text(_) => FieldKind::Text,
            FieldSlot::Identifier(_) | FieldSlot::OptionalIdentifier(_) => FieldKind::Identifier,
        }
    }

    /// The current value as a form would show it.
    pub fn display(&self) -> String {
        match self {
            FieldSlot::Expression(e) => emit_expression(e),
            FieldSlot::OptionalExpression(e) => {
                (**e).as_ref().map(emit_expression).unwrap_or_default()
            }
            FieldSlot::Number(n) => n.to_string(),
            FieldSlot::OptionalNumber(n) => (**n).map(|n| n.to_string()).unwrap_or_default(),
            FieldSlot::Boolean(b) => b.to_string(),
            FieldSlot::Text(s) | FieldSlot::Identifier(s) => (**s).clone(),
            FieldSlot::OptionalIdentifier(s) => (**s).as_deref().unwrap_or_default().to_string(),
        }
    }

    /// Parse `raw` according to this slot's current type and store it.
    /// Empty input clears optional fields. Names must be identifiers.
    pub fn assign(self, raw: &str) -> Result<(), EditError> {
        let empty = raw.trim().is_empty();
        match self {
            FieldSlot::Expression(e) => *e = parse_field_value(raw),
            FieldSlot::OptionalExpression(e) => {
                *e = (!empty).then(|| parse_field_value(raw));
            }
            FieldSlot::Number(n) => *n = to_count(parse_number_field(raw)),
            FieldSlot::OptionalNumber(n) => {
                *n = (!empty).then(|| to_count(parse_number_field(raw)));
            }
            FieldSlot::Boolean(b) => *b = parse_bool_field(raw),
            FieldSlot::Text(s) => *s = strip_quotes(raw),
            FieldSlot::Identifier(s) => *s = identifier(raw)?,
            FieldSlot::OptionalIdentifier(s) => {
                *s = if empty { None } else { Some(identifier(raw)?) };
            }
        }
        Ok(())
    }
}

fn identifier(raw: &str) -> Result<String, EditError> {
    let name = raw.trim();
    if !name.is_empty() && identifier_len(name) == name.len() {
        Ok(name.to_string())
    } else {
        Err(EditError::InvalidName(name.to_string()))
    }
}

fn to_count(n: f64) -> usize {
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// A dot-path checked against a statement's shape when it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn parse(stmt: &Statement, path: &str) -> Result<FieldPath, EditError> {
        let mut probe = stmt.clone();
        match field_slot_mut(&mut probe, path) {
            Some(_) => Ok(FieldPath(path.to_string())),
            None => Err(EditError::UnknownField {
                path: path.to_string(),
                kind: stmt.kind().tag(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One row of a step's config form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub path: String,
    pub kind: FieldKind,
    pub value: String,
}

/// All editable fields of `stmt`, in form order.
pub fn editable_fields(stmt: &Statement) -> Vec<FieldDescriptor> {
    let mut probe = stmt.clone();
    field_paths(stmt)
        .into_iter()
        .filter_map(|path| {
            let slot = field_slot_mut(&mut probe, &path)?;
            Some(FieldDescriptor {
                kind: slot.kind(),
                value: slot.display(),
                path,
            })
        })
        .collect()
}

/// Resolve `path` on `stmt`.
pub fn field_slot_mut<'a>(stmt: &'a mut Statement, path: &str) -> Option<FieldSlot<'a>> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    use Statement as S;
    match (stmt, head, rest) {
        (S::Open { url, .. }, "url", None) => Some(FieldSlot::Expression(url)),
        (S::SwitchToNewTab { url, .. }, "url", None) => Some(FieldSlot::OptionalExpression(url)),
        (S::SwitchToTab { index, .. }, "index", None) => Some(FieldSlot::Expression(index)),
        (S::Fill { value, .. }, "value", None)
        | (S::VerifyText { value, .. }, "value", None)
        | (S::VerifyValue { value, .. }, "value", None)
        | (S::VerifyAttribute { value, .. }, "value", None)
        | (S::VerifyUrl { value, .. }, "value", None)
        | (S::VerifyTitle { value, .. }, "value", None)
        | (S::VerifyVariable { value, .. }, "value", None)
        | (S::VerifyResponse { value, .. }, "value", None)
        | (S::Set { value, .. }, "value", None) => Some(FieldSlot::Expression(value)),
        (S::Select { option, .. }, "option", None) => Some(FieldSlot::Expression(option)),
        (S::Press { key, .. }, "key", None) => Some(FieldSlot::Expression(key)),
        (S::Upload { files, .. }, "files", Some(index)) => index
            .parse::<usize>()
            .ok()
            .and_then(|i| files.get_mut(i))
            .map(FieldSlot::Expression),
        (S::Wait { duration, .. }, "duration", None) => Some(FieldSlot::Expression(duration)),
        (S::WaitForUrl { pattern, .. }, "pattern", None) => Some(FieldSlot::Expression(pattern)),
        (S::VerifyElement { negated, .. }, "negated", None) => Some(FieldSlot::Boolean(negated)),
        (S::VerifyCount { count, .. }, "count", None) => Some(FieldSlot::Expression(count)),
        (S::VerifyAttribute { attribute, .. }, "attribute", None) => {
            Some(FieldSlot::Expression(attribute))
        }
        (S::VerifyScreenshot { target, .. }, "target", Some(rest)) => {
            target.as_mut().and_then(|t| target_slot(t, rest))
        }
        (S::VerifyScreenshot { name, .. }, "name", None)
        | (S::TakeScreenshot { name, .. }, "name", None) => {
            Some(FieldSlot::OptionalExpression(name))
        }
        (S::VerifyVariable { variable, .. }, "variable", None)
        | (S::Load { variable, .. }, "variable", None)
        | (S::Row { variable, .. }, "variable", None)
        | (S::Rows { variable, .. }, "variable", None)
        | (S::Column { variable, .. }, "variable", None)
        | (S::Count { variable, .. }, "variable", None)
        | (S::Set { variable, .. }, "variable", None)
        | (S::ForEach { variable, .. }, "variable", None) => Some(FieldSlot::Identifier(variable)),
        (S::ApiRequest { url, .. }, "url", None) => Some(FieldSlot::Expression(url)),
        (S::ApiRequest { body, .. }, "body", None) => Some(FieldSlot::OptionalExpression(body)),
        (S::ApiRequest { result, .. }, "result", None)
        | (S::Perform { result, .. }, "result", None) => {
            Some(FieldSlot::OptionalIdentifier(result))
        }
        (S::Load { table, .. }, "table", None)
        | (S::Row { table, .. }, "table", None)
        | (S::Rows { table, .. }, "table", None)
        | (S::Column { table, .. }, "table", None)
        | (S::Count { table, .. }, "table", None) => Some(FieldSlot::Expression(table)),
        (S::Load { filter, .. }, "filter", Some(rest))
        | (S::Row { filter, .. }, "filter", Some(rest))
        | (S::Rows { filter, .. }, "filter", Some(rest))
        | (S::Column { filter, .. }, "filter", Some(rest))
        | (S::Count { filter, .. }, "filter", Some(rest)) => {
            filter.as_mut().and_then(|f| filter_slot(f, rest))
        }
        (S::Rows { limit, .. }, "limit", None) => Some(FieldSlot::OptionalNumber(limit)),
        (S::Column { column, .. }, "column", None) => Some(FieldSlot::Expression(column)),
        (S::ForEach { collection, .. }, "collection", None) => {
            Some(FieldSlot::Identifier(collection))
        }
        (S::If { condition, .. }, "condition", Some(rest)) => condition_slot(condition, rest),
        (S::Repeat { times, .. }, "times", None) => Some(FieldSlot::Expression(times)),
        (S::Perform { page, .. }, "page", None) => Some(FieldSlot::Identifier(page)),
        (S::Perform { action, .. }, "action", None) => Some(FieldSlot::Identifier(action)),
        (S::Perform { args, .. }, "args", Some(index)) => index
            .parse::<usize>()
            .ok()
            .and_then(|i| args.get_mut(i))
            .map(FieldSlot::Expression),
        (S::Log { message, .. }, "message", None) => Some(FieldSlot::Expression(message)),
        (S::Drag { source, .. }, "source", Some(rest)) => target_slot(source, rest),
        (S::Drag { destination, .. }, "destination", Some(rest)) => target_slot(destination, rest),
        (stmt, "target", Some(rest)) => statement_target(stmt).and_then(|t| target_slot(t, rest)),
        _ => None,
    }
}

fn statement_target(stmt: &mut Statement) -> Option<&mut Target> {
    use Statement as S;
    match stmt {
        S::SwitchToFrame { target, .. }
        | S::Click { target, .. }
        | S::DoubleClick { target, .. }
        | S::RightClick { target, .. }
        | S::Fill { target, .. }
        | S::Clear { target, .. }
        | S::Check { target, .. }
        | S::Uncheck { target, .. }
        | S::Select { target, .. }
        | S::Hover { target, .. }
        | S::Focus { target, .. }
        | S::ScrollTo { target, .. }
        | S::Upload { target, .. }
        | S::WaitFor { target, .. }
        | S::VerifyElement { target, .. }
        | S::VerifyText { target, .. }
        | S::VerifyValue { target, .. }
        | S::VerifyCount { target, .. }
        | S::VerifyAttribute { target, .. } => Some(target),
        _ => None,
    }
}

fn target_slot<'a>(target: &'a mut Target, path: &str) -> Option<FieldSlot<'a>> {
    match (target, path) {
        (Target::PageField { page, .. }, "page") => Some(FieldSlot::Identifier(page)),
        (Target::PageField { field, .. }, "field") => Some(FieldSlot::Identifier(field)),
        (Target::Text(text), "text") => Some(FieldSlot::Text(text)),
        (Target::Selector { value, .. }, "value") => Some(FieldSlot::Text(value)),
        _ => None,
    }
}

fn filter_slot<'a>(filter: &'a mut DataFilter, path: &str) -> Option<FieldSlot<'a>> {
    match path {
        "column" => Some(FieldSlot::Identifier(&mut filter.column)),
        "value" => Some(FieldSlot::Expression(&mut filter.value)),
        _ => None,
    }
}

fn condition_slot<'a>(condition: &'a mut Condition, path: &str) -> Option<FieldSlot<'a>> {
    match condition {
        Condition::Element {
            target, negated, ..
        } => match path.split_once('.') {
            Some(("target", rest)) => target_slot(target, rest),
            None if path == "negated" => Some(FieldSlot::Boolean(negated)),
            _ => None,
        },
        Condition::Compare { left, right, .. } => match path {
            "left" => Some(FieldSlot::Expression(left)),
            "right" => Some(FieldSlot::Expression(right)),
            _ => None,
        },
    }
}

fn target_paths(prefix: &str, target: &Target) -> Vec<String> {
    match target {
        Target::PageField { .. } => vec![format!("{}.page", prefix), format!("{}.field", prefix)],
        Target::Text(_) => vec![format!("{}.text", prefix)],
        Target::Selector { .. } => vec![format!("{}.value", prefix)],
    }
}

fn filter_paths(filter: &Option<DataFilter>) -> Vec<String> {
    match filter {
        Some(_) => vec!["filter.column".to_string(), "filter.value".to_string()],
        None => Vec::new(),
    }
}

/// Every path `field_slot_mut` resolves for `stmt`.
pub fn field_paths(stmt: &Statement) -> Vec<String> {
    use Statement as S;
    let own = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
    let mut paths = Vec::new();
    match stmt {
        S::Drag {
            source,
            destination,
            ..
        } => {
            paths.extend(target_paths("source", source));
            paths.extend(target_paths("destination", destination));
        }
        S::VerifyScreenshot { target, .. } => {
            if let Some(target) = target {
                paths.extend(target_paths("target", target));
            }
            paths.push("name".to_string());
        }
        S::If { condition, .. } => match condition {
            Condition::Element { target, .. } => {
                paths.extend(target_paths("condition.target", target));
                paths.push("condition.negated".to_string());
            }
            Condition::Compare { .. } => {
                paths.extend(own(&["condition.left", "condition.right"]));
            }
        },
        _ => {
            let mut probe = stmt.clone();
            if let Some(target) = statement_target(&mut probe) {
                paths.extend(target_paths("target", target));
            }
        }
    }

    match stmt {
        S::Open { .. } | S::SwitchToNewTab { .. } | S::ApiRequest { .. } => {
            paths.push("url".to_string())
        }
        S::SwitchToTab { .. } => paths.push("index".to_string()),
        S::Select { .. } => paths.push("option".to_string()),
        S::Press { .. } => paths.push("key".to_string()),
        S::Upload { files, .. } => paths.extend((0..files.len()).map(|i| format!("files.{}", i))),
        S::Wait { .. } => paths.push("duration".to_string()),
        S::WaitForUrl { .. } => paths.push("pattern".to_string()),
        S::VerifyElement { .. } => paths.push("negated".to_string()),
        S::VerifyCount { .. } => paths.push("count".to_string()),
        S::VerifyAttribute { .. } => paths.extend(own(&["attribute", "value"])),
        S::VerifyVariable { .. } => paths.extend(own(&["variable", "value"])),
        S::Fill { .. }
        | S::VerifyText { .. }
        | S::VerifyValue { .. }
        | S::VerifyUrl { .. }
        | S::VerifyTitle { .. }
        | S::VerifyResponse { .. } => paths.push("value".to_string()),
        S::Set { .. } => paths.extend(own(&["variable", "value"])),
        S::Load { filter, .. } | S::Row { filter, .. } | S::Count { filter, .. } => {
            paths.extend(own(&["variable", "table"]));
            paths.extend(filter_paths(filter));
        }
        S::Rows { filter, .. } => {
            paths.extend(own(&["variable", "table"]));
            paths.extend(filter_paths(filter));
            paths.push("limit".to_string());
        }
        S::Column { filter, .. } => {
            paths.extend(own(&["variable", "table", "column"]));
            paths.extend(filter_paths(filter));
        }
        S::ForEach { .. } => paths.extend(own(&["variable", "collection"])),
        S::Repeat { .. } => paths.push("times".to_string()),
        S::Perform { args, .. } => {
            paths.extend(own(&["page", "action"]));
            paths.extend((0..args.len()).map(|i| format!("args.{}", i)));
            paths.push("result".to_string());
        }
        S::Log { .. } => paths.push("message".to_string()),
        S::TakeScreenshot { .. } => paths.push("name".to_string()),
        _ => {}
    }
    if let S::ApiRequest { .. } = stmt {
        paths.extend(own(&["body", "result"]));
    }
    paths
}

/// Short human-readable summary of a step for list rows.
pub fn describe(stmt: &Statement) -> String {
    use Statement as S;
    match stmt {
        S::TryCatch { .. } => "TRY".to_string(),
        S::ForEach {
            variable,
            collection,
            ..
        } => format!("For each {} in {}", variable, collection),
        S::Perform { page, action, .. } => format!("Perform {}.{}", page, action),
        other => {
            let mut probe = other.clone();
            let subject = statement_target(&mut probe).map(|t| emit_target(t));
            match subject {
                Some(subject) => format!("{} {}", other.kind().tag(), subject),
                None => other.kind().tag().to_string(),
            }
        }
    }
}
