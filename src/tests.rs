use crate::ast::*;
use crate::config::EditorConfig;
use crate::editor::ScriptEditor;
use crate::emitter::{emit_expression, emit_program, emit_statement};
use crate::error::EditError;
use crate::factory::{create_default_statement, default_statement};
use crate::field_value::parse_field_value;
use crate::fields::{describe, editable_fields, FieldKind};
use crate::flatten::{resolve_path, BlockLabel, FlatStep, StatementPath};
use crate::history::ContentHistory;
use crate::parser::{parse_source, VeroParser};
use crate::state::{reduce, BuilderAction, BuilderState};
use crate::text::*;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

// ── Shared fixtures ─────────────────────────────────────────────────

/// Embed fixture files at compile time.
const LOGIN: &str = include_str!("../test-data/fixtures/login.vero");
const KITCHEN_SINK: &str = include_str!("../test-data/fixtures/kitchen-sink.vero");
const FIELD_VALUE_FIXTURES: &str = include_str!("../test-data/fixtures/field-values.json");

const NESTED_EMPTY_LOOP: &str = "FEATURE F {
    SCENARIO S {
        FOR EACH item IN items {
        }
        LOG \"after\"
    }
}
";

fn line_of(source: &str, line: usize) -> &str {
    get_line(source, line).unwrap()
}

fn step(editor: &ScriptEditor, id: &str) -> FlatStep {
    editor
        .active_scenario()
        .and_then(|view| view.step(id))
        .cloned()
        .unwrap_or_else(|| panic!("no step '{}'", id))
}

fn login_editor() -> ScriptEditor {
    ScriptEditor::new(LOGIN)
}

/// Lines that differ between two versions of the same-length source.
fn changed_lines(before: &str, after: &str) -> Vec<usize> {
    before
        .split('\n')
        .zip(after.split('\n'))
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i + 1)
        .collect()
}

// ── Text primitives ─────────────────────────────────────────────────

#[test]
fn test_line_access() {
    let source = "a\n    b\n\tc";
    assert_eq!(line_count(source), 3);
    assert_eq!(get_line(source, 2), Some("    b"));
    assert_eq!(get_line(source, 0), None);
    assert_eq!(get_line(source, 4), None);
    assert_eq!(get_indent(source, 2), "    ");
    assert_eq!(get_indent(source, 3), "\t");
    assert_eq!(get_indent(source, 9), "");
}

#[test]
fn test_line_surgery() {
    let source = "one\ntwo\nthree\n";
    assert_eq!(splice_line(source, 2, "TWO"), "one\nTWO\nthree\n");
    assert_eq!(
        insert_lines(source, 0, &["zero".to_string()]),
        "zero\none\ntwo\nthree\n"
    );
    assert_eq!(
        insert_lines(source, 3, &["four".to_string()]),
        "one\ntwo\nthree\nfour\n"
    );
    assert_eq!(delete_lines(source, 1, 2), "three\n");
    assert_eq!(
        replace_lines(source, 2, 3, &["x".to_string(), "y".to_string(), "z".to_string()]),
        "one\nx\ny\nz\n"
    );
}

#[test]
fn test_line_surgery_out_of_range_is_identity() {
    let source = "one\ntwo";
    assert_eq!(splice_line(source, 5, "x"), source);
    assert_eq!(insert_lines(source, 7, &["x".to_string()]), source);
    assert_eq!(delete_lines(source, 0, 1), source);
    assert_eq!(delete_lines(source, 2, 1), source);
    assert_eq!(replace_lines(source, 1, 9, &[]), source);
}

#[test]
fn test_find_block_end_line() {
    assert_eq!(find_block_end_line(LOGIN, 23), Ok(26));
    assert_eq!(find_block_end_line(LOGIN, 27), Ok(31));
    assert_eq!(find_block_end_line(LOGIN, 32), Ok(36));
    assert_eq!(find_block_end_line(LOGIN, 22), Ok(38));
    assert_eq!(find_block_end_line(LOGIN, 12), Ok(39));
}

#[test]
fn test_find_block_end_ignores_braces_in_strings_and_comments() {
    let source = "REPEAT 2 TIMES {\n    LOG \"}\" # }\n    LOG {x} // {\n}\n";
    assert_eq!(find_block_end_line(source, 1), Ok(4));
}

#[test]
fn test_find_block_end_nested_depths() {
    let headers = ["FOR EACH x IN xs {", "IF {x} = 1 {", "TRY {", "REPEAT 2 TIMES {"];
    for depth in 1..=6 {
        let mut lines = Vec::new();
        for level in 0..depth {
            lines.push(format!("{}{}", "    ".repeat(level), headers[level % headers.len()]));
        }
        lines.push(format!("{}LOG \"deep\"", "    ".repeat(depth)));
        for level in (0..depth).rev() {
            lines.push(format!("{}}}", "    ".repeat(level)));
        }
        let source = lines.join("\n");
        for level in 0..depth {
            assert_eq!(
                find_block_end_line(&source, level + 1),
                Ok(2 * depth + 1 - level),
                "depth {} level {}",
                depth,
                level
            );
        }
    }
}

#[test]
fn test_find_block_end_unterminated() {
    let source = "TRY {\n    LOG \"x\"\n";
    assert_eq!(
        find_block_end_line(source, 1),
        Err(EditError::UnterminatedBlock { line: 1 })
    );
    assert_eq!(
        find_block_end_line(source, 40),
        Err(EditError::LineOutOfRange(40))
    );
}

// ── Parser and emitter ──────────────────────────────────────────────

#[test]
fn test_parse_login_fixture() {
    let result = parse_source(LOGIN);
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let page = &result.program.pages[0];
    assert_eq!(page.name, "LoginPage");
    assert_eq!(page.fields.len(), 2);
    assert_eq!(page.actions[0].params, vec!["user", "pass"]);

    let feature = &result.program.features[0];
    assert_eq!(feature.uses, vec!["LoginPage"]);
    assert_eq!(feature.end_line, 39);

    let first = &feature.scenarios[0];
    assert_eq!(first.name, "ValidLogin");
    assert_eq!(first.annotations, vec!["smoke"]);
    assert_eq!(first.tags, vec!["fast"]);
    assert_eq!((first.line, first.end_line), (15, 20));
    assert_eq!(
        first.statements[1],
        Statement::Fill {
            target: Target::PageField {
                page: "LoginPage".to_string(),
                field: "email".to_string(),
            },
            value: Expression::string("user@example.com"),
            line: 17,
        }
    );
}

#[test]
fn test_parse_kitchen_sink() {
    let result = parse_source(KITCHEN_SINK);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let scenario = &result.program.features[0].scenarios[0];
    assert_eq!(scenario.statements.len(), 48);
    assert_eq!(
        scenario.statements[0],
        Statement::Open {
            url: Expression::Env {
                name: "BASE_URL".to_string()
            },
            line: 3,
        }
    );
}

#[test]
fn test_format_is_stable() {
    for source in [LOGIN, KITCHEN_SINK] {
        let once = emit_program(&parse_source(source).program);
        let reparsed = parse_source(&once);
        assert!(reparsed.errors.is_empty(), "{:?}", reparsed.errors);
        let twice = emit_program(&reparsed.program);
        assert_eq!(once, twice);
    }
}

#[test]
fn test_flattened_steps_survive_reemission() {
    let shape = |source: &str| -> Vec<(StepCategory, usize, String)> {
        crate::build_view(source)
            .scenarios
            .iter()
            .flat_map(|s| s.steps.iter())
            .map(|s| (s.category, s.depth, s.number.clone()))
            .collect()
    };
    for source in [LOGIN, KITCHEN_SINK, NESTED_EMPTY_LOOP] {
        let emitted = emit_program(&parse_source(source).program);
        assert_eq!(shape(&emitted), shape(source));
    }
}

#[test]
fn test_emit_statement_matches_source_lines() {
    // Every line of the kitchen sink is already in canonical form.
    let result = parse_source(KITCHEN_SINK);
    for stmt in &result.program.features[0].scenarios[0].statements {
        let indent = get_indent(KITCHEN_SINK, stmt.line());
        let emitted = emit_statement(stmt, indent);
        assert_eq!(emitted[0], line_of(KITCHEN_SINK, stmt.line()));
    }
}

#[test]
fn test_syntax_error_is_reported_with_position() {
    let result = parse_source("FEATURE F {\n    SCENARIO S {\n        CLICK\n    }\n}\n");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].begin.line, 4);
    assert_eq!(result.errors[0].code, "vero-syntax-error");
}

#[test]
fn test_unknown_statement_recovers() {
    let source = "FEATURE F {\n    SCENARIO S {\n        JUMP \"x\"\n        LOG \"y\"\n    }\n}\n";
    let result = parse_source(source);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].begin.line, 3);
    let scenario = &result.program.features[0].scenarios[0];
    assert_eq!(scenario.statements.len(), 1);
    assert_eq!(scenario.statements[0].kind(), StatementKind::Log);
}

#[test]
fn test_stray_closing_brace_at_top_level() {
    let result = parse_source("FEATURE A {\n}\n}\n");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].begin.line, 3);
    assert_eq!(result.program.features.len(), 1);

    let result = parse_source("FEATURE A {\n    SCENARIO X {\n    }\n}\n}\n");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].begin.line, 5);
    assert_eq!(result.program.features[0].scenarios.len(), 1);
}

#[test]
fn test_missing_feature_brace_recovers() {
    let source = "FEATURE A\n    SCENARIO X {\n    }\n}\n";
    let result = parse_source(source);
    let lines: Vec<usize> = result.errors.iter().map(|e| e.begin.line).collect();
    assert_eq!(lines, vec![2, 2, 4]);

    let editor = ScriptEditor::new(source);
    assert_eq!(editor.state().parse_errors.len(), 3);
    assert!(editor.scenarios().is_empty());
}

// ── Flattening ──────────────────────────────────────────────────────

#[test]
fn test_flatten_numbering_and_ids() {
    let view = crate::build_view(LOGIN);
    assert!(view.errors.is_empty());
    assert_eq!(view.scenarios.len(), 2);
    assert_eq!(view.scenarios[0].feature, "Login");

    let rows: Vec<(String, String, usize, usize, Option<BlockLabel>)> = view.scenarios[1]
        .steps
        .iter()
        .map(|s| (s.id.clone(), s.number.clone(), s.depth, s.line, s.block_label))
        .collect();
    let expected = vec![
        ("s1-0", "1", 0, 23, None),
        ("s1-0.-1.0", "1.1", 1, 24, None),
        ("s1-0.-1.1", "1.2", 1, 25, None),
        ("s1-1", "2", 0, 27, None),
        ("s1-1.-4.0", "2.1", 1, 28, None),
        ("s1-1.-5.0", "2.2", 1, 30, None),
        ("s1-2", "3", 0, 32, Some(BlockLabel::Try)),
        ("s1-2.-2.0", "3.1", 1, 33, None),
        ("s1-2-catch", "3", 0, 34, Some(BlockLabel::Catch)),
        ("s1-2.-3.0", "3.2", 1, 35, None),
        ("s1-3", "4", 0, 37, None),
    ];
    let expected: Vec<(String, String, usize, usize, Option<BlockLabel>)> = expected
        .into_iter()
        .map(|(id, n, d, l, b)| (id.to_string(), n.to_string(), d, l, b))
        .collect();
    assert_eq!(rows, expected);
}

#[test]
fn test_statement_path_resolves() {
    let view = crate::build_view(LOGIN);
    let program = parse_source(LOGIN).program;
    let statements = &program.features[0].scenarios[1].statements;

    for step in &view.scenarios[1].steps {
        let found = resolve_path(statements, &step.statement_path);
        assert_eq!(found, Some(&step.statement), "step {}", step.id);
    }

    let catch_child = view.scenarios[1].step("s1-2.-3.0").unwrap();
    assert_eq!(catch_child.statement_path.to_sentinels(), vec![2, -3, 0]);
    assert_eq!(
        StatementPath::from_sentinels(&[2, -3, 0]),
        Some(catch_child.statement_path.clone())
    );
    assert_eq!(StatementPath::from_sentinels(&[1, -9]), None);
    assert_eq!(
        serde_json::to_value(&catch_child.statement_path).unwrap(),
        serde_json::json!([2, -3, 0])
    );
}

#[test]
fn test_scenario_with_error_has_no_steps() {
    let source = "FEATURE F {\n    SCENARIO Good {\n        LOG \"a\"\n    }\n    SCENARIO Bad {\n        FILL \"x\"\n    }\n}\n";
    let view = crate::build_view(source);
    assert_eq!(view.errors.len(), 1);
    assert_eq!(view.scenarios.len(), 2);
    assert_eq!(view.scenarios[0].steps.len(), 1);
    assert!(view.scenarios[1].steps.is_empty());
}

// ── Field values ────────────────────────────────────────────────────

#[test]
fn test_fixture_field_values() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(FIELD_VALUE_FIXTURES).unwrap();
    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();
        let actual = serde_json::to_value(parse_field_value(input)).unwrap();
        assert_eq!(actual, fixture["expected"], "Fixture '{}'", name);
    }
}

#[test]
fn test_field_value_inverts_emitter() {
    let expressions = vec![
        Expression::string("plain"),
        Expression::string("with \"quotes\" and \\"),
        Expression::string("42"),
        Expression::string("TRUE"),
        Expression::string("{not_a_var"),
        Expression::Number(3.0),
        Expression::Number(-0.25),
        Expression::Boolean(false),
        Expression::variable("user"),
        Expression::Variable {
            page: Some("row".to_string()),
            name: "email".to_string(),
        },
        Expression::Variable {
            page: Some("LoginPage".to_string()),
            name: "email".to_string(),
        },
        Expression::Env {
            name: "TOKEN".to_string(),
        },
    ];
    for expr in expressions {
        assert_eq!(parse_field_value(&emit_expression(&expr)), expr);
    }
}

#[test]
fn test_editable_fields() {
    let view = crate::build_view(LOGIN);
    let fill = view.scenarios[0].step("s0-1").unwrap();
    let fields = editable_fields(&fill.statement);
    let summary: Vec<(&str, FieldKind, &str)> = fields
        .iter()
        .map(|f| (f.path.as_str(), f.kind, f.value.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("target.page", FieldKind::Identifier, "LoginPage"),
            ("target.field", FieldKind::Identifier, "email"),
            ("value", FieldKind::Expression, "\"user@example.com\""),
        ]
    );
}

#[test]
fn test_describe_rows() {
    let view = crate::build_view(LOGIN);
    let rows: Vec<String> = view.scenarios[1]
        .steps
        .iter()
        .take(3)
        .map(|s| describe(&s.statement))
        .collect();
    assert_eq!(
        rows,
        vec![
            "For each row in users",
            "fill LoginPage.email",
            "click LoginPage.submit"
        ]
    );
}

// ── Factory ─────────────────────────────────────────────────────────

#[test]
fn test_default_statements_parse() {
    for kind in StatementKind::all() {
        let stmt = default_statement(kind);
        let body = emit_statement(&stmt, "        ").join("\n");
        let source = format!("FEATURE F {{\n    SCENARIO S {{\n{}\n    }}\n}}\n", body);
        let result = parse_source(&source);
        assert!(
            result.errors.is_empty(),
            "default {} does not parse: {:?}",
            kind.tag(),
            result.errors
        );
        let parsed = &result.program.features[0].scenarios[0].statements[0];
        assert_eq!(parsed.kind(), kind);
    }
}

#[test]
fn test_create_default_statement_by_tag() {
    assert_eq!(create_default_statement("for-each").kind(), StatementKind::ForEach);
    assert_eq!(create_default_statement("verify-url").kind(), StatementKind::VerifyUrl);
    assert_eq!(create_default_statement("no-such-step").kind(), StatementKind::Log);
    for kind in StatementKind::all() {
        assert_eq!(StatementKind::from_tag(kind.tag()), Some(kind));
    }
}

// ── Editor: field edits ─────────────────────────────────────────────

#[test]
fn test_edit_leaf_field_touches_one_line() {
    let mut editor = login_editor();
    let click = step(&editor, "s0-2");
    editor.edit_field(&click, "target.text", "Log in").unwrap();

    assert_eq!(line_of(editor.source(), 18), "        CLICK \"Log in\"");
    assert_eq!(changed_lines(LOGIN, editor.source()), vec![18]);
    assert_eq!(step(&editor, "s0-2").statement, Statement::Click {
        target: Target::text("Log in"),
        line: 18,
    });
}

#[test]
fn test_edit_expression_field_reparses_value() {
    let mut editor = login_editor();
    let fill = step(&editor, "s0-1");
    editor.edit_field(&fill, "value", "{{ADMIN_EMAIL}}").unwrap();
    assert_eq!(
        line_of(editor.source(), 17),
        "        FILL LoginPage.email WITH {{ADMIN_EMAIL}}"
    );
}

#[test]
fn test_edit_block_header_keeps_body() {
    let mut editor = login_editor();
    editor.set_active_scenario(1).unwrap();
    let each = step(&editor, "s1-0");
    editor.edit_field(&each, "collection", "admins").unwrap();

    assert_eq!(line_of(editor.source(), 23), "        FOR EACH row IN admins {");
    assert_eq!(changed_lines(LOGIN, editor.source()), vec![23]);
}

#[test]
fn test_edit_condition_field() {
    let mut editor = login_editor();
    editor.set_active_scenario(1).unwrap();
    let branch = step(&editor, "s1-1");
    editor.edit_field(&branch, "condition.negated", "true").unwrap();
    assert_eq!(line_of(editor.source(), 27), "        IF \"Welcome\" IS NOT VISIBLE {");
}

#[test]
fn test_edit_single_line_scenario_keeps_surroundings() {
    let source = "FEATURE F {\n    SCENARIO Quick { CLICK \"Login\" }\n}\n";
    let mut editor = ScriptEditor::new(source);
    let click = step(&editor, "s0-0");
    assert_eq!(click.line, 2);
    editor.edit_field(&click, "target.text", "Go").unwrap();
    assert_eq!(
        editor.source(),
        "FEATURE F {\n    SCENARIO Quick { CLICK \"Go\" }\n}\n"
    );
}

#[test]
fn test_edit_irregular_spacing_on_shared_line() {
    let source = "FEATURE F {\n    SCENARIO X { CLICK  \"Login\" }\n}\n";
    let mut editor = ScriptEditor::new(source);
    let click = step(&editor, "s0-0");
    editor.edit_field(&click, "target.text", "Submit").unwrap();
    assert_eq!(
        editor.source(),
        "FEATURE F {\n    SCENARIO X { CLICK \"Submit\" }\n}\n"
    );
    assert!(editor.state().parse_errors.is_empty());
    assert_eq!(editor.active_scenario().unwrap().steps.len(), 1);
}

#[test]
fn test_edit_keeps_trailing_comment_and_rewrites_number() {
    let source = "FEATURE F {
    SCENARIO S {
        LOG   \"start\"   # first
        SET count = 1.0
    }
}
";
    let mut editor = ScriptEditor::new(source);
    let log = step(&editor, "s0-0");
    editor.edit_field(&log, "message", "\"begin\"").unwrap();
    assert_eq!(line_of(editor.source(), 3), "        LOG \"begin\"   # first");

    let set = step(&editor, "s0-1");
    editor.edit_field(&set, "variable", "total").unwrap();
    assert_eq!(line_of(editor.source(), 4), "        SET total = 1");
    assert_eq!(changed_lines(source, editor.source()), vec![3, 4]);

    let log = step(&editor, "s0-0");
    editor.delete_step(&log).unwrap();
    assert_eq!(
        editor.source(),
        "FEATURE F {\n    SCENARIO S {\n        SET total = 1\n    }\n}\n"
    );
}

#[test]
fn test_edit_picks_the_right_step_on_a_crowded_line() {
    let source = "FEATURE F {
    SCENARIO S {
        IF {x} = 1 { CLICK \"Go\" } ELSE { CLICK \"Stop\" }
    }
}
";
    let mut editor = ScriptEditor::new(source);
    let otherwise = step(&editor, "s0-0.-5.0");
    editor.edit_field(&otherwise, "target.text", "Halt").unwrap();
    assert_eq!(
        line_of(editor.source(), 3),
        "        IF {x} = 1 { CLICK \"Go\" } ELSE { CLICK \"Halt\" }"
    );

    let twin = "FEATURE F {
    SCENARIO S {
        IF {x} = 1 { CLICK \"Go\" } ELSE { CLICK \"Go\" }
    }
}
";
    let mut editor = ScriptEditor::new(twin);
    let otherwise = step(&editor, "s0-0.-5.0");
    let err = editor
        .edit_field(&otherwise, "target.text", "Halt")
        .unwrap_err();
    assert_eq!(err, EditError::AmbiguousStep { line: 3 });
    assert_eq!(editor.source(), twin);
    let err = editor.delete_step(&otherwise).unwrap_err();
    assert_eq!(err, EditError::AmbiguousStep { line: 3 });
    assert!(!editor.can_undo());
}

#[test]
fn test_name_fields_only_accept_identifiers() {
    let mut editor = login_editor();
    let fill = step(&editor, "s0-1");
    let err = editor
        .edit_field(&fill, "target.page", "Login Page")
        .unwrap_err();
    assert_eq!(err, EditError::InvalidName("Login Page".to_string()));
    assert_eq!(editor.source(), LOGIN);
    assert!(!editor.can_undo());

    editor.edit_field(&fill, "target.page", " SignupPage ").unwrap();
    assert_eq!(
        line_of(editor.source(), 17),
        "        FILL SignupPage.email WITH \"user@example.com\""
    );
    assert!(editor.state().parse_errors.is_empty());
}

#[test]
fn test_unknown_field_is_rejected() {
    let mut editor = login_editor();
    let click = step(&editor, "s0-2");
    let err = editor.edit_field(&click, "bogus", "x").unwrap_err();
    assert_eq!(
        err,
        EditError::UnknownField {
            path: "bogus".to_string(),
            kind: "click",
        }
    );
    assert_eq!(editor.source(), LOGIN);
    assert!(!editor.can_undo());
}

#[test]
fn test_identical_edit_records_nothing() {
    let mut editor = login_editor();
    let click = step(&editor, "s0-2");
    editor.edit_field(&click, "target.text", "Sign in").unwrap();
    assert_eq!(editor.source(), LOGIN);
    assert!(!editor.can_undo());
}

#[test]
fn test_stale_step_is_rejected() {
    let mut editor = login_editor();
    let click = step(&editor, "s0-2");
    editor.edit_field(&click, "target.text", "Log in").unwrap();
    let before = editor.source().to_string();

    let err = editor.edit_field(&click, "target.text", "Again").unwrap_err();
    assert_eq!(err, EditError::StaleStep("s0-2".to_string()));
    assert_eq!(editor.source(), before);
}

#[test]
fn test_edits_refused_while_source_has_errors() {
    let mut editor = login_editor();
    let click = step(&editor, "s0-2");

    let broken = LOGIN.replace("VERIFY URL CONTAINS", "VERIFY URL SOMEWHAT");
    editor.load(&broken);
    assert_eq!(editor.state().parse_errors.len(), 1);
    assert!(editor.scenarios()[0].steps.is_empty());

    assert_eq!(
        editor.edit_field(&click, "target.text", "x"),
        Err(EditError::ParseErrors(1))
    );
    assert_eq!(editor.delete_step(&click), Err(EditError::ParseErrors(1)));
    assert_eq!(
        editor.add_step(None, default_statement(StatementKind::Log)),
        Err(EditError::ParseErrors(1))
    );
    assert_eq!(editor.move_step(0, 1), Err(EditError::ParseErrors(1)));
    assert_eq!(editor.add_scenario("Later"), Err(EditError::ParseErrors(1)));
    assert_eq!(editor.source(), broken);
}

// ── Editor: structure edits ─────────────────────────────────────────

#[test]
fn test_add_step_into_empty_loop() {
    let mut editor = ScriptEditor::new(NESTED_EMPTY_LOOP);
    let each = step(&editor, "s0-0");
    editor
        .add_step(Some(&each), Statement::Log {
            message: Expression::string("hi"),
            line: 0,
        })
        .unwrap();

    assert_eq!(
        editor.source(),
        "FEATURE F {
    SCENARIO S {
        FOR EACH item IN items {
            LOG \"hi\"
        }
        LOG \"after\"
    }
}
"
    );
    let selected = editor.selected_step().unwrap();
    assert_eq!(selected.id, "s0-0.-1.0");
    assert_eq!(selected.line, 4);
}

#[test]
fn test_add_step_after_block_appends_to_its_body() {
    let mut editor = login_editor();
    editor.set_active_scenario(1).unwrap();
    let each = step(&editor, "s1-0");
    editor
        .add_step(Some(&each), create_default_statement("wait-for-navigation"))
        .unwrap();

    assert_eq!(line_of(editor.source(), 26), "            WAIT FOR NAVIGATION");
    assert_eq!(line_of(editor.source(), 27), "        }");
    assert_eq!(editor.selected_step().unwrap().id, "s1-0.-1.2");
}

#[test]
fn test_add_step_after_catch_row() {
    let mut editor = login_editor();
    editor.set_active_scenario(1).unwrap();
    let catch_row = step(&editor, "s1-2-catch");
    editor
        .add_step(Some(&catch_row), create_default_statement("refresh"))
        .unwrap();

    assert_eq!(line_of(editor.source(), 36), "            REFRESH");
    assert_eq!(editor.selected_step().unwrap().id, "s1-2.-3.1");
}

#[test]
fn test_add_step_after_leaf_and_at_top() {
    let mut editor = login_editor();
    let open = step(&editor, "s0-0");
    editor
        .add_step(Some(&open), create_default_statement("refresh"))
        .unwrap();
    assert_eq!(line_of(editor.source(), 17), "        REFRESH");

    editor
        .add_step(None, create_default_statement("go-back"))
        .unwrap();
    assert_eq!(line_of(editor.source(), 16), "        GO BACK");
    assert_eq!(editor.selected_step().unwrap().id, "s0-0");
    assert_eq!(editor.active_scenario().unwrap().steps.len(), 6);
}

#[test]
fn test_add_nested_block_step() {
    let mut editor = login_editor();
    let verify = step(&editor, "s0-3");
    editor
        .add_step(Some(&verify), create_default_statement("try-catch"))
        .unwrap();
    assert_eq!(line_of(editor.source(), 20), "        TRY {");
    assert_eq!(line_of(editor.source(), 21), "        } CATCH {");
    assert_eq!(line_of(editor.source(), 22), "        }");
    assert!(editor.state().parse_errors.is_empty());
}

#[test]
fn test_add_step_after_leaf_that_closes_its_scenario() {
    let source = "FEATURE F {\n    SCENARIO X { CLICK \"Login\" }\n}\n";
    let mut editor = ScriptEditor::new(source);
    let click = step(&editor, "s0-0");
    let err = editor
        .add_step(Some(&click), create_default_statement("click"))
        .unwrap_err();
    assert_eq!(err, EditError::ClosesEnclosingBlock { line: 2 });
    assert_eq!(editor.source(), source);
    assert!(!editor.can_undo());

    let open_ended = "FEATURE F {\n    SCENARIO X { CLICK \"Login\"\n    }\n}\n";
    let mut editor = ScriptEditor::new(open_ended);
    let click = step(&editor, "s0-0");
    editor
        .add_step(Some(&click), create_default_statement("click"))
        .unwrap();
    assert_eq!(line_of(editor.source(), 3), "    CLICK \"Button\"");
    assert!(editor.state().parse_errors.is_empty());
    assert_eq!(editor.active_scenario().unwrap().steps.len(), 2);
}

#[test]
fn test_add_step_into_block_closed_on_its_header() {
    let source = "FEATURE F {
    SCENARIO S {
        FOR EACH item IN items { }
    }
}
";
    let mut editor = ScriptEditor::new(source);
    let each = step(&editor, "s0-0");
    let err = editor
        .add_step(Some(&each), create_default_statement("log"))
        .unwrap_err();
    assert_eq!(err, EditError::SingleLineBlock { line: 3 });
    assert_eq!(editor.source(), source);
}

#[test]
fn test_delete_try_catch_removes_whole_block() {
    let mut editor = login_editor();
    editor.set_active_scenario(1).unwrap();
    let catch_row = step(&editor, "s1-2-catch");
    editor.delete_step(&catch_row).unwrap();

    assert_eq!(line_count(editor.source()), line_count(LOGIN) - 5);
    assert_eq!(line_of(editor.source(), 32), "        LOG \"done\"");
    let ids: Vec<String> = editor
        .active_scenario()
        .unwrap()
        .steps
        .iter()
        .map(|s| s.id.clone())
        .collect();
    assert_eq!(
        ids,
        vec!["s1-0", "s1-0.-1.0", "s1-0.-1.1", "s1-1", "s1-1.-4.0", "s1-1.-5.0", "s1-2"]
    );
}

#[test]
fn test_delete_leaf_and_clear_selection() {
    let mut editor = login_editor();
    editor.select_step(Some("s0-2"));
    assert!(editor.selected_step().is_some());

    let click = step(&editor, "s0-2");
    editor.delete_step(&click).unwrap();
    assert_eq!(line_of(editor.source(), 18), "        VERIFY URL CONTAINS \"/dashboard\"");
    assert!(editor.selected_step().is_none());
}

#[test]
fn test_delete_from_single_line_scenario() {
    let source = "FEATURE F {\n    SCENARIO Quick { CLICK \"Login\" }\n}\n";
    let mut editor = ScriptEditor::new(source);
    let click = step(&editor, "s0-0");
    editor.delete_step(&click).unwrap();
    assert_eq!(editor.source(), "FEATURE F {\n    SCENARIO Quick {  }\n}\n");
    assert!(editor.state().parse_errors.is_empty());
    assert!(editor.active_scenario().unwrap().steps.is_empty());
}

#[test]
fn test_delete_irregular_spacing_on_shared_line() {
    let source = "FEATURE F {\n    SCENARIO X { CLICK  \"Login\" }\n}\n";
    let mut editor = ScriptEditor::new(source);
    let click = step(&editor, "s0-0");
    editor.delete_step(&click).unwrap();
    assert_eq!(editor.source(), "FEATURE F {\n    SCENARIO X {  }\n}\n");
    assert!(editor.state().parse_errors.is_empty());
    assert_eq!(editor.scenarios().len(), 1);
    assert!(editor.active_scenario().unwrap().steps.is_empty());
}

#[test]
fn test_move_step_preserves_indentation() {
    let mut editor = login_editor();
    editor.move_step(0, 2).unwrap();

    let lines: Vec<&str> = editor.source().split('\n').skip(15).take(4).collect();
    assert_eq!(
        lines,
        vec![
            "        FILL LoginPage.email WITH \"user@example.com\"",
            "        CLICK \"Sign in\"",
            "        OPEN \"https://example.com/login\"",
            "        VERIFY URL CONTAINS \"/dashboard\"",
        ]
    );
    assert_eq!(changed_lines(LOGIN, editor.source()), vec![16, 17, 18]);
    assert_eq!(editor.selected_step().unwrap().kind, StatementKind::Open);
}

#[test]
fn test_move_block_step() {
    let mut editor = login_editor();
    editor.set_active_scenario(1).unwrap();
    editor.move_step(2, 0).unwrap();

    assert_eq!(line_of(editor.source(), 23), "        TRY {");
    assert_eq!(line_of(editor.source(), 28), "        FOR EACH row IN users {");
    assert_eq!(line_of(editor.source(), 38), "    }");
    let top: Vec<StatementKind> = editor
        .active_scenario()
        .unwrap()
        .steps
        .iter()
        .filter(|s| s.depth == 0 && s.block_label != Some(BlockLabel::Catch))
        .map(|s| s.kind)
        .collect();
    assert_eq!(
        top,
        vec![
            StatementKind::TryCatch,
            StatementKind::ForEach,
            StatementKind::If,
            StatementKind::Log
        ]
    );
}

#[test]
fn test_move_step_out_of_range() {
    let mut editor = login_editor();
    assert_eq!(
        editor.move_step(0, 4),
        Err(EditError::MoveOutOfRange { from: 0, to: 4, len: 4 })
    );
    assert_eq!(editor.move_step(1, 1), Ok(()));
    assert_eq!(editor.source(), LOGIN);
    assert!(!editor.can_undo());
}

#[test]
fn test_add_scenario() {
    let mut editor = login_editor();
    editor.add_scenario("New Flow!").unwrap();

    assert_eq!(line_of(editor.source(), 39), "");
    assert_eq!(line_of(editor.source(), 40), "    SCENARIO NewFlow {");
    assert_eq!(line_of(editor.source(), 41), "    }");
    assert_eq!(line_of(editor.source(), 42), "}");
    assert_eq!(editor.state().active_scenario, 2);
    assert_eq!(editor.active_scenario().unwrap().name, "NewFlow");
}

#[test]
fn test_add_scenario_with_unusable_name() {
    let mut editor = ScriptEditor::new("FEATURE F {\n}\n");
    editor.add_scenario("!!!").unwrap();
    assert_eq!(editor.source(), "FEATURE F {\n\n    SCENARIO NewScenario {\n    }\n}\n");
    assert_eq!(editor.state().active_scenario, 0);
}

#[test]
fn test_add_scenario_without_feature() {
    let mut editor = ScriptEditor::new("PAGE P {\n}\n");
    assert_eq!(editor.add_scenario("X"), Err(EditError::NoFeature));
}

// ── History ─────────────────────────────────────────────────────────

#[test]
fn test_undo_redo() {
    let mut editor = login_editor();
    let click = step(&editor, "s0-2");
    editor.edit_field(&click, "target.text", "Log in").unwrap();
    let edited = editor.source().to_string();

    editor.undo().unwrap();
    assert_eq!(editor.source(), LOGIN);
    assert!(editor.can_redo());

    editor.redo().unwrap();
    assert_eq!(editor.source(), edited);
    assert_eq!(editor.redo(), Err(EditError::HistoryEmpty("redo")));
}

#[test]
fn test_new_edit_clears_redo() {
    let mut editor = login_editor();
    editor.move_step(0, 1).unwrap();
    editor.undo().unwrap();
    assert!(editor.can_redo());

    let click = step(&editor, "s0-2");
    editor.edit_field(&click, "target.text", "Log in").unwrap();
    assert!(!editor.can_redo());
}

#[test]
fn test_history_is_bounded() {
    let mut editor = login_editor();
    for i in 0..51 {
        let click = step(&editor, "s0-2");
        editor
            .edit_field(&click, "target.text", &format!("Button {}", i))
            .unwrap();
    }
    for _ in 0..50 {
        editor.undo().unwrap();
    }
    assert_eq!(editor.undo(), Err(EditError::HistoryEmpty("undo")));
    // The oldest snapshot was evicted; we stop one edit short of the file.
    assert_eq!(line_of(editor.source(), 18), "        CLICK \"Button 0\"");
}

#[test]
fn test_configured_history_limit() {
    let config = EditorConfig::from_json(r#"{ "historyLimit": 2 }"#).unwrap();
    assert_eq!(config.step_indent, "        ");
    let mut editor = ScriptEditor::with_parser(VeroParser, config, LOGIN);
    for text in ["a", "b", "c"] {
        let click = step(&editor, "s0-2");
        editor.edit_field(&click, "target.text", text).unwrap();
    }
    assert_eq!(editor.state().history.undo_len(), 2);
}

#[test]
fn test_content_history_ring_buffer() {
    let mut history = ContentHistory::new(2);
    history.record("a".to_string());
    history.record("b".to_string());
    history.record("c".to_string());
    assert_eq!(history.undo_len(), 2);
    assert_eq!(history.undo("d".to_string()), Some("c".to_string()));
    assert_eq!(history.undo("c".to_string()), Some("b".to_string()));
    assert_eq!(history.undo("b".to_string()), None);
    assert_eq!(history.redo("b".to_string()), Some("c".to_string()));
    history.record("x".to_string());
    assert!(!history.can_redo());
}

// ── Content owner and state ─────────────────────────────────────────

#[test]
fn test_listener_sees_every_editor_change() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut editor = login_editor();
    let sink = Rc::clone(&seen);
    editor.on_content_change(move |text| sink.borrow_mut().push(text.to_string()));

    let click = step(&editor, "s0-2");
    editor.edit_field(&click, "target.text", "Log in").unwrap();
    editor.undo().unwrap();
    editor.load("FEATURE F {\n}\n");

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].contains("CLICK \"Log in\""));
    assert_eq!(seen[1], LOGIN);
}

#[test]
fn test_reducer_drops_unknown_selection() {
    let view = crate::build_view(LOGIN);
    let state = reduce(
        BuilderState::default(),
        BuilderAction::Parsed {
            scenarios: view.scenarios,
            errors: view.errors,
        },
    );
    let state = reduce(state, BuilderAction::SelectStep(Some("s0-1".to_string())));
    assert_eq!(state.selected_step().unwrap().kind, StatementKind::Fill);

    let state = reduce(state, BuilderAction::SelectStep(Some("s9-9".to_string())));
    assert_eq!(state.selected_step_id, None);

    let state = reduce(state, BuilderAction::SetActiveScenario(7));
    assert_eq!(state.active_scenario, 0);
}

#[test]
fn test_switching_scenario_clears_selection() {
    let mut editor = login_editor();
    editor.select_step(Some("s0-0"));
    editor.set_active_scenario(1).unwrap();
    assert!(editor.selected_step().is_none());
    assert_eq!(editor.set_active_scenario(5), Err(EditError::NoScenario(5)));
}

#[test]
fn test_config_defaults() {
    let config = EditorConfig::from_json("{}").unwrap();
    assert_eq!(config, EditorConfig::default());
    assert_eq!(config.history_limit, 50);
    assert!(EditorConfig::from_json("{ \"historyLimit\": \"many\" }").is_err());
}
