use vero_builder::fields::describe;
use vero_builder::flatten::BlockLabel;
use vero_builder::{
    build_view, format_source, EditorConfig, ParseError, ScriptEditor, VeroParser,
};

use serde_json::json;
use std::io::{self, Read};
use std::process::ExitCode;
use tracing::{info, warn};

const USAGE: &str = "usage: vero [flatten|list|format|check] < file.vero";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "flatten".to_string());

    let mut input = String::new();
    if let Err(err) = io::stdin().read_to_string(&mut input) {
        eprintln!("failed to read stdin: {}", err);
        return ExitCode::FAILURE;
    }

    match command.as_str() {
        "flatten" => flatten(&input),
        "list" => list(&input),
        "format" => match format_source(&input) {
            Ok(formatted) => {
                print!("{}", formatted);
                ExitCode::SUCCESS
            }
            Err(errors) => report(&input, &errors),
        },
        "check" => match format_source(&input) {
            Ok(_) => ExitCode::SUCCESS,
            Err(errors) => report(&input, &errors),
        },
        _ => {
            eprintln!("{}", USAGE);
            ExitCode::from(2)
        }
    }
}

fn load_config() -> EditorConfig {
    match std::env::var("VERO_EDITOR_CONFIG") {
        Ok(path) => match EditorConfig::from_path(&path) {
            Ok(config) => {
                info!(path = path.as_str(), "loaded editor config");
                config
            }
            Err(err) => {
                warn!(path = path.as_str(), error = %err, "using default editor config");
                EditorConfig::default()
            }
        },
        Err(_) => EditorConfig::default(),
    }
}

fn flatten(input: &str) -> ExitCode {
    let editor = ScriptEditor::with_parser(VeroParser, load_config(), input);
    let state = editor.state();
    let output = json!({
        "scenarios": state.scenarios,
        "errors": state.parse_errors,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(err) => {
            eprintln!("failed to serialize view: {}", err);
            return ExitCode::FAILURE;
        }
    }
    if state.parse_errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        report(input, &state.parse_errors)
    }
}

/// Print each scenario's step rows the way the builder lists them.
fn list(input: &str) -> ExitCode {
    let view = build_view(input);
    for scenario in &view.scenarios {
        println!("{} / {}", scenario.feature, scenario.name);
        for step in &scenario.steps {
            let summary = match step.block_label {
                Some(BlockLabel::Catch) => BlockLabel::Catch.as_str().to_string(),
                _ => describe(&step.statement),
            };
            println!(
                "{}{:<6} {}",
                "  ".repeat(step.depth + 1),
                step.number,
                summary
            );
        }
    }
    if view.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        report(input, &view.errors)
    }
}

fn report(input: &str, errors: &[ParseError]) -> ExitCode {
    let lines: Vec<&str> = input.lines().collect();

    for err in errors {
        let line_num = err.begin.line;
        let line_text = line_num
            .checked_sub(1)
            .and_then(|i| lines.get(i))
            .copied()
            .unwrap_or("");

        eprintln!("ERROR AT LINE {}:", line_num);
        eprintln!("{}", line_text);

        let start_col = err.begin.column;
        let end_col = if err.begin.line == err.end.line && err.end.column > err.begin.column {
            err.end.column
        } else if start_col < line_text.len() {
            line_text.len()
        } else {
            start_col + 1
        };

        let mut underline = " ".repeat(start_col);
        underline.push('^');
        if end_col > start_col + 1 {
            underline.push_str(&"_".repeat(end_col - start_col - 1));
        }

        eprintln!("{}", underline);
        eprintln!("{}", err.message);
        eprintln!();
    }

    ExitCode::FAILURE
}
