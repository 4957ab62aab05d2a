//! Line-indexed text surgery over a source string.
//!
//! Lines are 1-based and delimited by `\n`; every function splits, edits and
//! rejoins, so a trailing newline survives as an empty last line. Requests
//! that fall outside the source return the input unchanged. These are the
//! only functions the editor uses to mutate source text.

use crate::error::EditError;

pub fn line_count(source: &str) -> usize {
    source.split('\n').count()
}

pub fn get_line(source: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source.split('\n').nth(line - 1)
}

/// Leading whitespace of `line`, or `""` when out of range.
pub fn get_indent(source: &str, line: usize) -> &str {
    match get_line(source, line) {
        Some(text) => {
            let trimmed = text.trim_start_matches([' ', '\t']);
            &text[..text.len() - trimmed.len()]
        }
        None => "",
    }
}

/// Replace the whole of `line` with `text`.
pub fn splice_line(source: &str, line: usize, text: &str) -> String {
    let mut lines: Vec<&str> = source.split('\n').collect();
    if line == 0 || line > lines.len() {
        return source.to_string();
    }
    lines[line - 1] = text;
    lines.join("\n")
}

/// Insert `new_lines` after `after_line`; `0` inserts at the very start.
pub fn insert_lines(source: &str, after_line: usize, new_lines: &[String]) -> String {
    let mut lines: Vec<&str> = source.split('\n').collect();
    if after_line > lines.len() {
        return source.to_string();
    }
    let tail = lines.split_off(after_line);
    lines.extend(new_lines.iter().map(String::as_str));
    lines.extend(tail);
    lines.join("\n")
}

/// Remove lines `start..=end`.
pub fn delete_lines(source: &str, start: usize, end: usize) -> String {
    let mut lines: Vec<&str> = source.split('\n').collect();
    if start == 0 || start > end || end > lines.len() {
        return source.to_string();
    }
    lines.drain(start - 1..end);
    lines.join("\n")
}

/// Replace lines `start..=end` with `new_lines` in one pass.
pub fn replace_lines(source: &str, start: usize, end: usize, new_lines: &[String]) -> String {
    let mut lines: Vec<&str> = source.split('\n').collect();
    if start == 0 || start > end || end > lines.len() {
        return source.to_string();
    }
    lines.splice(start - 1..end, new_lines.iter().map(String::as_str));
    lines.join("\n")
}

/// Find the line on which the block opened at `start_line` closes.
///
/// Scans forward counting `{` and `}` until the depth first returns to zero.
/// Braces inside string literals and comments are not counted. A block that
/// never closes is an error rather than a guess.
pub fn find_block_end_line(source: &str, start_line: usize) -> Result<usize, EditError> {
    if start_line == 0 || start_line > line_count(source) {
        return Err(EditError::LineOutOfRange(start_line));
    }
    let mut depth: i64 = 0;
    let mut opened = false;
    for (offset, text) in source.split('\n').skip(start_line - 1).enumerate() {
        depth += brace_delta(text, &mut opened);
        if opened && depth <= 0 {
            return Ok(start_line + offset);
        }
    }
    Err(EditError::UnterminatedBlock { line: start_line })
}

fn brace_delta(text: &str, opened: &mut bool) -> i64 {
    let mut delta = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '#' => break,
            '/' if chars.peek() == Some(&'/') => break,
            '{' => {
                delta += 1;
                *opened = true;
            }
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}
