//! BibTeX formatting
//!
//! Writes entries back out with one field per line, four-space indentation
//! and a trailing comma after every field.

use crate::entry::BibEntry;

/// Format a single entry
pub fn format_entry(entry: &BibEntry) -> String {
    let mut out = format!("@{}{{{},\n", entry.entry_type, entry.cite_key);

    for field in &entry.fields {
        out.push_str("    ");
        out.push_str(&field.key);
        out.push_str(" = ");
        out.push_str(&format_value(&field.value));
        out.push_str(",\n");
    }

    out.push('}');
    out
}

/// Format several entries separated by a blank line
pub fn format_entries(entries: &[BibEntry]) -> String {
    let mut out = entries
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Numbers are written bare, everything else braced.
///
/// Unbalanced braces cannot be represented inside `{}`, so such values are
/// balanced by dropping the stray closing braces and closing any left open.
pub fn format_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('{');
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '{' => {
                depth += 1;
                out.push(c);
            }
            '}' if depth == 0 => {}
            '}' => {
                depth -= 1;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.extend(std::iter::repeat('}').take(depth));
    out.push('}');
    out
}
