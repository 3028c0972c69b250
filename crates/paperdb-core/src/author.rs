//! Author-list helpers
//!
//! Author fields arrive either BibTeX style (`Smith, John and Doe, Jane`) or
//! as plain names (`John Smith and Jane Doe`), occasionally `;`-separated.

/// Which part of the first author's name to return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameMode {
    #[default]
    Surname,
    Given,
    /// `"given, surname"`
    Full,
}

/// Extract (part of) the first author's name from an author field.
///
/// The first author is the text before the first `" and "` (or `;`). A
/// comma splits `surname, given`; without one the last whitespace-separated
/// token is the surname.
pub fn extract_first_author(author_field: &str, mode: NameMode) -> String {
    let first = author_field
        .split(" and ")
        .next()
        .and_then(|s| s.split(';').next())
        .unwrap_or("")
        .trim();

    let (given, surname) = split_name(first);

    match mode {
        NameMode::Surname => surname,
        NameMode::Given => given,
        NameMode::Full if given.is_empty() => surname,
        NameMode::Full => format!("{given}, {surname}"),
    }
}

/// Split one author name into `(given, surname)`
pub fn split_name(name: &str) -> (String, String) {
    let name = name.trim();

    if let Some((surname, rest)) = name.split_once(',') {
        let given = rest.replace(',', " ");
        return (clean(&given), clean(surname));
    }

    let mut tokens: Vec<&str> = name.split_whitespace().collect();
    match tokens.pop() {
        Some(surname) => (clean(&tokens.join(" ")), clean(surname)),
        None => (String::new(), String::new()),
    }
}

/// Split an author field into individual names
pub fn split_authors(author_field: &str) -> Vec<String> {
    author_field
        .split(" and ")
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn clean(part: &str) -> String {
    part.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c| c == '{' || c == '}')
        .to_string()
}
