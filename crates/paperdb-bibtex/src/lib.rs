//! BibTeX parsing and formatting
//!
//! The citation store of a paperdb library is a plain BibTeX file. This crate
//! is the codec between that file and flat key/value entries:
//!
//! - Nom-based parser with `@string` macro expansion and `#` concatenation
//! - Per-entry error recovery (a broken entry does not lose the rest of the file)
//! - Formatter that writes entries back in a stable, diff-friendly layout

mod entry;
mod formatter;
pub mod parser;

pub use entry::{BibEntry, BibField, EntryType};
pub use formatter::{format_entries, format_entry, format_value};
pub use parser::{parse, parse_entry, ParseError, ParseResult, ParseWarning};
