//! Codec tests against a realistic BibDesk-style export

use paperdb_bibtex::{format_entries, parse, EntryType};

const BIBDESK_EXPORT: &str = r#"%% This BibTeX bibliography file was created using BibDesk.

@string{prl = {Physical Review Letters}}

@article{Smith:2019aa,
	Author = {Smith, John and Doe, Jane},
	Date-Added = {2019-05-01 10:00:00 +0000},
	Doi = {10.1103/PhysRevLett.122.010101},
	Journal = prl,
	Keywords = {optics, lasers},
	Title = {Coherent {X}-ray sources},
	Volume = {122},
	Year = {2019},
	Bdsk-Url-1 = {https://doi.org/10.1103/PhysRevLett.122.010101}}

@inproceedings{Lee:2020,
	author = "Lee, Min",
	booktitle = {Proceedings of Things},
	year = 2020}
"#;

#[test]
fn test_bibdesk_export_fields() {
    let result = parse(BIBDESK_EXPORT);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    assert_eq!(result.entries.len(), 2);

    let smith = &result.entries[0];
    assert_eq!(smith.cite_key, "Smith:2019aa");
    assert_eq!(smith.get("journal"), Some("Physical Review Letters"));
    assert_eq!(smith.get("bdsk-url-1"), smith.get("Bdsk-Url-1"));
    assert_eq!(smith.get("title"), Some("Coherent {X}-ray sources"));

    let lee = &result.entries[1];
    assert_eq!(lee.entry_type, EntryType::InProceedings);
    assert_eq!(lee.get("year"), Some("2020"));
}

#[test]
fn test_format_then_parse_keeps_every_field() {
    let first = parse(BIBDESK_EXPORT);
    let second = parse(&format_entries(&first.entries));

    assert_eq!(first.entries, second.entries);
}
