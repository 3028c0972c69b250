//! Line-oriented terminal prompt for reconciliation

use std::io::{self, BufRead, Write};

use paperdb_core::reconcile::{parse_choice, LinkPlan};
use paperdb_core::{Choice, Decision, ReconcilePrompt};

/// Asks on stderr and reads answers line by line. End of input quits.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn show(&mut self, decision: &Decision<'_>) -> io::Result<()> {
        let heading = match decision.plan {
            LinkPlan::AmbiguousExact(_) => "several records point at",
            _ => "possible records for",
        };
        writeln!(self.output, "\n{heading} {}:", decision.file.path.display())?;
        for option in &decision.options {
            writeln!(self.output, "  [{}] {}", option.key, option.label)?;
        }
        write!(self.output, "> ")?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> ReconcilePrompt for TerminalPrompt<R, W> {
    fn choose(&mut self, decision: &Decision<'_>) -> Choice {
        if self.show(decision).is_err() {
            return Choice::Quit;
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => Choice::Quit,
            Ok(_) => parse_choice(&line, decision.candidate_count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use paperdb_core::reconcile::{decide, plan};
    use paperdb_core::{parse_filename, Record, RecordStore};

    fn store() -> RecordStore {
        let mut record = Record {
            year: 2020,
            journal: "Nature".into(),
            ..Default::default()
        };
        record.set_author("Smith, J");
        RecordStore::from_records(vec![record])
    }

    fn answer(input: &str) -> (Choice, String) {
        let store = store();
        let file = parse_filename(Path::new("2020-Smith-Nature.pdf")).unwrap();
        let plan = plan(&store, &file);
        let decision = decide(&store, &file, &plan).unwrap();

        let mut output = Vec::new();
        let choice = TerminalPrompt::new(input.as_bytes(), &mut output).choose(&decision);
        (choice, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_lists_options_and_reads_answer() {
        let (choice, shown) = answer("0\n");
        assert_eq!(choice, Choice::Select(0));
        assert!(shown.contains("[0] 2020 Smith | Nature"));
        assert!(shown.contains("[q] quit"));
    }

    #[test]
    fn test_end_of_input_quits() {
        assert_eq!(answer("").0, Choice::Quit);
        assert_eq!(answer("whatever\n").0, Choice::Skip);
    }
}
