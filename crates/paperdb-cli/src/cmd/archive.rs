//! `paperdb archive` - move processed PDFs and their bib files away

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{info, warn};

use paperdb_core::PaperDbConfig;

use super::{open_library, CmdResult};

/// Files picked up from the source directory
const ARCHIVE_PATTERNS: [&str; 2] = ["*.pdf", ".*.bib"];

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Directory holding new files (default: library.pdf_dir)
    pub src: Option<PathBuf>,

    /// Archive directory (default: library.archive_dir)
    pub dst: Option<PathBuf>,

    /// Move without asking
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run(args: ArchiveArgs, config: &PaperDbConfig) -> CmdResult {
    let src = args.src.unwrap_or_else(|| config.library.pdf_dir.clone());
    let dst = args.dst.unwrap_or_else(|| config.library.archive_dir.clone());

    let files = archive_candidates(&src)?;
    if files.is_empty() {
        eprintln!("Nothing to archive in {}.", src.display());
        return Ok(());
    }
    for file in &files {
        eprintln!("  {}", file.display());
    }

    if !args.yes && !confirm(&format!("Move {} files to {}?", files.len(), dst.display()))? {
        eprintln!("Nothing moved.");
        return Ok(());
    }

    let moved = move_files(&files, &dst)?;
    println!("Moved {} of {} files to {}", moved.len(), files.len(), dst.display());

    let library = open_library(config, true)?;
    info!(records = library.store().len(), "library rebuilt");
    Ok(())
}

/// `*.pdf` and hidden `.*.bib` files directly inside `src`, sorted
fn archive_candidates(src: &Path) -> Result<Vec<PathBuf>, glob::PatternError> {
    let mut files = Vec::new();
    for pattern in ARCHIVE_PATTERNS {
        let pattern = src.join(pattern);
        files.extend(
            glob::glob(&pattern.to_string_lossy())?
                .filter_map(|entry| entry.ok())
                .filter(|path| path.is_file()),
        );
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Move `files` into `dst`, never overwriting. Returns the new paths.
fn move_files(files: &[PathBuf], dst: &Path) -> io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dst)?;

    let mut moved = Vec::new();
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = dst.join(name);
        if target.exists() {
            warn!(path = %target.display(), "already in the archive; left in place");
            continue;
        }
        if std::fs::rename(file, &target).is_err() {
            // rename fails across filesystems
            std::fs::copy(file, &target)?;
            std::fs::remove_file(file)?;
        }
        moved.push(target);
    }
    Ok(moved)
}

fn confirm(question: &str) -> io::Result<bool> {
    eprint!("{question} (yes/no) ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_moves_pdfs_and_hidden_bibs() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        for name in ["2020-Smith-Nature.pdf", ".2020-Smith-Nature.bib", "library.bib", "notes.txt"] {
            std::fs::write(src.path().join(name), b"x").unwrap();
        }
        std::fs::write(dst.path().join("2020-Smith-Nature.pdf"), b"old").unwrap();

        let files = archive_candidates(src.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![".2020-Smith-Nature.bib", "2020-Smith-Nature.pdf"]);

        let moved = move_files(&files, dst.path()).unwrap();
        assert_eq!(moved, vec![dst.path().join(".2020-Smith-Nature.bib")]);
        assert!(src.path().join("2020-Smith-Nature.pdf").exists());
        assert!(src.path().join("library.bib").exists());
    }
}
