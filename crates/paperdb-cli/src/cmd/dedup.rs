//! `paperdb dedup` - merge duplicate records across the whole library

use clap::Args;
use tracing::info;

use paperdb_core::{MatchThresholds, PaperDbConfig};

use super::{open_library, CmdResult};

#[derive(Args, Debug)]
pub struct DedupArgs {
    /// Score above which records are compared as candidates (default from
    /// config, 0.5). Merging still requires the merge threshold.
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Report what would be merged without saving
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: DedupArgs, config: &PaperDbConfig) -> CmdResult {
    let mut library = open_library(config, false)?;
    let before = library.store().len();

    let thresholds = thresholds_for(config, args.threshold);
    let report = library.store_mut().deduplicate(thresholds);
    println!(
        "{} -> {} records ({} merged, {} pairs below threshold)",
        before,
        library.store().len(),
        report.merged,
        report.rejected
    );

    if args.dry_run {
        info!("dry run; cache left unchanged");
    } else if library.persist()? {
        info!(path = %library.cache_path().display(), "cache updated");
    }
    Ok(())
}

/// Configured thresholds with the candidate threshold optionally overridden
fn thresholds_for(config: &PaperDbConfig, candidate: Option<f64>) -> MatchThresholds {
    let mut thresholds = MatchThresholds::from(&config.matching);
    if let Some(candidate) = candidate {
        thresholds.candidate = candidate;
    }
    thresholds
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("threshold must be between 0 and 1, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("0.7"), Ok(0.7));
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("high").is_err());
    }

    #[test]
    fn test_threshold_flag_only_moves_candidate_gate() {
        let config = PaperDbConfig::default();
        let thresholds = thresholds_for(&config, Some(0.3));
        assert_eq!(thresholds.candidate, 0.3);
        assert_eq!(thresholds.merge, 0.8);

        assert_eq!(thresholds_for(&config, None), MatchThresholds::default());
    }
}
