//! Fetch, classify, merge and emit.
//!
//! Sources are fetched up to `jobs` at a time but merged one by one in
//! configured order on the calling task, so the aggregator needs no lock
//! and the output does not depend on network timing.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use rsm_compiler::{emit, parse_rule_list, Header};
use rsm_core::{Aggregator, MergeReport, RuleSet};

use crate::config::{Config, RuleSource};
use crate::fetch::{FetchError, Fetcher};

/// Error type for a merge run. Fetch failures are not errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to create '{path}': {source}")]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("Failed to write '{path}': {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

/// Merged rules plus the sources that could not be fetched.
#[derive(Debug)]
pub struct MergeOutcome {
    pub rules: RuleSet,
    pub failed: Vec<FetchError>,
}

impl MergeOutcome {
    pub fn report(&self) -> MergeReport {
        self.rules.report()
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub output: PathBuf,
    pub sources: usize,
    pub failed: Vec<String>,
    pub report: MergeReport,
    pub total: usize,
}

/// Fetch every source and merge the recognized rules.
pub async fn collect_rules<F: Fetcher>(
    fetcher: &F,
    sources: &[RuleSource],
    jobs: usize,
) -> MergeOutcome {
    let mut aggregator = Aggregator::new();
    let mut failed = Vec::new();

    let mut fetches = stream::iter(sources)
        .map(|source| async move { (source, fetcher.fetch(source).await) })
        .buffered(jobs.max(1));

    while let Some((source, result)) = fetches.next().await {
        match result {
            Ok(text) => {
                let lines = text.lines().count();
                let rules = parse_rule_list(&text);
                let recognized = rules.len();
                let added = aggregator.merge(rules);
                log::info!(
                    "{}: {} lines, {} rules, {} new, {} total",
                    source.name,
                    lines,
                    recognized,
                    added,
                    aggregator.report().total()
                );
            }
            Err(e) => {
                log::warn!("{e}; skipping source");
                failed.push(e);
            }
        }
    }

    MergeOutcome {
        rules: aggregator.into_rule_set(),
        failed,
    }
}

/// Run the whole merge and overwrite the configured output file.
pub async fn run<F: Fetcher>(
    fetcher: &F,
    config: &Config,
    generated_at: NaiveDateTime,
) -> Result<RunSummary, PipelineError> {
    let outcome = collect_rules(fetcher, &config.sources, config.jobs).await;
    let report = outcome.report();

    log::info!(
        "merge complete: DOMAIN={}, DOMAIN-SUFFIX={}, DOMAIN-KEYWORD={}, total={}",
        report.domains,
        report.domain_suffixes,
        report.domain_keywords,
        report.total()
    );
    if !outcome.failed.is_empty() {
        log::warn!(
            "{} of {} sources failed",
            outcome.failed.len(),
            config.sources.len()
        );
    }

    let header = Header::new(config.header_lines.clone(), generated_at);
    let text = emit(&outcome.rules, &report, &header);
    write_output(&config.output, &text)?;
    log::info!("wrote {} rules to '{}'", report.total(), config.output.display());

    Ok(RunSummary {
        output: config.output.clone(),
        sources: config.sources.len(),
        failed: outcome.failed.into_iter().map(|e| e.source_name).collect(),
        report,
        total: report.total(),
    })
}

/// Overwrite `path`, creating missing parent directories.
pub fn write_output(path: &Path, text: &str) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PipelineError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}
