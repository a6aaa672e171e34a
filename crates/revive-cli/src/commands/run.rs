//! `revive run`: audit and rewrite a batch of posts.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use revive_core::{AnthropicReviser, Config, Pipeline, RunReport};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{self, OutputFormat, ProgressObserver};
use crate::utils::urls::collect_urls;

#[derive(Serialize)]
struct RunOutput<'a> {
    finished_at: String,
    output_dir: &'a Path,
    files: &'a [PathBuf],
    #[serde(flatten)]
    report: &'a RunReport,
}

/// Run the pipeline over every requested post and save the rewrites.
///
/// # Errors
///
/// Missing inputs are usage errors. A run in which no post could be revised
/// is a network error, after the summary has been printed.
pub async fn execute(config: &Config, args: RunArgs, quiet: bool) -> Result<()> {
    let domain = args
        .domain
        .as_deref()
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .ok_or_else(|| {
            CliError::usage(anyhow!("missing required --domain (or REVIVE_DOMAIN)"))
        })?;
    let api_key = args
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            CliError::usage(anyhow!("missing required --api-key (or ANTHROPIC_API_KEY)"))
        })?;

    let urls = collect_urls(&args.urls, args.urls_file.as_deref())?;
    if urls.is_empty() {
        return Err(CliError::usage(anyhow!(
            "missing required post URLs: pass them as arguments or with --urls-file"
        ))
        .into());
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.paths.output_dir.clone());

    let reviser = AnthropicReviser::new(api_key, config).map_err(CliError::usage)?;
    let pipeline = Pipeline::new(config, reviser)?;

    info!(domain, posts = urls.len(), "Starting run");
    let mut observer = ProgressObserver::new(args.format == OutputFormat::Text && !quiet);
    let report = pipeline.run(domain, &urls, &mut observer).await;
    observer.finish();

    let files = write_rewrites(&report, &output_dir)?;

    match args.format {
        OutputFormat::Json => output::print_json(&RunOutput {
            finished_at: Utc::now().to_rfc3339(),
            output_dir: &output_dir,
            files: &files,
            report: &report,
        })?,
        OutputFormat::Text => output::print_run_summary(&report, &files),
    }

    if report.totals.posts_revised == 0 {
        return Err(CliError::network(anyhow!(
            "none of the {} posts could be revised",
            report.outcomes.len()
        ))
        .into());
    }
    Ok(())
}

/// Save every revised post under `dir`, returning the written paths.
fn write_rewrites(report: &RunReport, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if report.totals.posts_revised == 0 {
        return Ok(written);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    for post in report.revised() {
        let path = dir.join(safe_file_name(&post.output_file_name()));
        std::fs::write(&path, &post.markdown)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "Wrote rewritten post");
        written.push(path);
    }
    Ok(written)
}

/// Replace characters that are unsafe in file names.
fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use revive_core::{AuditReport, PostOutcome, RevisedPost, RunTotals, Usage};

    fn revised(slug: &str, markdown: &str) -> PostOutcome {
        PostOutcome::Revised(RevisedPost {
            url: format!("https://example.com/blog/{slug}"),
            title: slug.to_string(),
            slug: slug.to_string(),
            word_count_before: 100,
            word_count_after: 200,
            internal_links_added: 0,
            external_links_added: 0,
            audit: AuditReport::default(),
            markdown: markdown.to_string(),
            usage: Usage::default(),
        })
    }

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("my-post-rewritten.md"), "my-post-rewritten.md");
        assert_eq!(safe_file_name("caf%C3%A9 post.md"), "caf-C3-A9-post.md");
        assert_eq!(safe_file_name("../up.md"), "..-up.md");
    }

    #[test]
    fn test_write_rewrites_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let report = RunReport {
            domain: "https://example.com".into(),
            site_pages: Vec::new(),
            outcomes: vec![revised("first", "# First\n"), revised("second", "# Second\n")],
            totals: RunTotals {
                posts_revised: 2,
                ..RunTotals::default()
            },
        };

        let files = write_rewrites(&report, &out).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(
            std::fs::read_to_string(out.join("first-rewritten.md")).unwrap(),
            "# First\n"
        );
        assert!(out.join("second-rewritten.md").exists());
    }

    #[test]
    fn test_write_rewrites_skips_empty_runs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never");
        let report = RunReport {
            domain: "https://example.com".into(),
            site_pages: Vec::new(),
            outcomes: Vec::new(),
            totals: RunTotals::default(),
        };

        assert!(write_rewrites(&report, &out).unwrap().is_empty());
        assert!(!out.exists());
    }
}
