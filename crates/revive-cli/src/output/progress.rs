//! Progress display for batch runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use revive_core::{AuditReport, PostContent, RevisedPost, RunObserver, SitePage};
use std::time::Duration;

/// Shows a spinner on stderr while a run is in progress.
///
/// The spinner is only drawn when enabled and stderr is a terminal, so piped
/// and scripted runs stay quiet.
pub struct ProgressObserver {
    spinner: Option<ProgressBar>,
}

impl ProgressObserver {
    /// Create an observer, drawing a spinner when `enabled` and on a TTY.
    pub fn new(enabled: bool) -> Self {
        let spinner = (enabled && std::io::stderr().is_terminal()).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Resolving sitemap...");
            pb
        });
        Self { spinner }
    }

    /// Remove the spinner from the terminal.
    pub fn finish(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }

    fn message(&self, msg: String) {
        if let Some(pb) = &self.spinner {
            pb.set_message(msg);
        }
    }

    fn println(&self, line: String) {
        if let Some(pb) = &self.spinner {
            pb.println(line);
        }
    }
}

impl RunObserver for ProgressObserver {
    fn sitemap_resolved(&mut self, pages: &[SitePage]) {
        self.println(format!("Found {} sitemap pages", pages.len()));
    }

    fn post_started(&mut self, index: usize, total: usize, url: &str) {
        self.message(format!("[{}/{total}] Fetching {url}", index + 1));
    }

    fn post_fetched(&mut self, post: &PostContent) {
        self.message(format!("Auditing \"{}\" ({} words)", post.title, post.word_count));
    }

    fn post_audited(&mut self, _url: &str, audit: &AuditReport) {
        self.message(format!("Rewriting (verdict: {})", audit.verdict));
    }

    fn post_rewritten(&mut self, post: &RevisedPost) {
        self.println(format!("{} {}", "✓".green(), post.title));
    }

    fn post_failed(&mut self, url: &str, reason: &str) {
        self.println(format!("{} {url}: {reason}", "✗".red()));
    }
}
