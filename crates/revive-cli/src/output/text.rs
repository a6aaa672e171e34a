//! Human-readable renderings of command results

use colored::Colorize;
use revive_core::{HeadingLevel, PostContent, RunReport, SitePage};
use std::fmt::Write as _;
use std::path::PathBuf;

const TITLE_WIDTH: usize = 40;

/// Print the pages found for `domain`.
pub fn print_site_pages(domain: &str, pages: &[SitePage]) {
    if pages.is_empty() {
        println!("{} no sitemap pages found for {domain}", "warning:".yellow().bold());
        return;
    }

    println!("{} pages for {}", pages.len().to_string().bold(), domain.cyan());
    for page in pages {
        println!("  {:<50} {}", page.slug, page.title.dimmed());
    }
}

/// Print a summary of an extracted post.
pub fn print_post(post: &PostContent) {
    println!("{}", post.title.bold());
    println!("  url:            {}", post.url);
    println!("  slug:           {}", post.slug);
    println!("  words:          {}", post.word_count);
    println!("  headings:       {}", post.headings.len());
    println!("  internal links: {}", post.internal_links.len());
    println!("  external links: {}", post.external_links.len());

    if !post.headings.is_empty() {
        println!();
        for heading in &post.headings {
            let indent = if heading.level == HeadingLevel::H3 { "    " } else { "  " };
            println!("{indent}{} {}", heading.level.as_str().dimmed(), heading.text);
        }
    }
}

/// Print the summary table, failures and cost of a run.
pub fn print_run_summary(report: &RunReport, written: &[PathBuf]) {
    print!("{}", render_run_summary(report, written));
}

fn render_run_summary(report: &RunReport, written: &[PathBuf]) -> String {
    let mut out = String::new();

    if report.totals.posts_revised > 0 {
        let _ = writeln!(
            out,
            "{:<width$}  {:>6}  {:>6}  {:>6}  {:>4}  {:>4}  {}",
            "Title".bold(),
            "Before".bold(),
            "After".bold(),
            "Delta".bold(),
            "Int".bold(),
            "Ext".bold(),
            "Verdict".bold(),
            width = TITLE_WIDTH
        );
        for post in report.revised() {
            let delta = post.word_count_delta();
            let delta = if delta >= 0 {
                format!("+{delta}").green()
            } else {
                delta.to_string().red()
            };
            let _ = writeln!(
                out,
                "{:<width$}  {:>6}  {:>6}  {:>6}  {:>4}  {:>4}  {}",
                clip(&post.title, TITLE_WIDTH),
                post.word_count_before,
                post.word_count_after,
                delta,
                post.internal_links_added,
                post.external_links_added,
                post.audit.verdict,
                width = TITLE_WIDTH
            );
        }
    }

    let failures: Vec<_> = report.failed().collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\n{}", "Failed:".red().bold());
        for failure in failures {
            let _ = writeln!(out, "  {} {}", failure.url, failure.reason.dimmed());
        }
    }

    if !written.is_empty() {
        let _ = writeln!(out, "\n{}", "Written:".bold());
        for path in written {
            let _ = writeln!(out, "  {}", path.display());
        }
    }

    let totals = &report.totals;
    let _ = writeln!(
        out,
        "\n{} revised, {} failed, {} sitemap pages",
        totals.posts_revised,
        totals.posts_failed,
        report.site_pages.len()
    );
    let _ = writeln!(
        out,
        "Tokens: {} in / {} out  Total cost: {}",
        totals.input_tokens,
        totals.output_tokens,
        format!("${:.4}", totals.cost_usd).bold()
    );
    out
}

/// Shorten `text` to `width` characters, marking the cut with `...`.
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}
