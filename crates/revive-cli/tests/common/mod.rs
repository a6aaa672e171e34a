#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a `revive` command isolated from the caller's environment.
///
/// Configuration discovery is pointed at `home`, so only files the test
/// writes there are picked up.
#[allow(dead_code)]
pub fn revive_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("revive"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("ANTHROPIC_API_KEY");
    cmd.env_remove("REVIVE_CONFIG");
    cmd.env_remove("REVIVE_DOMAIN");
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join(".config"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Write a config file that sends model calls to `api_base` and keeps
/// timeouts short.
#[allow(dead_code)]
pub fn write_config(dir: &Path, api_base: &str) -> PathBuf {
    let path = dir.join("revive.toml");
    let config = format!(
        r#"[http]
robots_timeout_secs = 5
sitemap_timeout_secs = 5
page_timeout_secs = 5
api_fallback_timeout_secs = 5

[model]
api_base = "{api_base}"
request_timeout_secs = 10
"#
    );
    std::fs::write(&path, config).expect("failed to write test config");
    path
}

/// A blog post page whose `<article>` holds `words` words of body text.
#[allow(dead_code)]
pub fn post_html(title: &str, words: usize) -> String {
    let mut body = String::new();
    for i in 0..words {
        let _ = write!(body, "word{i} ");
    }
    format!(
        "<html><head><title>{title} | Blog</title></head><body>\
         <nav><a href=\"/\">Home</a></nav>\
         <article><h1>{title}</h1><h2>Background</h2><p>{body}</p>\
         <p>Read <a href=\"/about\">about us</a> or \
         <a href=\"https://docs.example.org/guide\">the guide</a>.</p></article>\
         </body></html>"
    )
}

/// A `urlset` sitemap listing `locs`.
#[allow(dead_code)]
pub fn sitemap_xml(locs: &[String]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
    );
    for loc in locs {
        let _ = write!(xml, "<url><loc>{loc}</loc></url>");
    }
    xml.push_str("</urlset>");
    xml
}
