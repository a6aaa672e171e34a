mod common;

use common::{post_html, revive_cmd, sitemap_xml, write_config};
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message(text: &str, input_tokens: u64, output_tokens: u64) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": input_tokens, "output_tokens": output_tokens}
    })
}

#[test]
fn run_without_domain_is_usage_error() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    revive_cmd(tmp.path())
        .args(["run", "--api-key", "sk-test", "https://example.com/blog/a"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--domain"));
    Ok(())
}

#[test]
fn run_without_api_key_is_usage_error() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    revive_cmd(tmp.path())
        .args(["run", "--domain", "example.com", "https://example.com/blog/a"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
    Ok(())
}

#[test]
fn run_without_urls_is_usage_error() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let urls = tmp.path().join("posts.txt");
    std::fs::write(&urls, "\n   \n")?;

    revive_cmd(tmp.path())
        .env("ANTHROPIC_API_KEY", "sk-test")
        .args(["run", "--domain", "example.com", "--urls-file"])
        .arg(&urls)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("post URLs"));
    Ok(())
}

#[test]
fn run_with_missing_urls_file_is_not_found() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    revive_cmd(tmp.path())
        .env("ANTHROPIC_API_KEY", "sk-test")
        .args(["run", "--domain", "example.com", "--urls-file"])
        .arg(tmp.path().join("absent.txt"))
        .assert()
        .code(3);
    Ok(())
}

#[tokio::test]
async fn run_revises_posts_and_writes_markdown() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&[
            format!("{base}/about"),
            format!("{base}/blog/old-post"),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blog/old-post"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_html("Old Post", 120)))
        .mount(&server)
        .await;

    let audit = json!({
        "thin_sections": ["Background"],
        "outdated_claims": [],
        "missing_internal_links": ["about page"],
        "missing_external_links": [],
        "overall_word_count": 130,
        "verdict": "thin"
    })
    .to_string();
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(body_partial_json(json!({"max_tokens": 1024})))
        .respond_with(ResponseTemplate::new(200).set_body_json(message(
            &format!("```json\n{audit}\n```"),
            1_000,
            200,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let markdown = format!(
        "# Old Post, Revisited\n\nSee [about us]({base}/about) and \
         [the guide](https://docs.example.org/guide) for more."
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({"max_tokens": 4096})))
        .respond_with(ResponseTemplate::new(200).set_body_json(message(&markdown, 2_000, 800)))
        .expect(1)
        .mount(&server)
        .await;

    let config = write_config(tmp.path(), &base);
    let out_dir = tmp.path().join("rewritten");
    let out = revive_cmd(tmp.path())
        .env("ANTHROPIC_API_KEY", "sk-test")
        .args(["run", "--domain", &base, &format!("{base}/blog/old-post"), "-f", "json"])
        .arg("--output-dir")
        .arg(&out_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v: Value = serde_json::from_slice(&out)?;
    assert_eq!(v["domain"], base.as_str());
    assert_eq!(v["site_pages"].as_array().map(Vec::len), Some(2));
    assert_eq!(v["totals"]["posts_revised"], 1);
    assert_eq!(v["totals"]["posts_failed"], 0);
    assert_eq!(v["totals"]["input_tokens"], 3_000);
    assert_eq!(v["totals"]["output_tokens"], 1_000);

    let outcome = &v["outcomes"][0];
    assert_eq!(outcome["status"], "revised");
    assert_eq!(outcome["audit"]["verdict"], "thin");
    assert_eq!(outcome["internal_links_added"], 1);
    assert_eq!(outcome["external_links_added"], 1);

    let written = std::fs::read_to_string(out_dir.join("old-post-rewritten.md"))?;
    assert_eq!(written, markdown);
    assert_eq!(v["files"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn run_where_every_post_fails_exits_with_network_code() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/blog/old-post"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_html("Old Post", 120)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = write_config(tmp.path(), &base);
    let out_dir = tmp.path().join("rewritten");
    revive_cmd(tmp.path())
        .env("ANTHROPIC_API_KEY", "sk-bad")
        .args(["run", "--domain", &base, &format!("{base}/blog/old-post")])
        .arg("--output-dir")
        .arg(&out_dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(5)
        .stdout(predicate::str::contains("Audit: API error (HTTP 401): invalid x-api-key"))
        .stdout(predicate::str::contains("0 revised, 1 failed"));

    assert!(!out_dir.exists());
    Ok(())
}
