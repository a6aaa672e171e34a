//! [`Reviser`] backed by the Anthropic Messages API.

use crate::audit::{AuditReport, Reviser, Usage, audit_prompt, rewrite_prompt};
use crate::config::{Config, ModelConfig, Pricing};
use crate::text::truncate_chars;
use crate::types::{PostContent, SitePage};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Value sent in the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const ERROR_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// One completed model call.
struct Completion {
    text: String,
    usage: Usage,
}

/// Audits and rewrites posts with a Claude model.
pub struct AnthropicReviser {
    client: Client,
    api_key: String,
    endpoint: String,
    model: ModelConfig,
    pricing: Pricing,
}

impl AnthropicReviser {
    /// Creates a reviser for `api_key` using the `[model]` and `[pricing]` settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty key and [`Error::Network`] when the
    /// HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, config: &Config) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config("Anthropic API key is empty".into()));
        }

        let client = Client::builder()
            .timeout(config.model.request_timeout())
            .user_agent(config.http.bot_user_agent.as_str())
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/v1/messages", config.model.api_base.trim_end_matches('/')),
            model: config.model.clone(),
            pricing: config.pricing,
        })
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Completion> {
        let request = MessagesRequest {
            model: &self.model.model,
            max_tokens,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body).map_or_else(
                |_| truncate_chars(body.trim(), ERROR_EXCERPT_CHARS).to_string(),
                |parsed| parsed.error.message,
            );
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Unexpected Messages API response: {e}")))?;

        let text = body
            .content
            .into_iter()
            .find(|block| block.kind.is_empty() || block.kind == "text")
            .map(|block| block.text)
            .ok_or_else(|| Error::Parse("Messages API response contained no text".into()))?;

        let usage = Usage::new(body.usage.input_tokens, body.usage.output_tokens, &self.pricing);
        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Model call completed"
        );

        Ok(Completion { text, usage })
    }
}

#[async_trait]
impl Reviser for AnthropicReviser {
    #[instrument(skip_all, fields(url = %post.url))]
    async fn audit(
        &self,
        post: &PostContent,
        pages: &[SitePage],
        domain: &str,
    ) -> Result<(AuditReport, Usage)> {
        let prompt = audit_prompt(post, pages, domain, &self.model);
        let completion = self.complete(&prompt, self.model.audit_max_tokens).await?;
        let report = AuditReport::from_model_output(&completion.text, post.word_count);
        Ok((report, completion.usage))
    }

    #[instrument(skip_all, fields(url = %post.url))]
    async fn rewrite(
        &self,
        post: &PostContent,
        audit: &AuditReport,
        pages: &[SitePage],
        domain: &str,
    ) -> Result<(String, Usage)> {
        let prompt = rewrite_prompt(post, audit, pages, domain, &self.model)?;
        let completion = self.complete(&prompt, self.model.rewrite_max_tokens).await?;
        Ok((completion.text.trim().to_string(), completion.usage))
    }
}
