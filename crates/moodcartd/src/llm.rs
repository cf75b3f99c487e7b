//! Completion-service client.
//!
//! One narrow trait over the text-completion service so the orchestrator,
//! the context adapter and the reply composer can all be driven by a fake
//! in tests. The production client speaks to an Ollama-compatible endpoint.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use moodcart_common::config::LlmConfig;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Minimal completion interface: prompt in, text out.
///
/// Implementations apply their own bounded timeout and make exactly one
/// attempt; callers treat any `Err` as "no answer" and fall back.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Production client for an Ollama-shaped `/api/generate` endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        debug!("Completion request to {} ({} chars)", url, prompt.len());

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await
            .context("completion request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("completion endpoint returned {}", response.status()));
        }

        let body: Value = response
            .json()
            .await
            .context("completion response was not JSON")?;

        let text = body
            .get("response")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("completion response missing 'response' field"))?;

        Ok(text.trim().to_string())
    }
}

/// Strip surrounding Markdown code fences from a completion response.
///
/// Models routinely wrap JSON in ```json ... ``` despite being asked not
/// to. Leading fence language tags are dropped along with the fence.
pub fn strip_code_fences(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```") {
        // Skip an optional language tag on the fence line
        t = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest.trim_start_matches(|c: char| c.is_alphanumeric()),
        };
    }
    if let Some(rest) = t.strip_suffix("```") {
        t = rest;
    }
    t.trim()
}

/// Slice out the first JSON array in a response, fences already stripped.
///
/// Tolerates prose before and after the array; returns `None` when no
/// bracketed span exists at all.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Scripted completion client for tests.
///
/// Replies are consumed in order; an exhausted queue (or a reply scripted
/// as `None`) behaves like an upstream failure. Prompts are recorded so
/// tests can assert on what was asked.
pub struct FakeCompletionClient {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeCompletionClient {
    /// A fake that fails every call.
    pub fn failing() -> Self {
        Self::with_replies(Vec::<String>::new())
    }

    pub fn with_replies<S: Into<String>>(replies: Vec<S>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Some(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue one reply; `None` scripts a failure at that position.
    pub fn push_reply(&self, reply: Option<&str>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(reply.map(str::to_string));
    }

    /// How many completions were requested.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        match self.replies.lock().unwrap().pop_front() {
            Some(Some(reply)) => Ok(reply),
            _ => Err(anyhow!("fake completion: no reply scripted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_with_language_tag() {
        let text = "```json\n[{\"a\": 1}]\n```";
        assert_eq!(strip_code_fences(text), "[{\"a\": 1}]");
    }

    #[test]
    fn test_strip_fences_without_language_tag() {
        let text = "```\n[1, 2]\n```";
        assert_eq!(strip_code_fences(text), "[1, 2]");
    }

    #[test]
    fn test_strip_fences_leaves_plain_text() {
        assert_eq!(strip_code_fences("  hello  "), "hello");
    }

    #[test]
    fn test_extract_array_inside_prose() {
        let text = "Here you go:\n[1, 2, 3]\nHope that helps!";
        assert_eq!(extract_json_array(text), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_extract_array_absent() {
        assert_eq!(extract_json_array("no brackets here"), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[tokio::test]
    async fn test_fake_consumes_replies_in_order() {
        let fake = FakeCompletionClient::with_replies(vec!["first", "second"]);
        assert_eq!(fake.complete("a").await.unwrap(), "first");
        assert_eq!(fake.complete("b").await.unwrap(), "second");
        assert!(fake.complete("c").await.is_err());
        assert_eq!(fake.calls(), 3);
        assert_eq!(fake.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fake_scripted_failure_mid_queue() {
        let fake = FakeCompletionClient::with_replies(vec!["ok"]);
        fake.push_reply(None);
        fake.push_reply(Some("after"));

        assert!(fake.complete("1").await.is_ok());
        assert!(fake.complete("2").await.is_err());
        assert_eq!(fake.complete("3").await.unwrap(), "after");
    }
}
