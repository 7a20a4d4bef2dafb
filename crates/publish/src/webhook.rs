//! Webhook sink: POST `{"content": ...}`, one message per payload.

use std::time::Duration;

use {
    async_trait::async_trait,
    guildsync_directory::Payload,
    reqwest::StatusCode,
    tracing::debug,
};

use crate::sink::{PublishOutcome, Sink};

/// Fallback wait when a 429 arrives without a usable `Retry-After` header.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

/// POST `content` to `url` and interpret the response:
/// 200/204 success, 429 + `Retry-After` rate limited, anything else failure.
pub(crate) async fn post_content(
    client: &reqwest::Client,
    url: &str,
    content: &str,
) -> PublishOutcome {
    let resp = match client
        .post(url)
        .json(&serde_json::json!({ "content": content }))
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => return PublishOutcome::failure(format!("webhook request failed: {e}")),
    };

    let status = resp.status();
    if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
        return PublishOutcome::Success;
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs);
        debug!(retry_after_secs = retry_after.as_secs(), "webhook rate limited");
        return PublishOutcome::RateLimited { retry_after };
    }

    let body = resp.text().await.unwrap_or_default();
    PublishOutcome::failure(format!("webhook returned {status}: {body}"))
}

#[async_trait]
impl Sink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn publish(&self, payload: &Payload) -> PublishOutcome {
        let content = match payload {
            Payload::Message { content, .. } | Payload::Document { content } => content,
            Payload::Rows { .. } => {
                return PublishOutcome::failure("webhook sink cannot deliver row payloads");
            },
        };
        post_content(&self.client, &self.url, content).await
    }
}

/// Extract the webhook identity from a webhook URL
/// (`.../webhooks/{id}/{token}`), used by the webhook-only purge policy.
#[must_use]
pub fn webhook_id_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.collect();
    let idx = segments.iter().position(|s| *s == "webhooks")?;
    let id = segments.get(idx + 1)?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((*id).to_string())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str) -> Payload {
        Payload::Message {
            label: "Asian".into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn no_content_is_success() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/hook")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "content": "hello"
            })))
            .with_status(204)
            .create_async()
            .await;

        let sink = WebhookSink::new(format!("{}/hook", server.url()));
        let outcome = sink.publish(&message("hello")).await;
        assert_eq!(outcome, PublishOutcome::Success);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn retry_after_header_is_honored() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/hook")
            .with_status(429)
            .with_header("retry-after", "3")
            .create_async()
            .await;

        let sink = WebhookSink::new(format!("{}/hook", server.url()));
        let outcome = sink.publish(&message("hi")).await;
        assert_eq!(outcome, PublishOutcome::RateLimited {
            retry_after: Duration::from_secs(3)
        });
    }

    #[tokio::test]
    async fn server_error_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let sink = WebhookSink::new(format!("{}/hook", server.url()));
        let outcome = sink.publish(&message("hi")).await;
        assert!(matches!(outcome, PublishOutcome::Failure { reason } if reason.contains("500")));
    }

    #[tokio::test]
    async fn rows_payload_is_rejected() {
        let sink = WebhookSink::new("https://example.com/hook");
        let outcome = sink.publish(&Payload::Rows { rows: vec![] }).await;
        assert!(matches!(outcome, PublishOutcome::Failure { .. }));
    }

    #[test]
    fn extracts_webhook_id() {
        assert_eq!(
            webhook_id_from_url("https://discord.com/api/webhooks/12345/se-cret_token"),
            Some("12345".to_string())
        );
        assert_eq!(webhook_id_from_url("https://example.com/other"), None);
        assert_eq!(webhook_id_from_url("not a url"), None);
    }
}
