//! Two-step paste sink: upload the document to a paste host, then post the
//! resulting link to a webhook. Both steps must succeed for the publish to
//! count as a success.

use std::time::Duration;

use {async_trait::async_trait, guildsync_directory::Payload, reqwest::StatusCode, tracing::debug};

use crate::{
    sink::{PublishOutcome, Sink},
    webhook::post_content,
};

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

pub struct PasteSink {
    client: reqwest::Client,
    create_url: String,
    webhook_url: String,
}

impl PasteSink {
    #[must_use]
    pub fn new(create_url: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            create_url: create_url.into(),
            webhook_url: webhook_url.into(),
        }
    }

    /// Upload the document; the response body is the raw paste URL.
    async fn create_paste(&self, content: &str) -> Result<String, PublishOutcome> {
        let resp = match self
            .client
            .post(&self.create_url)
            .form(&[("content", content)])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Err(PublishOutcome::failure(format!("paste upload failed: {e}"))),
        };

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs);
            return Err(PublishOutcome::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishOutcome::failure(format!(
                "paste host returned {status}: {body}"
            )));
        }

        let link = resp.text().await.unwrap_or_default().trim().to_string();
        if link.is_empty() {
            return Err(PublishOutcome::failure("paste host returned an empty link"));
        }
        Ok(link)
    }
}

#[async_trait]
impl Sink for PasteSink {
    fn name(&self) -> &'static str {
        "paste"
    }

    async fn publish(&self, payload: &Payload) -> PublishOutcome {
        let content = match payload {
            Payload::Message { content, .. } | Payload::Document { content } => content,
            Payload::Rows { .. } => {
                return PublishOutcome::failure("paste sink cannot deliver row payloads");
            },
        };

        let link = match self.create_paste(content).await {
            Ok(link) => link,
            Err(outcome) => return outcome,
        };
        debug!(link = %link, "paste created");

        post_content(
            &self.client,
            &self.webhook_url,
            &format!("Channel directory: {link}"),
        )
        .await
    }
}
