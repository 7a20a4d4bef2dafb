//! One sync run: purge (best effort) → extract → format → publish.

use {
    anyhow::Context,
    guildsync_config::{GuildsyncConfig, PurgePolicy, SinkConfig},
    guildsync_directory::{Payload, document, extract, rows, section_documents},
    guildsync_publish::{
        PasteSink, Publisher, RestTabularStore, RunReport, SheetSink, Sink, WebhookSink,
        webhook_id_from_url,
    },
    guildsync_source::{DirectorySource, MessagePurger, PurgeSpec},
    tracing::{info, warn},
};

/// How the extraction result is rendered for the configured sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// One message per group (webhook).
    PerSection,
    /// The whole directory as one document (paste).
    Document,
    /// Normalized (group, channel) rows (tabular store).
    Rows,
}

/// Build the configured sink and the payload shape it consumes.
pub fn build_sink(cfg: &SinkConfig) -> (Box<dyn Sink>, PayloadShape) {
    match cfg {
        SinkConfig::Webhook { url } => (
            Box::new(WebhookSink::new(url.clone())),
            PayloadShape::PerSection,
        ),
        SinkConfig::Paste {
            create_url,
            webhook_url,
        } => (
            Box::new(PasteSink::new(create_url.clone(), webhook_url.clone())),
            PayloadShape::Document,
        ),
        SinkConfig::Sheet { endpoint } => (
            Box::new(SheetSink::new(std::sync::Arc::new(RestTabularStore::new(
                endpoint.clone(),
            )))),
            PayloadShape::Rows,
        ),
    }
}

/// The purge to run before publishing, if the destination ends in a webhook
/// and the policy is not `off`. Tabular sinks own their store, so there is
/// nothing to purge for them.
pub fn purge_spec(cfg: &GuildsyncConfig) -> Option<PurgeSpec> {
    if cfg.purge.policy == PurgePolicy::Off {
        return None;
    }
    let webhook_url = match cfg.sink.as_ref()? {
        SinkConfig::Webhook { url } => url,
        SinkConfig::Paste { webhook_url, .. } => webhook_url,
        SinkConfig::Sheet { .. } => return None,
    };
    Some(PurgeSpec {
        policy: cfg.purge.policy,
        history_limit: cfg.purge.history_limit,
        webhook_id: webhook_id_from_url(webhook_url),
    })
}

/// Render the extraction result for the sink.
pub fn render(result: &guildsync_directory::ExtractionResult, shape: PayloadShape) -> Vec<Payload> {
    match shape {
        PayloadShape::PerSection => section_documents(result),
        PayloadShape::Document => vec![document(result)],
        PayloadShape::Rows => vec![rows(result)],
    }
}

/// Execute one full sync run.
///
/// A source failure aborts before any sink call is made; publish failures
/// are item-granular and reported in the returned [`RunReport`]. The purge
/// is best effort: its errors are logged and swallowed.
pub async fn run_sync(
    source: &dyn DirectorySource,
    purge: Option<(&dyn MessagePurger, &PurgeSpec)>,
    sink: Box<dyn Sink>,
    shape: PayloadShape,
    allow_list: &[String],
) -> anyhow::Result<RunReport> {
    if let Some((purger, spec)) = purge {
        match purger.purge(spec).await {
            Ok(report) => info!(
                deleted = report.deleted,
                failed = report.failed,
                "pre-publish purge done"
            ),
            Err(e) => warn!(error = %e, "purge skipped"),
        }
    }

    let result = extract(source, allow_list)
        .await
        .context("directory extraction failed")?;
    if result.is_empty() {
        info!("no allow-listed groups with text channels, nothing to publish");
        return Ok(RunReport::default());
    }
    info!(
        groups = result.sections.len(),
        generated_at = %result.generated_at.format("%Y-%m-%d %H:%M:%S"),
        "directory extracted"
    );

    let payloads = render(&result, shape);
    let mut publisher = Publisher::new(sink);
    let report = publisher.publish_all(&payloads).await;
    info!(
        sent = report.sent,
        failed = report.failed,
        retried = report.retried,
        "publish pass finished"
    );
    Ok(report)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_shapes_match_destinations() {
        let (_, shape) = build_sink(&SinkConfig::Webhook {
            url: "https://example.com/hook".into(),
        });
        assert_eq!(shape, PayloadShape::PerSection);

        let (_, shape) = build_sink(&SinkConfig::Sheet {
            endpoint: "https://sheet.example".into(),
        });
        assert_eq!(shape, PayloadShape::Rows);
    }

    #[test]
    fn purge_spec_carries_webhook_identity() {
        let cfg = GuildsyncConfig {
            sink: Some(SinkConfig::Webhook {
                url: "https://discord.com/api/webhooks/777/tok".into(),
            }),
            ..Default::default()
        };
        let spec = purge_spec(&cfg).unwrap();
        assert_eq!(spec.webhook_id.as_deref(), Some("777"));
        assert_eq!(spec.policy, PurgePolicy::AllBots);
    }

    #[test]
    fn sheet_sink_never_purges() {
        let cfg = GuildsyncConfig {
            sink: Some(SinkConfig::Sheet {
                endpoint: "https://sheet.example".into(),
            }),
            ..Default::default()
        };
        assert!(purge_spec(&cfg).is_none());
    }

    #[test]
    fn off_policy_never_purges() {
        let mut cfg = GuildsyncConfig {
            sink: Some(SinkConfig::Webhook {
                url: "https://discord.com/api/webhooks/777/tok".into(),
            }),
            ..Default::default()
        };
        cfg.purge.policy = PurgePolicy::Off;
        assert!(purge_spec(&cfg).is_none());
    }
}
