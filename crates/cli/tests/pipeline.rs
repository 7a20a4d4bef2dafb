//! End-to-end pipeline scenarios against an in-memory source and sink.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use {
    async_trait::async_trait,
    guildsync::pipeline::{self, PayloadShape},
    guildsync_directory::Payload,
    guildsync_publish::{PublishOutcome, Sink},
    guildsync_source::{
        ChannelGroup, ChannelKind, DirectorySource, Error as SourceError, Result as SourceResult,
        SubChannel,
    },
};

struct StubSource {
    groups: Vec<ChannelGroup>,
    unavailable: bool,
}

fn group(id: &str, name: &str, channels: &[(&str, ChannelKind)]) -> ChannelGroup {
    ChannelGroup {
        id: id.into(),
        name: name.into(),
        channels: channels
            .iter()
            .enumerate()
            .map(|(i, (n, kind))| SubChannel {
                id: format!("{id}-{i}"),
                name: (*n).into(),
                kind: *kind,
                group_id: id.into(),
            })
            .collect(),
    }
}

#[async_trait]
impl DirectorySource for StubSource {
    async fn list_groups(&self) -> SourceResult<Vec<ChannelGroup>> {
        if self.unavailable {
            return Err(SourceError::Unavailable { guild_id: 9 });
        }
        Ok(self.groups.clone())
    }

    async fn list_text_channels(&self, group: &ChannelGroup) -> SourceResult<Vec<SubChannel>> {
        Ok(group
            .channels
            .iter()
            .filter(|c| c.is_text())
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
struct CollectingSink {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl Sink for CollectingSink {
    fn name(&self) -> &'static str {
        "collecting"
    }

    async fn publish(&self, payload: &Payload) -> PublishOutcome {
        let content = match payload {
            Payload::Message { content, .. } | Payload::Document { content } => content.clone(),
            Payload::Rows { rows } => format!("{} rows", rows.len()),
        };
        self.sent
            .lock()
            .unwrap()
            .push((payload.label().to_string(), content));
        PublishOutcome::Success
    }
}

fn scenario_source() -> StubSource {
    StubSource {
        unavailable: false,
        groups: vec![
            group("a", "Asian", &[
                ("a1", ChannelKind::Text),
                ("a2", ChannelKind::Text),
            ]),
            group("g", "Goth", &[("g1", ChannelKind::Text)]),
            group("b", "black", &[("b1", ChannelKind::Text)]),
        ],
    }
}

#[tokio::test]
async fn publishes_allow_listed_groups_in_configured_order() {
    let source = scenario_source();
    let sink = CollectingSink::default();
    let sent = Arc::clone(&sink.sent);
    let allow = vec!["Asian".to_string(), "Black".to_string()];

    let report = pipeline::run_sync(
        &source,
        None,
        Box::new(sink),
        PayloadShape::PerSection,
        &allow,
    )
    .await
    .unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.failed, 0);

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    // Allow-list order and casing, Goth excluded.
    assert_eq!(sent[0].0, "Asian");
    assert!(sent[0].1.contains("- a1\n- a2\n"));
    assert_eq!(sent[1].0, "Black");
    assert!(sent[1].1.contains("# Black\n- b1\n"));
}

#[tokio::test]
async fn unavailable_source_aborts_with_zero_sink_calls() {
    let source = StubSource {
        groups: vec![],
        unavailable: true,
    };
    let sink = CollectingSink::default();
    let sent = Arc::clone(&sink.sent);

    let result = pipeline::run_sync(
        &source,
        None,
        Box::new(sink),
        PayloadShape::PerSection,
        &["Asian".to_string()],
    )
    .await;

    assert!(result.is_err());
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_extraction_publishes_nothing() {
    let source = StubSource {
        groups: vec![group("v", "Voice", &[("lounge", ChannelKind::Voice)])],
        unavailable: false,
    };
    let sink = CollectingSink::default();
    let sent = Arc::clone(&sink.sent);

    let report = pipeline::run_sync(
        &source,
        None,
        Box::new(sink),
        PayloadShape::PerSection,
        &["Voice".to_string()],
    )
    .await
    .unwrap();

    assert_eq!(report.sent, 0);
    assert!(sent.lock().unwrap().is_empty());
}
