//! Walks the source directory and produces an [`ExtractionResult`].

use std::collections::HashSet;

use {
    chrono::Utc,
    guildsync_source::{DirectorySource, Result},
    tracing::debug,
};

use crate::{
    matcher::{matches, normalize},
    types::{DirectorySection, ExtractionResult},
};

/// Extract the allow-listed part of the source directory.
///
/// Output order follows the allow-list's configured order, not the server's,
/// so two runs against a reshuffled guild produce identical results.
/// Duplicate allow-list entries match once; groups with zero eligible text
/// sub-channels are omitted entirely.
///
/// A source resolution failure aborts the whole extraction; there is no
/// partial output.
pub async fn extract(
    source: &dyn DirectorySource,
    allow_list: &[String],
) -> Result<ExtractionResult> {
    let groups = source.list_groups().await?;

    let mut seen = HashSet::new();
    let mut sections = Vec::new();

    for configured in allow_list {
        let key = normalize(configured);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }

        let mut channels = Vec::new();
        for group in groups.iter().filter(|g| matches(configured, &g.name)) {
            let text = source.list_text_channels(group).await?;
            channels.extend(text.into_iter().map(|c| c.name));
        }

        if channels.is_empty() {
            debug!(group = configured.as_str(), "no eligible sub-channels, skipping");
            continue;
        }

        sections.push(DirectorySection {
            name: configured.trim().to_string(),
            channels,
        });
    }

    Ok(ExtractionResult {
        generated_at: Utc::now(),
        sections,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        async_trait::async_trait,
        guildsync_source::{ChannelGroup, ChannelKind, SubChannel},
    };

    use super::*;

    struct StubSource {
        groups: Vec<ChannelGroup>,
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
        async fn list_groups(&self) -> Result<Vec<ChannelGroup>> {
            Ok(self.groups.clone())
        }

        async fn list_text_channels(&self, group: &ChannelGroup) -> Result<Vec<SubChannel>> {
            Ok(group.channels.iter().filter(|c| c.is_text()).cloned().collect())
        }
    }

    #[tokio::test]
    async fn follows_allow_list_order_and_casing() {
        // Server order deliberately different from the allow-list order.
        let source = StubSource {
            groups: vec![
                group("g", "Goth", &[("g1", ChannelKind::Text)]),
                group("b", "black", &[("b1", ChannelKind::Text)]),
                group("a", "Asian", &[
                    ("a1", ChannelKind::Text),
                    ("a2", ChannelKind::Text),
                ]),
            ],
        };
        let allow = vec!["Asian".to_string(), "Black".to_string()];

        let result = extract(&source, &allow).await.unwrap();
        let rendered: Vec<(&str, Vec<&str>)> = result
            .sections
            .iter()
            .map(|s| {
                (
                    s.name.as_str(),
                    s.channels.iter().map(String::as_str).collect(),
                )
            })
            .collect();

        assert_eq!(rendered, vec![
            ("Asian", vec!["a1", "a2"]),
            ("Black", vec!["b1"]),
        ]);
    }

    #[tokio::test]
    async fn skips_groups_without_text_channels() {
        let source = StubSource {
            groups: vec![
                group("v", "Voice Only", &[("lounge", ChannelKind::Voice)]),
                group("e", "Empty", &[]),
            ],
        };
        let allow = vec!["Voice Only".to_string(), "Empty".to_string()];

        let result = extract(&source, &allow).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn duplicate_and_blank_entries_are_ignored() {
        let source = StubSource {
            groups: vec![group("a", "Asian", &[("a1", ChannelKind::Text)])],
        };
        let allow = vec![
            "Asian".to_string(),
            " asian ".to_string(),
            String::new(),
        ];

        let result = extract(&source, &allow).await.unwrap();
        assert_eq!(result.sections.len(), 1);
    }

    #[tokio::test]
    async fn whitespace_drift_still_matches() {
        let source = StubSource {
            groups: vec![group("a", " Asian .1", &[("a1", ChannelKind::Text)])],
        };
        let allow = vec!["Asian .1".to_string()];

        let result = extract(&source, &allow).await.unwrap();
        assert_eq!(result.sections[0].name, "Asian .1");
    }
}
