//! Renders an [`ExtractionResult`] into sink payloads.
//!
//! Deterministic: the same result (including its timestamp) always renders
//! byte-identical output.

use serde::{Deserialize, Serialize};

use crate::types::ExtractionResult;

/// Human-readable "last updated" timestamp, UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One (group, channel) pair for tabular sinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryRow {
    pub group: String,
    pub channel: String,
    pub updated_at: String,
}

/// A formatted payload, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// One message per group, for webhook sinks.
    Message { label: String, content: String },
    /// The whole directory as a single document.
    Document { content: String },
    /// Normalized row set for tabular sinks.
    Rows { rows: Vec<DirectoryRow> },
}

impl Payload {
    /// Short description for logs.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Message { label, .. } => label,
            Self::Document { .. } => "document",
            Self::Rows { .. } => "rows",
        }
    }
}

/// Strip backticks from live names so a name containing a code fence can
/// never close the surrounding block.
fn sanitize(name: &str) -> String {
    name.replace('`', "'")
}

fn timestamp(result: &ExtractionResult) -> String {
    result.generated_at.format(TIMESTAMP_FORMAT).to_string()
}

fn render_section(name: &str, channels: &[String], ts: &str) -> String {
    let mut out = String::new();
    out.push_str("```md\n# ");
    out.push_str(&sanitize(name));
    out.push('\n');
    for channel in channels {
        out.push_str("- ");
        out.push_str(&sanitize(channel));
        out.push('\n');
    }
    out.push_str("\n_Last updated: ");
    out.push_str(ts);
    out.push_str("_\n```");
    out
}

/// One fenced document per group — the per-category webhook message shape.
#[must_use]
pub fn section_documents(result: &ExtractionResult) -> Vec<Payload> {
    let ts = timestamp(result);
    result
        .sections
        .iter()
        .map(|s| Payload::Message {
            label: s.name.clone(),
            content: render_section(&s.name, &s.channels, &ts),
        })
        .collect()
}

/// The whole directory as one fenced document.
#[must_use]
pub fn document(result: &ExtractionResult) -> Payload {
    let ts = timestamp(result);
    let mut out = String::from("```md\n");
    for section in &result.sections {
        out.push_str("# ");
        out.push_str(&sanitize(&section.name));
        out.push('\n');
        for channel in &section.channels {
            out.push_str("- ");
            out.push_str(&sanitize(channel));
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str("_Last updated: ");
    out.push_str(&ts);
    out.push_str("_\n```");
    Payload::Document { content: out }
}

/// Normalized (group, channel) rows for tabular sinks.
#[must_use]
pub fn rows(result: &ExtractionResult) -> Payload {
    let ts = timestamp(result);
    Payload::Rows {
        rows: result
            .sections
            .iter()
            .flat_map(|s| {
                s.channels.iter().map(|c| DirectoryRow {
                    group: s.name.clone(),
                    channel: c.clone(),
                    updated_at: ts.clone(),
                })
            })
            .collect(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use {
        super::*,
        crate::types::{DirectorySection, ExtractionResult},
    };

    fn fixture() -> ExtractionResult {
        ExtractionResult {
            generated_at: chrono::Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
            sections: vec![
                DirectorySection {
                    name: "Asian".into(),
                    channels: vec!["a1".into(), "a2".into()],
                },
                DirectorySection {
                    name: "Black".into(),
                    channels: vec!["b1".into()],
                },
            ],
        }
    }

    #[test]
    fn section_documents_match_message_shape() {
        let payloads = section_documents(&fixture());
        assert_eq!(payloads.len(), 2);
        let Payload::Message { label, content } = &payloads[0] else {
            panic!("expected message payload");
        };
        assert_eq!(label, "Asian");
        assert_eq!(
            content,
            "```md\n# Asian\n- a1\n- a2\n\n_Last updated: 2025-06-01 09:30:00_\n```"
        );
    }

    #[test]
    fn output_is_deterministic() {
        let result = fixture();
        assert_eq!(document(&result), document(&result));
        assert_eq!(section_documents(&result), section_documents(&result));
        assert_eq!(rows(&result), rows(&result));
    }

    #[test]
    fn backticks_cannot_break_the_fence() {
        let mut result = fixture();
        result.sections[0].channels[0] = "```evil".into();
        let Payload::Message { content, .. } = &section_documents(&result)[0] else {
            panic!("expected message payload");
        };
        // Opening fence plus closing fence only.
        assert_eq!(content.matches("```").count(), 2);
    }

    #[test]
    fn rows_flatten_in_order() {
        let Payload::Rows { rows } = rows(&fixture()) else {
            panic!("expected rows payload");
        };
        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.group.as_str(), r.channel.as_str()))
            .collect();
        assert_eq!(pairs, vec![
            ("Asian", "a1"),
            ("Asian", "a2"),
            ("Black", "b1"),
        ]);
        assert!(rows.iter().all(|r| r.updated_at == "2025-06-01 09:30:00"));
    }
}
