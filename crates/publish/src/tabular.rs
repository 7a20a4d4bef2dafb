//! Tabular sink: clear the store, then append one row per (group, channel).

use std::sync::Arc;

use {
    anyhow::{Context, Result},
    async_trait::async_trait,
    guildsync_directory::Payload,
    tokio::sync::Mutex,
    tracing::debug,
};

use crate::sink::{PublishOutcome, Sink};

/// Header row written before the data rows.
pub const HEADER: &[&str] = &["group", "channel", "updated_at"];

/// The row-store API a tabular destination exposes.
#[async_trait]
pub trait TabularStore: Send + Sync {
    async fn clear(&self) -> Result<()>;
    async fn append_row(&self, cols: &[String]) -> Result<()>;
    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>>;
}

/// In-memory store, used in tests and dry runs.
#[derive(Default)]
pub struct MemoryTabularStore {
    rows: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl TabularStore for MemoryTabularStore {
    async fn clear(&self) -> Result<()> {
        self.rows.lock().await.clear();
        Ok(())
    }

    async fn append_row(&self, cols: &[String]) -> Result<()> {
        self.rows.lock().await.push(cols.to_vec());
        Ok(())
    }

    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.rows.lock().await.clone())
    }
}

/// REST-backed store: `POST {endpoint}/clear`, `POST {endpoint}/rows`,
/// `GET {endpoint}/rows`.
pub struct RestTabularStore {
    client: reqwest::Client,
    endpoint: String,
}

impl RestTabularStore {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TabularStore for RestTabularStore {
    async fn clear(&self) -> Result<()> {
        self.client
            .post(format!("{}/clear", self.endpoint))
            .send()
            .await
            .context("clear request failed")?
            .error_for_status()
            .context("clear rejected")?;
        Ok(())
    }

    async fn append_row(&self, cols: &[String]) -> Result<()> {
        self.client
            .post(format!("{}/rows", self.endpoint))
            .json(cols)
            .send()
            .await
            .context("append request failed")?
            .error_for_status()
            .context("append rejected")?;
        Ok(())
    }

    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>> {
        let rows = self
            .client
            .get(format!("{}/rows", self.endpoint))
            .send()
            .await
            .context("read request failed")?
            .error_for_status()
            .context("read rejected")?
            .json()
            .await
            .context("rows were not valid json")?;
        Ok(rows)
    }
}

/// Publishes row payloads into a [`TabularStore`].
pub struct SheetSink {
    store: Arc<dyn TabularStore>,
}

impl SheetSink {
    #[must_use]
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self { store }
    }

    async fn write_rows(&self, payload: &Payload) -> Result<usize> {
        let Payload::Rows { rows } = payload else {
            anyhow::bail!("sheet sink requires row payloads");
        };

        self.store.clear().await?;
        let header: Vec<String> = HEADER.iter().map(|c| (*c).to_string()).collect();
        self.store.append_row(&header).await?;
        for row in rows {
            self.store
                .append_row(&[
                    row.group.clone(),
                    row.channel.clone(),
                    row.updated_at.clone(),
                ])
                .await?;
        }
        Ok(rows.len())
    }
}

#[async_trait]
impl Sink for SheetSink {
    fn name(&self) -> &'static str {
        "sheet"
    }

    async fn publish(&self, payload: &Payload) -> PublishOutcome {
        match self.write_rows(payload).await {
            Ok(count) => {
                debug!(rows = count, "sheet updated");
                PublishOutcome::Success
            },
            Err(e) => PublishOutcome::failure(format!("sheet write failed: {e:#}")),
        }
    }
}
