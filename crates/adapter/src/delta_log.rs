//! JSON-lines delta log.
//!
//! Each forwarded delta becomes one `{"seq":N,"delta":{...}}` line. Writes happen
//! on a background task so the settle driver never waits on the file.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::types::BoardDelta;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRecord {
    pub seq: u64,
    pub delta: BoardDelta,
}

#[derive(Debug, Clone)]
pub struct DeltaLog {
    tx: mpsc::UnboundedSender<DeltaRecord>,
    seq: Arc<AtomicU64>,
}

impl DeltaLog {
    /// Start the writer task. Must be called inside a tokio runtime.
    ///
    /// The task finishes once every `DeltaLog` clone is dropped and the queue is
    /// flushed.
    pub fn spawn(path: String) -> (Self, JoinHandle<anyhow::Result<()>>) {
        let (tx, rx) = mpsc::unbounded_channel::<DeltaRecord>();
        let handle = tokio::spawn(write_records(path, rx));
        (
            Self {
                tx,
                seq: Arc::new(AtomicU64::new(1)),
            },
            handle,
        )
    }

    pub fn record(&self, delta: &BoardDelta) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let record = DeltaRecord {
            seq,
            delta: delta.clone(),
        };
        if self.tx.send(record).is_err() {
            warn!("delta log writer has stopped; dropping record {}", seq);
        }
    }
}

async fn write_records(
    path: String,
    mut rx: mpsc::UnboundedReceiver<DeltaRecord>,
) -> anyhow::Result<()> {
    use tokio::fs::OpenOptions;
    use tokio::io::AsyncWriteExt;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .with_context(|| format!("opening delta log {}", path))?;

    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    while let Some(record) = rx.recv().await {
        buf.clear();
        serde_json::to_writer(&mut buf, &record).context("encoding delta record")?;
        buf.push(b'\n');
        file.write_all(&buf)
            .await
            .with_context(|| format!("writing delta log {}", path))?;
    }
    file.flush().await?;
    Ok(())
}
