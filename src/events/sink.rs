//! Event trail sinks.
//!
//! Records are written as one JSON object per line.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::tracker::TransitionEvent;

/// Destination for event trail records.
pub trait EventSink: Send {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Persist a single record.
    fn write<'a>(&'a mut self, event: &'a TransitionEvent) -> BoxFuture<'a, io::Result<()>>;

    /// Flush buffered records.
    fn flush(&mut self) -> BoxFuture<'_, io::Result<()>> {
        async { Ok(()) }.boxed()
    }
}

/// Appends JSON lines to a file.
///
/// The file (and its parent directory) is created on first use. After an
/// open or write failure the handle is discarded and reopened on the next
/// record.
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            tracing::debug!(path = ?self.path, "Opened event trail file");
            self.file = Some(file);
        }
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(io::Error::new(io::ErrorKind::Other, "event trail file unavailable")),
        }
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write<'a>(&'a mut self, event: &'a TransitionEvent) -> BoxFuture<'a, io::Result<()>> {
        async move {
            let mut line = serde_json::to_vec(event)?;
            line.push(b'\n');

            let result = async {
                let file = self.open().await?;
                file.write_all(&line).await
            }
            .await;

            if result.is_err() {
                self.file = None;
            }
            result
        }
        .boxed()
    }

    fn flush(&mut self) -> BoxFuture<'_, io::Result<()>> {
        async move {
            match self.file.as_mut() {
                Some(file) => file.flush().await,
                None => Ok(()),
            }
        }
        .boxed()
    }
}

/// Emits records on the `event_trail` tracing target.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn write<'a>(&'a mut self, event: &'a TransitionEvent) -> BoxFuture<'a, io::Result<()>> {
        tracing::info!(
            target: "event_trail",
            start = %event.start.to_rfc3339(),
            end = %event.end.to_rfc3339(),
            kind = %event.kind,
            host = event.host.as_deref().unwrap_or("-"),
            "{}",
            event.reason
        );
        async { Ok(()) }.boxed()
    }
}

/// In-memory sink, shared between clones.
///
/// Can be configured to fail a number of initial writes.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<TransitionEvent>>>,
    failures_left: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose first `n` writes fail.
    pub fn failing_first(n: usize) -> Self {
        Self {
            events: Arc::default(),
            failures_left: Arc::new(Mutex::new(n)),
        }
    }

    /// Records written so far, in write order.
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write<'a>(&'a mut self, event: &'a TransitionEvent) -> BoxFuture<'a, io::Result<()>> {
        let result = {
            let mut failures = self
                .failures_left
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *failures > 0 {
                *failures -= 1;
                Err(io::Error::new(io::ErrorKind::Other, "sink unavailable"))
            } else {
                self.events
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(event.clone());
                Ok(())
            }
        };
        async move { result }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::EventKind;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("status-monitor-{}-{}", name, uuid::Uuid::new_v4()))
            .join("uptime.log")
    }

    #[tokio::test]
    async fn file_sink_appends_json_lines() {
        let path = temp_path("append");
        let mut sink = FileSink::new(&path);

        sink.write(&TransitionEvent::lifecycle("first")).await.unwrap();
        sink.write(&TransitionEvent::lifecycle("second")).await.unwrap();
        sink.flush().await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<TransitionEvent> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].reason, "first");
        assert_eq!(lines[1].kind, EventKind::Lifecycle);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn file_sink_reopens_after_destination_recovers() {
        // A directory cannot be opened for appending.
        let path = temp_path("recover");
        tokio::fs::create_dir_all(&path).await.unwrap();
        let mut sink = FileSink::new(&path);

        assert!(sink.write(&TransitionEvent::lifecycle("lost")).await.is_err());
        assert!(sink.file.is_none());

        tokio::fs::remove_dir(&path).await.unwrap();
        sink.write(&TransitionEvent::lifecycle("kept")).await.unwrap();
        sink.flush().await.unwrap();
        assert!(sink.file.is_some());

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<TransitionEvent> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].reason, "kept");

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
