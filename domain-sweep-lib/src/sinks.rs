//! Single-writer sinks: the available-domains log and the checkpoint file.
//!
//! Each sink owns its file exclusively and drains its own unbounded queue,
//! so output lines never interleave and the checkpoint has one writer.

use crate::concurrent::PendingCounter;
use crate::error::SweepError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Appends available domains to the output file, one per line.
#[derive(Debug)]
pub struct ResultWriter {
    path: PathBuf,
    file: File,
}

impl ResultWriter {
    /// Open (or create) the output file in append mode.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, SweepError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                SweepError::file_error(
                    path.to_string_lossy(),
                    format!("Cannot open output file for writing: {}", e),
                )
            })?;

        Ok(Self { path, file })
    }

    /// Write one line and flush it before returning.
    pub async fn append(&mut self, domain: &str) -> std::io::Result<()> {
        let mut line = String::with_capacity(domain.len() + 1);
        line.push_str(domain);
        line.push('\n');
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await
    }

    /// Drain `rx` until it closes or `cancel` fires.
    ///
    /// Queued items win over cancellation, so nothing already enqueued is
    /// dropped when the coordinator shuts the sink down.
    pub async fn run(
        mut self,
        mut rx: UnboundedReceiver<String>,
        pending: Arc<PendingCounter>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                item = rx.recv() => match item {
                    Some(domain) => {
                        if let Err(e) = self.append(&domain).await {
                            error!(
                                domain,
                                path = %self.path.display(),
                                error = %e,
                                "failed to record available domain"
                            );
                        }
                        pending.done();
                    }
                    None => break,
                },
                _ = cancel.cancelled() => break,
            }
        }
        debug!(path = %self.path.display(), "result writer stopped");
    }
}

/// Tracks the latest processed candidate and persists it by sampling.
#[derive(Debug)]
pub struct Checkpointer {
    path: PathBuf,
    tmp_path: PathBuf,
    sample_rate: f64,
    rng: StdRng,
    last: Option<String>,
    highest: Option<String>,
    written: Option<String>,
}

impl Checkpointer {
    /// Verify the checkpoint path is writable and create the sink.
    ///
    /// An existing checkpoint is left untouched until the first sample.
    pub async fn open<P: AsRef<Path>>(path: P, sample_rate: f64) -> Result<Self, SweepError> {
        let path = path.as_ref().to_path_buf();
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await
            .map_err(|e| {
                SweepError::file_error(
                    path.to_string_lossy(),
                    format!("Cannot open checkpoint file for writing: {}", e),
                )
            })?;

        let mut tmp = OsString::from(path.as_os_str());
        tmp.push(".tmp");

        Ok(Self {
            path,
            tmp_path: PathBuf::from(tmp),
            sample_rate: sample_rate.clamp(0.0, 1.0),
            rng: StdRng::from_os_rng(),
            last: None,
            highest: None,
            written: None,
        })
    }

    /// Replace the sampling RNG with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Record a processed candidate, persisting it with probability
    /// `sample_rate`. Returns whether a write happened.
    pub async fn observe(&mut self, domain: String) -> std::io::Result<bool> {
        if self.highest.as_ref().map_or(true, |h| domain > *h) {
            self.highest = Some(domain.clone());
        }
        self.last = Some(domain);

        if !self.rng.random_bool(self.sample_rate) {
            return Ok(false);
        }

        if let Some(last) = self.last.clone() {
            self.persist(&last).await?;
        }
        Ok(true)
    }

    /// Persist the greatest candidate seen so far.
    ///
    /// Called after a full drain: the generator dispatches in order and
    /// every dispatched candidate has been processed, so resuming here
    /// skips nothing.
    pub async fn finish(&mut self) -> std::io::Result<Option<String>> {
        if let Some(highest) = self.highest.clone() {
            if self.written.as_ref() != Some(&highest) {
                self.persist(&highest).await?;
            }
        }
        Ok(self.written.clone())
    }

    /// Most recently observed candidate.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    async fn persist(&mut self, value: &str) -> std::io::Result<()> {
        fs::write(&self.tmp_path, value).await?;
        fs::rename(&self.tmp_path, &self.path).await?;
        self.written = Some(value.to_string());
        Ok(())
    }

    /// Drain `rx` until it closes or `cancel` fires, then write the final
    /// checkpoint. Returns the last value written.
    pub async fn run(
        mut self,
        mut rx: UnboundedReceiver<String>,
        pending: Arc<PendingCounter>,
        cancel: CancellationToken,
    ) -> Option<String> {
        loop {
            tokio::select! {
                biased;
                item = rx.recv() => match item {
                    Some(domain) => {
                        match self.observe(domain).await {
                            Ok(true) => debug!(checkpoint = ?self.written, "checkpoint saved"),
                            Ok(false) => {}
                            Err(e) => error!(
                                path = %self.path.display(),
                                error = %e,
                                "failed to save checkpoint"
                            ),
                        }
                        pending.done();
                    }
                    None => break,
                },
                _ = cancel.cancelled() => break,
            }
        }

        match self.finish().await {
            Ok(Some(value)) => {
                info!(checkpoint = %value, path = %self.path.display(), "final checkpoint saved")
            }
            Ok(None) => {}
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to save final checkpoint")
            }
        }
        self.written
    }
}

/// Read a resume marker. A missing or blank file means "no resume".
pub async fn read_checkpoint<P: AsRef<Path>>(path: P) -> Result<Option<String>, SweepError> {
    let path = path.as_ref();
    match fs::read_to_string(path).await {
        Ok(content) => {
            let marker = content.trim();
            Ok((!marker.is_empty()).then(|| marker.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SweepError::file_error(
            path.to_string_lossy(),
            format!("Failed to read checkpoint: {}", e),
        )),
    }
}

/// Load every domain already present in an output file.
pub async fn load_recorded<P: AsRef<Path>>(path: P) -> Result<HashSet<String>, SweepError> {
    let path = path.as_ref();
    match fs::read_to_string(path).await {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashSet::new()),
        Err(e) => Err(SweepError::file_error(
            path.to_string_lossy(),
            format!("Failed to read output file: {}", e),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_result_writer_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("available.txt");
        std::fs::write(&path, "old.test\n").unwrap();

        let mut writer = ResultWriter::open(&path).await.unwrap();
        writer.append("aa.test").await.unwrap();
        writer.append("bb.test").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "old.test\naa.test\nbb.test\n");
    }

    #[tokio::test]
    async fn test_result_writer_open_fails_for_missing_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("available.txt");
        let err = ResultWriter::open(&path).await.unwrap_err();
        assert!(matches!(err, SweepError::FileError { .. }));
    }

    #[tokio::test]
    async fn test_result_writer_run_drains_queue() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("available.txt");
        let writer = ResultWriter::open(&path).await.unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingCounter::new());
        for domain in ["aa.test", "ab.test", "ba.test"] {
            pending.add();
            tx.send(domain.to_string()).unwrap();
        }
        drop(tx);

        writer.run(rx, Arc::clone(&pending), CancellationToken::new()).await;
        assert_eq!(pending.pending(), 0);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_checkpointer_open_keeps_existing_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        std::fs::write(&path, "ab.test").unwrap();

        let _checkpointer = Checkpointer::open(&path, 0.001).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab.test");
    }

    #[tokio::test]
    async fn test_checkpointer_always_samples_at_rate_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        let mut checkpointer = Checkpointer::open(&path, 1.0).await.unwrap();

        assert!(checkpointer.observe("ab.test".to_string()).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab.test");

        assert!(checkpointer.observe("aa.test".to_string()).await.unwrap());
        // Overwritten, not appended
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "aa.test");
        assert_eq!(checkpointer.last(), Some("aa.test"));
    }

    #[tokio::test]
    async fn test_checkpointer_sampling_is_sparse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        let mut checkpointer = Checkpointer::open(&path, 0.001).await.unwrap().with_seed(7);

        let mut writes = 0;
        for i in 0..10_000 {
            if checkpointer.observe(format!("{:05}.test", i)).await.unwrap() {
                writes += 1;
            }
        }
        // Expected ~10 writes; anything near every-event would be a bug.
        assert!(writes < 100, "too many checkpoint writes: {}", writes);
    }

    #[tokio::test]
    async fn test_checkpointer_finish_writes_highest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        let mut checkpointer = Checkpointer::open(&path, 0.000_001)
            .await
            .unwrap()
            .with_seed(1);

        for domain in ["ba.test", "bb.test", "ab.test"] {
            checkpointer.observe(domain.to_string()).await.unwrap();
        }
        let written = checkpointer.finish().await.unwrap();
        assert_eq!(written.as_deref(), Some("bb.test"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "bb.test");
        assert!(!dir.path().join("progress.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_checkpointer_finish_without_events_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");
        let mut checkpointer = Checkpointer::open(&path, 1.0).await.unwrap();
        assert_eq!(checkpointer.finish().await.unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_checkpoint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.txt");

        tokio_test::assert_ok!(read_checkpoint(&path).await);
        assert_eq!(read_checkpoint(&path).await.unwrap(), None);

        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(read_checkpoint(&path).await.unwrap(), None);

        std::fs::write(&path, "ab.test\n").unwrap();
        let marker = read_checkpoint(&path).await.unwrap();
        assert_eq!(marker.as_deref(), Some("ab.test"));
    }

    #[tokio::test]
    async fn test_load_recorded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("available.txt");
        assert!(load_recorded(&path).await.unwrap().is_empty());

        std::fs::write(&path, "aa.test\n\nbb.test\naa.test\n").unwrap();
        let recorded = load_recorded(&path).await.unwrap();
        assert_eq!(recorded.len(), 2);
        assert!(recorded.contains("bb.test"));
    }
}
