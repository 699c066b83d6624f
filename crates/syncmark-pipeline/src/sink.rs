//! Diagnostics and persistence sinks.
//!
//! Both are best-effort collaborators: the pipeline logs their failures and
//! carries on.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{DiagnosticsError, PersistenceError};

/// Receives payload snapshots at pipeline checkpoints.
#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    async fn record(&self, name: &str, content: &[u8], mime: &str) -> Result<(), DiagnosticsError>;
}

/// Opaque key-value store.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Store `content` under `store/key`.
    ///
    /// With `overwrite = false` an existing entry is an error.
    async fn put(
        &self,
        store: &str,
        key: &str,
        content: &[u8],
        overwrite: bool,
    ) -> Result<(), PersistenceError>;
}

/// Writes snapshots to the log at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

#[async_trait]
impl DiagnosticsSink for TracingDiagnostics {
    async fn record(&self, name: &str, content: &[u8], mime: &str) -> Result<(), DiagnosticsError> {
        debug!(
            name,
            mime,
            size = content.len(),
            content = %String::from_utf8_lossy(content),
            "Diagnostic snapshot"
        );
        Ok(())
    }
}

/// One recorded snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub name: String,
    pub content: Vec<u8>,
    pub mime: String,
}

impl DiagnosticEntry {
    /// Content as text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

/// Keeps snapshots in memory.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<DiagnosticEntry>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots in recording order.
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.name).collect()
    }
}

#[async_trait]
impl DiagnosticsSink for MemoryDiagnostics {
    async fn record(&self, name: &str, content: &[u8], mime: &str) -> Result<(), DiagnosticsError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DiagnosticEntry {
                name: name.to_string(),
                content: content.to_vec(),
                mime: mime.to_string(),
            });
        Ok(())
    }
}

fn file_name_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "application/json" => "json",
        "application/xml" | "text/xml" => "xml",
        _ => "txt",
    }
}

/// Writes each snapshot to its own numbered file in a directory.
#[derive(Debug)]
pub struct DirectoryDiagnostics {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl DirectoryDiagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl DiagnosticsSink for DirectoryDiagnostics {
    async fn record(&self, name: &str, content: &[u8], mime: &str) -> Result<(), DiagnosticsError> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!(
            "{seq:05}-{}.{}",
            file_name_safe(name),
            extension_for(mime)
        ));
        let io_err = |source| DiagnosticsError {
            name: name.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        tokio::fs::write(&path, content).await.map_err(io_err)
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, store: &str, key: &str) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(store.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PersistenceSink for MemoryStore {
    async fn put(
        &self,
        store: &str,
        key: &str,
        content: &[u8],
        overwrite: bool,
    ) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry_key = (store.to_string(), key.to_string());
        if !overwrite && entries.contains_key(&entry_key) {
            return Err(PersistenceError::AlreadyExists {
                store: store.to_string(),
                key: key.to_string(),
            });
        }
        entries.insert(entry_key, content.to_vec());
        Ok(())
    }
}

/// Stores entries as files under `{root}/{store}/{key}`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, store: &str, key: &str) -> PathBuf {
        self.root.join(file_name_safe(store)).join(file_name_safe(key))
    }
}

#[async_trait]
impl PersistenceSink for DirectoryStore {
    async fn put(
        &self,
        store: &str,
        key: &str,
        content: &[u8],
        overwrite: bool,
    ) -> Result<(), PersistenceError> {
        let path = self.path_for(store, key);
        let io_err = |source: std::io::Error| {
            if source.kind() == ErrorKind::AlreadyExists {
                PersistenceError::AlreadyExists {
                    store: store.to_string(),
                    key: key.to_string(),
                }
            } else {
                PersistenceError::Io {
                    store: store.to_string(),
                    key: key.to_string(),
                    source,
                }
            }
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(overwrite)
            .truncate(overwrite)
            .create_new(!overwrite)
            .open(&path)
            .await
            .map_err(io_err)?;
        file.write_all(content).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)
    }
}
