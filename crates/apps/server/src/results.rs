//! File-backed log of saved computations.
//!
//! The log is a single JSON array. Every append reads the whole array,
//! pushes one record and writes the whole array back. Appends go through one
//! mutex so concurrent saves within this process never drop a record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use stats::Operation;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// One saved computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub operation: String,
    pub value: Value,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Debug)]
pub enum StoreError {
    Io(String),
    Encode(String),
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "result log i/o error: {msg}"),
            StoreError::Encode(msg) => write!(f, "result log encode error: {msg}"),
            StoreError::Corrupt(msg) => write!(f, "result log corrupt: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

enum Loaded {
    Records(Vec<Value>),
    Missing,
    Corrupt(String),
}

pub struct ResultStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_unlocked(&self) -> Result<Loaded, std::io::Error> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Loaded::Missing),
            Err(e) => return Err(e),
        };
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => return Ok(Loaded::Corrupt(e.to_string())),
        };
        if text.trim().is_empty() {
            return Ok(Loaded::Missing);
        }
        match serde_json::from_str::<Vec<Value>>(&text) {
            Ok(records) => Ok(Loaded::Records(records)),
            Err(e) => Ok(Loaded::Corrupt(e.to_string())),
        }
    }

    /// Reads the log for an append. Never fails: anything unreadable is
    /// reported and treated as an empty log.
    async fn load_for_append(&self) -> Vec<Value> {
        match self.load_unlocked().await {
            Ok(Loaded::Records(records)) => records,
            Ok(Loaded::Missing) => Vec::new(),
            Ok(Loaded::Corrupt(reason)) => {
                let aside = self.corrupt_path();
                match tokio::fs::rename(&self.path, &aside).await {
                    Ok(()) => warn!(
                        "result log {:?} is unreadable ({reason}); moved to {:?}, starting a new log",
                        self.path, aside
                    ),
                    Err(err) => warn!(
                        "result log {:?} is unreadable ({reason}) and could not be moved aside: {err}",
                        self.path
                    ),
                }
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "failed to read result log {:?}: {err}; continuing with an empty log",
                    self.path
                );
                Vec::new()
            }
        }
    }

    fn corrupt_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "results.json".to_string());
        let stamp = Utc::now().timestamp_millis();
        self.path.with_file_name(format!("{name}.corrupt-{stamp}"))
    }

    async fn save_unlocked(&self, records: &[Value]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("create {parent:?}: {e}")))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let text =
            serde_json::to_string_pretty(records).map_err(|e| StoreError::Encode(e.to_string()))?;
        tokio::fs::write(&tmp, text)
            .await
            .map_err(|e| StoreError::Io(format!("write {tmp:?}: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("rename {tmp:?}: {e}")))?;
        Ok(())
    }

    /// Appends a record stamped with the current time and rewrites the log.
    pub async fn append(&self, operation: Operation, value: Value) -> Result<ResultRecord, StoreError> {
        let record = ResultRecord {
            operation: operation.to_string(),
            value,
            timestamp: Utc::now(),
        };
        let encoded = serde_json::to_value(&record).map_err(|e| StoreError::Encode(e.to_string()))?;

        let _g = self.lock.lock().await;
        let mut records = self.load_for_append().await;
        records.push(encoded);
        self.save_unlocked(&records).await?;

        debug!("saved {operation} result ({} records)", records.len());
        Ok(record)
    }

    /// Reads every record in the log. Unlike appends, unreadable content is an error.
    pub async fn records(&self) -> Result<Vec<ResultRecord>, StoreError> {
        let _g = self.lock.lock().await;
        match self.load_unlocked().await {
            Ok(Loaded::Records(values)) => values
                .into_iter()
                .map(|v| serde_json::from_value(v).map_err(|e| StoreError::Corrupt(e.to_string())))
                .collect(),
            Ok(Loaded::Missing) => Ok(Vec::new()),
            Ok(Loaded::Corrupt(reason)) => Err(StoreError::Corrupt(reason)),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}
