//! JSON-file progress store.
//!
//! All progress lives in a single `progress.json` document. The file is
//! loaded once on open; every write rewrites it atomically (temp file in the
//! same directory, then rename) while holding the store lock. The write and
//! the in-memory swap run together on the blocking pool, so a caller that
//! times out cannot leave memory and disk disagreeing.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use drillplan_core::model::{ItemId, ProgressRecord};
use drillplan_core::statistics::StatsSummary;
use drillplan_core::traits::{ProgressStore, RecordUpdate};
use drillplan_core::StoreError;

/// File name used inside the data directory.
pub const PROGRESS_FILE: &str = "progress.json";

/// On-disk layout of the progress file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressFile {
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    records: Vec<ProgressRecord>,
    #[serde(default)]
    summary: Option<StatsSummary>,
}

#[derive(Debug, Default, Clone)]
struct State {
    start_date: Option<NaiveDate>,
    records: BTreeMap<ItemId, ProgressRecord>,
    summary: Option<StatsSummary>,
}

impl State {
    fn from_file(file: ProgressFile) -> Result<Self, StoreError> {
        let mut records = BTreeMap::new();
        for record in file.records {
            let id = record.item_id;
            if records.insert(id, record).is_some() {
                return Err(StoreError::Corrupt(format!("duplicate record for item {id}")));
            }
        }
        Ok(Self {
            start_date: file.start_date,
            records,
            summary: file.summary,
        })
    }

    fn to_file(&self) -> ProgressFile {
        ProgressFile {
            start_date: self.start_date,
            records: self.records.values().cloned().collect(),
            summary: self.summary.clone(),
        }
    }
}

/// Progress store backed by a JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    state: Arc<Mutex<State>>,
}

impl JsonFileStore {
    /// Open (or lazily create) `progress.json` inside `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(PROGRESS_FILE);

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => State::default(),
            Ok(content) => State::from_file(serde_json::from_str(&content)?)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(
            "opened {} with {} record(s)",
            path.display(),
            state.records.len()
        );

        Ok(Self {
            path,
            state: Arc::new(Mutex::new(state)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the state, persist it, then swap it in.
    ///
    /// Once the lock is held, the write and the swap run to completion on
    /// the blocking pool even if the caller is dropped. On a failed write
    /// the in-memory state is left as it was.
    async fn commit<T>(&self, change: impl FnOnce(&mut State) -> T) -> Result<T, StoreError> {
        let mut state = Arc::clone(&self.state).lock_owned().await;
        let mut next = state.clone();
        let out = change(&mut next);
        let json = serde_json::to_vec_pretty(&next.to_file())?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            write_atomic(&path, &json)?;
            *state = next;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
        Ok(out)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl ProgressStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn get(&self, id: ItemId) -> Result<Option<ProgressRecord>, StoreError> {
        Ok(self.state.lock().await.records.get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<ProgressRecord>, StoreError> {
        Ok(self.state.lock().await.records.values().cloned().collect())
    }

    async fn update(
        &self,
        id: ItemId,
        update: RecordUpdate,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        self.commit(|state| {
            let current = state.records.remove(&id);
            let next = update(current);
            if let Some(record) = &next {
                state.records.insert(id, record.clone());
            }
            next
        })
        .await
    }

    async fn start_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        Ok(self.state.lock().await.start_date)
    }

    async fn set_start_date(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.commit(|state| state.start_date = Some(date)).await
    }

    async fn summary(&self) -> Result<Option<StatsSummary>, StoreError> {
        Ok(self.state.lock().await.summary.clone())
    }

    async fn save_summary(&self, summary: &StatsSummary) -> Result<(), StoreError> {
        let summary = summary.clone();
        self.commit(|state| state.summary = Some(summary)).await
    }

    async fn get_many(
        &self,
        ids: &[ItemId],
    ) -> Result<std::collections::HashMap<ItemId, ProgressRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.records.get(id).map(|r| (*id, r.clone())))
            .collect())
    }
}
