//! File-backed record collections.
//!
//! Every collection is one pretty-printed JSON array on disk. Reads rebuild the
//! whole list; writes replace the whole file through a temp file + rename, so a
//! reader never sees a half-written document.

use crate::error::ServiceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Create `path` holding `default` if nothing exists there yet. Idempotent.
pub async fn ensure<T: Serialize + ?Sized>(path: &Path, default: &T) -> Result<(), ServiceError> {
    if tokio::fs::try_exists(path).await? {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    write_document(path, default).await?;
    tracing::debug!("Initialized store file {}", path.display());
    Ok(())
}

/// Deserialize the whole file into an ordered list of records.
pub async fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ServiceError> {
    let data = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&data)?)
}

/// Overwrite the file with the full collection.
pub async fn save<T: Serialize>(path: &Path, records: &[T]) -> Result<(), ServiceError> {
    write_document(path, records).await
}

async fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ServiceError> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = tmp_path(path);

    if let Err(e) = tokio::fs::write(&tmp, json.as_bytes()).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
}

/// A named collection of `T` persisted at one path.
///
/// Mutations go through [`JsonCollection::modify`], which holds a per-file lock
/// for the whole load, mutate, save cycle. Two concurrent writers on the same
/// collection are therefore serialized instead of clobbering each other.
pub struct JsonCollection<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the collection, creating an empty list on disk if needed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let path = path.into();
        ensure(&path, &Vec::<T>::new()).await?;
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        })
    }

    pub async fn read(&self) -> Result<Vec<T>, ServiceError> {
        ensure(&self.path, &Vec::<T>::new()).await?;
        load(&self.path).await
    }

    /// Run `f` against the current records and persist the result.
    ///
    /// When `f` fails nothing is written and the error is returned as-is.
    pub async fn modify<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, ServiceError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read().await?;
        let out = f(&mut records)?;
        save(&self.path, &records).await?;
        Ok(out)
    }
}
