//! Authenticated CRUD collections.
//!
//! Both deployments share one service, [`ResourceService`], parameterized by a
//! [`CollectionRecord`] that knows how to validate a create payload and apply a
//! partial update. Orders additionally price their items against the [`Catalog`].

pub mod menu;
pub mod order;
pub mod task;

pub use menu::Catalog;
pub use order::{Order, OrderItem};
pub use task::Task;

use crate::error::ServiceError;
use crate::ids;
use crate::storage::JsonCollection;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// A record type that can live in a [`ResourceService`].
pub trait CollectionRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Create payload
    type Draft: DeserializeOwned + Send;
    /// Partial update payload
    type Patch: DeserializeOwned + Send;

    /// Field name wrapping the record in response envelopes.
    const ENVELOPE_KEY: &'static str;
    const CREATED_MESSAGE: &'static str;
    const UPDATED_MESSAGE: &'static str;
    const DELETED_MESSAGE: &'static str;
    const NOT_FOUND_MESSAGE: &'static str;
    /// Whether the deployment serving this record also exposes `GET /menu`.
    const HAS_MENU: bool = false;

    fn id(&self) -> &str;

    /// Validate `draft` and build a fresh record.
    fn from_draft(
        draft: Self::Draft,
        id: String,
        created_at: DateTime<Utc>,
        catalog: &Catalog,
    ) -> Result<Self, ServiceError>;

    /// Overwrite the fields `patch` supplies; leave the rest untouched.
    /// On error the record is left as it was.
    fn apply_patch(&mut self, patch: Self::Patch, catalog: &Catalog) -> Result<(), ServiceError>;
}

pub struct ResourceService<R: CollectionRecord> {
    records: JsonCollection<R>,
    catalog: Arc<Catalog>,
}

impl<R: CollectionRecord> ResourceService<R> {
    pub async fn open(path: impl Into<PathBuf>, catalog: Arc<Catalog>) -> Result<Self, ServiceError> {
        Ok(Self {
            records: JsonCollection::open(path).await?,
            catalog,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn list(&self) -> Result<Vec<R>, ServiceError> {
        self.records.read().await
    }

    pub async fn create(&self, draft: R::Draft) -> Result<R, ServiceError> {
        let record = R::from_draft(draft, ids::next_id(), ids::now(), &self.catalog)?;

        let stored = record.clone();
        self.records
            .modify(move |records| {
                records.push(stored);
                Ok(())
            })
            .await?;

        tracing::info!("📝 Created {} {}", R::ENVELOPE_KEY, record.id());
        Ok(record)
    }

    pub async fn update(&self, id: &str, patch: R::Patch) -> Result<R, ServiceError> {
        let catalog = self.catalog.clone();
        let record = self
            .records
            .modify(move |records| {
                let record = records
                    .iter_mut()
                    .find(|r| r.id() == id)
                    .ok_or_else(|| ServiceError::NotFound(R::NOT_FOUND_MESSAGE.to_string()))?;
                record.apply_patch(patch, &catalog)?;
                Ok(record.clone())
            })
            .await?;

        tracing::info!("✏️  Updated {} {}", R::ENVELOPE_KEY, id);
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<R, ServiceError> {
        let removed = self
            .records
            .modify(|records| {
                let index = records
                    .iter()
                    .position(|r| r.id() == id)
                    .ok_or_else(|| ServiceError::NotFound(R::NOT_FOUND_MESSAGE.to_string()))?;
                Ok(records.remove(index))
            })
            .await?;

        tracing::info!("🗑️  Deleted {} {}", R::ENVELOPE_KEY, id);
        Ok(removed)
    }
}
