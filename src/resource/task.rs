use super::{Catalog, CollectionRecord};
use crate::error::ServiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "creadaEn")]
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Default)]
pub struct TaskDraft {
    #[serde(default, rename = "titulo", alias = "title")]
    pub title: Option<String>,
    #[serde(default, rename = "descripcion", alias = "description")]
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct TaskPatch {
    #[serde(default, rename = "titulo", alias = "title")]
    pub title: Option<String>,
    #[serde(default, rename = "descripcion", alias = "description")]
    pub description: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl CollectionRecord for Task {
    type Draft = TaskDraft;
    type Patch = TaskPatch;

    const ENVELOPE_KEY: &'static str = "tarea";
    const CREATED_MESSAGE: &'static str = "Tarea creada";
    const UPDATED_MESSAGE: &'static str = "Tarea actualizada";
    const DELETED_MESSAGE: &'static str = "Tarea eliminada";
    const NOT_FOUND_MESSAGE: &'static str = "Tarea no encontrada";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(
        draft: TaskDraft,
        id: String,
        created_at: DateTime<Utc>,
        _catalog: &Catalog,
    ) -> Result<Self, ServiceError> {
        match (non_empty(draft.title), non_empty(draft.description)) {
            (Some(title), Some(description)) => Ok(Task {
                id,
                title,
                description,
                created_at,
            }),
            _ => Err(ServiceError::Validation(
                "titulo y descripcion son obligatorios".to_string(),
            )),
        }
    }

    fn apply_patch(&mut self, patch: TaskPatch, _catalog: &Catalog) -> Result<(), ServiceError> {
        if let Some(title) = non_empty(patch.title) {
            self.title = title;
        }
        if let Some(description) = non_empty(patch.description) {
            self.description = description;
        }
        Ok(())
    }
}
