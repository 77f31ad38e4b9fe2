use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::database::gateway::{Gateway, PublishGateway};
use crate::database::manager::DatabaseError;
use crate::database::models::{Orderable, Publishable};

/// In-process store for one entity type.
///
/// Clones share the same rows. Deleting an entity does not touch rows owned
/// by it elsewhere (there is nowhere else).
pub struct MemoryGateway<T> {
    rows: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for MemoryGateway<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<T> Default for MemoryGateway<T> {
    fn default() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Orderable> MemoryGateway<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(items)),
        }
    }

    /// Copy of every stored row
    pub async fn snapshot(&self) -> Vec<T> {
        self.rows.lock().await.clone()
    }

    fn not_found(id: Uuid) -> DatabaseError {
        DatabaseError::NotFound(format!("{} {}", T::LABEL, id))
    }

    async fn modify(&self, id: Uuid, f: impl FnOnce(&mut T) + Send) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        f(row);
        Ok(())
    }
}

#[async_trait]
impl<T: Orderable> Gateway<T> for MemoryGateway<T> {
    async fn insert(
        &self,
        tour_id: Uuid,
        draft: &T::Draft,
        display_order: i32,
    ) -> Result<T, DatabaseError> {
        let row = T::from_draft(Uuid::new_v4(), tour_id, display_order, draft);
        self.rows.lock().await.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: &T::Patch) -> Result<(), DatabaseError> {
        self.modify(id, |row| row.apply_patch(patch)).await
    }

    async fn update_display_order(&self, id: Uuid, display_order: i32) -> Result<(), DatabaseError> {
        self.modify(id, |row| row.set_display_order(display_order)).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    async fn list_by_tour(&self, tour_id: Uuid) -> Result<Vec<T>, DatabaseError> {
        let mut rows: Vec<T> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| row.tour_id() == tour_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.display_order());
        Ok(rows)
    }
}

#[async_trait]
impl<T: Publishable> PublishGateway<T> for MemoryGateway<T> {
    async fn update_published(&self, id: Uuid, is_published: bool) -> Result<(), DatabaseError> {
        self.modify(id, |row| row.set_published(is_published)).await
    }
}
