use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Orderable, Publishable};

/// Remote store for one entity type.
///
/// Every call is a single awaited request, at most once: no retries and no
/// idempotency key. Callers decide what a failure means for local state.
#[async_trait]
pub trait Gateway<T: Orderable>: Send + Sync {
    /// Insert and return the stored row with its assigned id
    async fn insert(
        &self,
        tour_id: Uuid,
        draft: &T::Draft,
        display_order: i32,
    ) -> Result<T, DatabaseError>;

    async fn update(&self, id: Uuid, patch: &T::Patch) -> Result<(), DatabaseError>;

    async fn update_display_order(&self, id: Uuid, display_order: i32) -> Result<(), DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError>;

    /// Sibling set of a tour, ordered by `display_order`
    async fn list_by_tour(&self, tour_id: Uuid) -> Result<Vec<T>, DatabaseError>;

    /// Persist a reorder confirmation batch.
    ///
    /// The default issues one `update_display_order` per pair, in order, and
    /// stops at the first failure; earlier rows stay written. Stores that
    /// can write the whole batch atomically should override this.
    async fn update_orders(&self, orders: &[(Uuid, i32)]) -> Result<(), DatabaseError> {
        for &(id, display_order) in orders {
            tracing::debug!("Confirming {} {} at position {}", T::LABEL, id, display_order);
            self.update_display_order(id, display_order).await?;
        }
        Ok(())
    }
}

/// Stores that can flip the visibility flag of publishable entities
#[async_trait]
pub trait PublishGateway<T: Publishable>: Gateway<T> {
    async fn update_published(&self, id: Uuid, is_published: bool) -> Result<(), DatabaseError>;
}
