use async_trait::async_trait;
use sqlx::postgres::{PgRow, Postgres};
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::database::gateway::{Gateway, PublishGateway};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewStopImage, Orderable, Publishable, Stop, StopImage};

/// Table mapping for an orderable entity.
///
/// Table and column names are compile-time constants; every value goes
/// through a bind parameter.
pub trait PgEntity: Orderable + for<'r> FromRow<'r, PgRow> {
    const TABLE: &'static str;

    /// Content columns written on insert, matching `push_draft` bind order
    const DRAFT_COLUMNS: &'static [&'static str];

    /// `(table, foreign key)` pairs owned by the entity and deleted with it
    const DEPENDENTS: &'static [(&'static str, &'static str)] = &[];

    fn push_draft(draft: &Self::Draft, values: &mut Separated<'_, '_, Postgres, &'static str>);

    /// Push `column = $n` for each provided field and return how many were set
    fn push_patch(patch: &Self::Patch, sets: &mut Separated<'_, '_, Postgres, &'static str>) -> usize;
}

pub struct PgRepository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Clone for PgRepository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<T> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: PgEntity> PgRepository<T> {
    fn insert_query(tour_id: Uuid, draft: &T::Draft, display_order: i32) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!(
            "INSERT INTO {} (tour_id, display_order, {}) VALUES (",
            T::TABLE,
            T::DRAFT_COLUMNS.join(", ")
        ));
        {
            let mut values = qb.separated(", ");
            values.push_bind(tour_id);
            values.push_bind(display_order);
            T::push_draft(draft, &mut values);
        }
        qb.push(") RETURNING *");
        qb
    }

    /// `None` when the patch sets nothing
    fn update_query(id: Uuid, patch: &T::Patch) -> Option<QueryBuilder<'static, Postgres>> {
        let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
        let count = {
            let mut sets = qb.separated(", ");
            let count = T::push_patch(patch, &mut sets);
            sets.push("updated_at = now()");
            count
        };
        if count == 0 {
            return None;
        }
        qb.push(" WHERE id = ").push_bind(id);
        Some(qb)
    }
}

fn expect_row<T: Orderable>(rows_affected: u64, id: Uuid) -> Result<(), DatabaseError> {
    if rows_affected == 0 {
        Err(DatabaseError::NotFound(format!("{} {}", T::LABEL, id)))
    } else {
        Ok(())
    }
}

#[async_trait]
impl<T: PgEntity> Gateway<T> for PgRepository<T> {
    async fn insert(
        &self,
        tour_id: Uuid,
        draft: &T::Draft,
        display_order: i32,
    ) -> Result<T, DatabaseError> {
        let mut qb = Self::insert_query(tour_id, draft, display_order);
        let row = qb.build_query_as::<T>().fetch_one(&self.pool).await?;
        tracing::info!("Inserted {} {} into {}", T::LABEL, row.id(), T::TABLE);
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: &T::Patch) -> Result<(), DatabaseError> {
        let Some(mut qb) = Self::update_query(id, patch) else {
            tracing::debug!("Empty patch for {} {}, skipping update", T::LABEL, id);
            return Ok(());
        };
        let result = qb.build().execute(&self.pool).await?;
        expect_row::<T>(result.rows_affected(), id)
    }

    async fn update_display_order(&self, id: Uuid, display_order: i32) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE {} SET display_order = $1, updated_at = now() WHERE id = $2",
            T::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(display_order)
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_row::<T>(result.rows_affected(), id)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for (table, foreign_key) in T::DEPENDENTS {
            let sql = format!("DELETE FROM {} WHERE {} = $1", table, foreign_key);
            let removed = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
            tracing::debug!("Removed {} rows from {} for {} {}", removed.rows_affected(), table, T::LABEL, id);
        }

        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        expect_row::<T>(result.rows_affected(), id)?;

        tx.commit().await?;
        tracing::info!("Deleted {} {} from {}", T::LABEL, id, T::TABLE);
        Ok(())
    }

    async fn list_by_tour(&self, tour_id: Uuid) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} WHERE tour_id = $1 ORDER BY display_order ASC NULLS FIRST, created_at ASC",
            T::TABLE
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(tour_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// One transaction for the whole batch: either every row moves or none do
    async fn update_orders(&self, orders: &[(Uuid, i32)]) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE {} SET display_order = $1, updated_at = now() WHERE id = $2",
            T::TABLE
        );
        let mut tx = self.pool.begin().await?;
        for &(id, display_order) in orders {
            let result = sqlx::query(&sql)
                .bind(display_order)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            expect_row::<T>(result.rows_affected(), id)?;
        }
        tx.commit().await?;
        tracing::info!("Reordered {} {} in one transaction", orders.len(), T::PLURAL);
        Ok(())
    }
}

#[async_trait]
impl<T: PgEntity + Publishable> PublishGateway<T> for PgRepository<T> {
    async fn update_published(&self, id: Uuid, is_published: bool) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE {} SET is_published = $1, updated_at = now() WHERE id = $2",
            T::TABLE
        );
        let result = sqlx::query(&sql)
            .bind(is_published)
            .bind(id)
            .execute(&self.pool)
            .await?;
        expect_row::<T>(result.rows_affected(), id)
    }
}

impl PgRepository<Stop> {
    pub async fn images(&self, stop_id: Uuid) -> Result<Vec<StopImage>, DatabaseError> {
        let rows = sqlx::query_as::<_, StopImage>(
            "SELECT id, stop_id, image_url, alt_text, display_order
             FROM stop_images
             WHERE stop_id = $1
             ORDER BY display_order ASC NULLS FIRST",
        )
        .bind(stop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Replace a stop's gallery with `images` (delete, then re-insert)
    pub async fn replace_images(&self, stop_id: Uuid, images: &[NewStopImage]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stop_images WHERE stop_id = $1")
            .bind(stop_id)
            .execute(&mut *tx)
            .await?;

        if !images.is_empty() {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO stop_images (stop_id, image_url, alt_text, display_order) ");
            qb.push_values(images, |mut row, image| {
                row.push_bind(stop_id)
                    .push_bind(image.image_url.clone())
                    .push_bind(image.alt_text.clone())
                    .push_bind(image.display_order);
            });
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::info!("Saved {} images for stop {}", images.len(), stop_id);
        Ok(())
    }
}
