use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{AuthError, SessionContext};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewTour, Tour, TourPatch};
use crate::error::{RequiredFields, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum TourError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A tour with this URL slug already exists: {0}")]
    SlugTaken(String),
    #[error("Tour not found: {0}")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Lowercase, runs of anything but `a-z0-9` become one hyphen, no leading or
/// trailing hyphen. "Old Town – Walk!" -> "old-town-walk"
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[async_trait]
pub trait TourStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Tour>, DatabaseError>;
    async fn get(&self, id: Uuid) -> Result<Option<Tour>, DatabaseError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tour>, DatabaseError>;
    /// New tours start unpublished
    async fn insert(&self, tour: &NewTour) -> Result<Tour, DatabaseError>;
    async fn update(&self, id: Uuid, patch: &TourPatch) -> Result<Tour, DatabaseError>;
    async fn set_published(&self, id: Uuid, is_published: bool) -> Result<(), DatabaseError>;
}

pub struct PgTourStore {
    pool: PgPool,
}

impl PgTourStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TOUR_COLUMNS: &str = "id, name, slug, description, location, duration_minutes, cover_image_url, \
                            donation_url, support_text, is_published, created_at, updated_at";

impl PgTourStore {
    fn update_query(id: Uuid, patch: &TourPatch) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("UPDATE tours SET ");
        {
            let mut sets = qb.separated(", ");
            if let Some(name) = &patch.name {
                sets.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(slug) = &patch.slug {
                sets.push("slug = ").push_bind_unseparated(slug.clone());
            }
            if let Some(description) = &patch.description {
                sets.push("description = ").push_bind_unseparated(description.clone());
            }
            if let Some(location) = &patch.location {
                sets.push("location = ").push_bind_unseparated(location.clone());
            }
            if let Some(minutes) = patch.duration_minutes {
                sets.push("duration_minutes = ").push_bind_unseparated(minutes);
            }
            if let Some(url) = &patch.cover_image_url {
                sets.push("cover_image_url = ").push_bind_unseparated(url.clone());
            }
            if let Some(url) = &patch.donation_url {
                sets.push("donation_url = ").push_bind_unseparated(url.clone());
            }
            if let Some(text) = &patch.support_text {
                sets.push("support_text = ").push_bind_unseparated(text.clone());
            }
            if let Some(published) = patch.is_published {
                sets.push("is_published = ").push_bind_unseparated(published);
            }
            sets.push("updated_at = now()");
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(TOUR_COLUMNS);
        qb
    }
}

#[async_trait]
impl TourStore for PgTourStore {
    async fn list(&self) -> Result<Vec<Tour>, DatabaseError> {
        let sql = format!("SELECT {} FROM tours ORDER BY name", TOUR_COLUMNS);
        Ok(sqlx::query_as::<_, Tour>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tour>, DatabaseError> {
        let sql = format!("SELECT {} FROM tours WHERE id = $1", TOUR_COLUMNS);
        Ok(sqlx::query_as::<_, Tour>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tour>, DatabaseError> {
        let sql = format!("SELECT {} FROM tours WHERE slug = $1", TOUR_COLUMNS);
        Ok(sqlx::query_as::<_, Tour>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, tour: &NewTour) -> Result<Tour, DatabaseError> {
        let sql = format!(
            "INSERT INTO tours (name, slug, location, description, is_published)
             VALUES ($1, $2, $3, $4, false)
             RETURNING {}",
            TOUR_COLUMNS
        );
        let row = sqlx::query_as::<_, Tour>(&sql)
            .bind(&tour.name)
            .bind(&tour.slug)
            .bind(&tour.location)
            .bind(&tour.description)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: &TourPatch) -> Result<Tour, DatabaseError> {
        Self::update_query(id, patch)
            .build_query_as::<Tour>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("tour {}", id)))
    }

    async fn set_published(&self, id: Uuid, is_published: bool) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE tours SET is_published = $1, updated_at = now() WHERE id = $2")
            .bind(is_published)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("tour {}", id)));
        }
        Ok(())
    }
}

/// Tour registry operations, scoped by session role
pub struct TourService<S> {
    session: SessionContext,
    store: S,
}

impl<S: TourStore> TourService<S> {
    pub fn new(session: SessionContext, store: S) -> Self {
        Self { session, store }
    }

    /// Super admins see every tour by name; admins see only their own
    pub async fn list(&self) -> Result<Vec<Tour>, TourError> {
        if self.session.is_super_admin() {
            return Ok(self.store.list().await?);
        }
        let tour_id = self.session.resolve_tour(None)?;
        Ok(self.store.get(tour_id).await?.into_iter().collect())
    }

    /// Normalize a new tour and check it can be inserted. The slug is derived
    /// from the name when left blank and must not already be in use.
    pub async fn validate_new_tour(&self, mut tour: NewTour) -> Result<NewTour, TourError> {
        tour.name = tour.name.trim().to_string();
        tour.slug = if tour.slug.trim().is_empty() {
            slugify(&tour.name)
        } else {
            slugify(&tour.slug)
        };
        tour.location = tour.location.filter(|s| !s.trim().is_empty());
        tour.description = tour.description.filter(|s| !s.trim().is_empty());

        RequiredFields::new()
            .require("name", &tour.name)
            .require("slug", &tour.slug)
            .finish()?;

        if self.store.find_by_slug(&tour.slug).await?.is_some() {
            return Err(TourError::SlugTaken(tour.slug));
        }
        Ok(tour)
    }

    pub async fn create(&self, tour: NewTour) -> Result<Tour, TourError> {
        self.session.require_super_admin()?;
        let tour = self.validate_new_tour(tour).await?;

        let created = self.store.insert(&tour).await?;
        info!("Created tour {} ({})", created.name, created.slug);
        Ok(created)
    }

    /// The session's tour; super admins name the one they want
    pub async fn get(&self, requested: Option<Uuid>) -> Result<Tour, TourError> {
        let tour_id = self.session.resolve_tour(requested)?;
        self.store.get(tour_id).await?.ok_or(TourError::NotFound(tour_id))
    }

    /// Normalize a settings edit for `tour_id`. Blank optional text becomes
    /// `NULL`; a new slug is slugified and must be free.
    pub async fn validate_tour_patch(&self, tour_id: Uuid, mut patch: TourPatch) -> Result<TourPatch, TourError> {
        if patch.slug.is_some() {
            self.session.require_super_admin()?;
        }

        patch.name = patch.name.map(|name| name.trim().to_string());
        patch.slug = patch.slug.map(|slug| slugify(&slug));
        for field in [
            &mut patch.description,
            &mut patch.location,
            &mut patch.cover_image_url,
            &mut patch.donation_url,
            &mut patch.support_text,
        ] {
            if matches!(field, Some(Some(text)) if text.trim().is_empty()) {
                *field = Some(None);
            }
        }

        RequiredFields::new()
            .require_if_present("name", patch.name.as_deref())
            .require_if_present("slug", patch.slug.as_deref())
            .finish()?;

        if let Some(slug) = &patch.slug {
            if let Some(existing) = self.store.find_by_slug(slug).await? {
                if existing.id != tour_id {
                    return Err(TourError::SlugTaken(slug.clone()));
                }
            }
        }
        Ok(patch)
    }

    /// Save tour settings. Admins edit their own tour; super admins any tour.
    pub async fn update(&self, requested: Option<Uuid>, patch: TourPatch) -> Result<Tour, TourError> {
        let tour_id = self.session.resolve_tour(requested)?;
        let patch = self.validate_tour_patch(tour_id, patch).await?;
        if patch.is_empty() {
            return self.get(Some(tour_id)).await;
        }

        let updated = self.store.update(tour_id, &patch).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => TourError::NotFound(tour_id),
            other => other.into(),
        })?;
        info!("Updated settings of tour {}", updated.id);
        Ok(updated)
    }

    /// Flip `tour.is_published` in place, then persist it. The previous value
    /// is put back when the write fails.
    pub async fn toggle_published(&self, tour: &mut Tour) -> Result<bool, TourError> {
        self.session.resolve_tour(Some(tour.id))?;

        let previous = tour.is_published;
        let next = !previous.unwrap_or(false);
        tour.is_published = Some(next);

        match self.store.set_published(tour.id, next).await {
            Ok(()) => {
                info!("Tour {} is now {}", tour.id, if next { "published" } else { "unpublished" });
                Ok(next)
            }
            Err(e) => {
                tour.is_published = previous;
                warn!("Reverted publish toggle of tour {}: {}", tour.id, e.public_message());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryTours {
        rows: Mutex<Vec<Tour>>,
        fail_writes: AtomicBool,
    }

    impl MemoryTours {
        fn check(&self) -> Result<(), DatabaseError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(DatabaseError::QueryError("write rejected".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TourStore for MemoryTours {
        async fn list(&self) -> Result<Vec<Tour>, DatabaseError> {
            let mut rows = self.rows.lock().await.clone();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(rows)
        }

        async fn get(&self, id: Uuid) -> Result<Option<Tour>, DatabaseError> {
            Ok(self.rows.lock().await.iter().find(|t| t.id == id).cloned())
        }

        async fn find_by_slug(&self, slug: &str) -> Result<Option<Tour>, DatabaseError> {
            Ok(self.rows.lock().await.iter().find(|t| t.slug == slug).cloned())
        }

        async fn insert(&self, tour: &NewTour) -> Result<Tour, DatabaseError> {
            let row = Tour {
                id: Uuid::new_v4(),
                name: tour.name.clone(),
                slug: tour.slug.clone(),
                description: tour.description.clone(),
                location: tour.location.clone(),
                duration_minutes: None,
                cover_image_url: None,
                donation_url: None,
                support_text: None,
                is_published: Some(false),
                created_at: None,
                updated_at: None,
            };
            self.rows.lock().await.push(row.clone());
            Ok(row)
        }

        async fn update(&self, id: Uuid, patch: &TourPatch) -> Result<Tour, DatabaseError> {
            self.check()?;
            let mut rows = self.rows.lock().await;
            let row = rows
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| DatabaseError::NotFound(format!("tour {}", id)))?;
            row.apply_patch(patch);
            Ok(row.clone())
        }

        async fn set_published(&self, id: Uuid, is_published: bool) -> Result<(), DatabaseError> {
            self.check()?;
            let mut rows = self.rows.lock().await;
            let row = rows
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| DatabaseError::NotFound(format!("tour {}", id)))?;
            row.is_published = Some(is_published);
            Ok(())
        }
    }

    async fn seeded(store: &MemoryTours, name: &str) -> Tour {
        store
            .insert(&NewTour { name: name.into(), slug: slugify(name), ..Default::default() })
            .await
            .unwrap()
    }

    fn root() -> SessionContext {
        SessionContext::super_admin(Uuid::new_v4(), "root@example.com")
    }

    #[test]
    fn update_sql_sets_only_patched_columns() {
        let patch: TourPatch = serde_json::from_str(r#"{"location": null}"#).unwrap();
        let qb = PgTourStore::update_query(Uuid::new_v4(), &patch);
        assert!(qb
            .sql()
            .starts_with("UPDATE tours SET location = $1, updated_at = now() WHERE id = $2 RETURNING id, name"));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Old Town – Walk!"), "old-town-walk");
        assert_eq!(slugify("  --Harbor  2024--"), "harbor-2024");
        assert_eq!(slugify("!!!"), "");
    }

    #[tokio::test]
    async fn create_derives_slug_and_rejects_duplicates() {
        let service = TourService::new(root(), MemoryTours::default());

        let tour = service
            .create(NewTour { name: "Old Mill Trail".into(), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(tour.slug, "old-mill-trail");
        assert_eq!(tour.is_published, Some(false));

        let again = service
            .create(NewTour { name: "Another".into(), slug: "Old Mill Trail".into(), ..Default::default() })
            .await;
        assert!(matches!(again, Err(TourError::SlugTaken(slug)) if slug == "old-mill-trail"));
    }

    #[tokio::test]
    async fn blank_name_is_a_field_error() {
        let service = TourService::new(root(), MemoryTours::default());
        let err = service.create(NewTour::default()).await.unwrap_err();
        match err {
            TourError::Validation(v) => {
                assert!(v.for_field("name").is_some());
                assert!(v.for_field("slug").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admins_cannot_create_and_only_list_their_tour() {
        let store = MemoryTours::default();
        let mine = store
            .insert(&NewTour { name: "Mine".into(), slug: "mine".into(), ..Default::default() })
            .await
            .unwrap();
        store
            .insert(&NewTour { name: "Other".into(), slug: "other".into(), ..Default::default() })
            .await
            .unwrap();

        let service = TourService::new(SessionContext::admin(Uuid::new_v4(), "a@example.com", mine.id), store);

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);

        let denied = service.create(NewTour { name: "Nope".into(), ..Default::default() }).await;
        assert!(matches!(denied, Err(TourError::Auth(AuthError::SuperAdminRequired))));
    }

    #[tokio::test]
    async fn admin_edits_own_tour_settings_and_clears_fields() {
        let store = MemoryTours::default();
        let mine = seeded(&store, "Harbor Walk").await;
        let admin = SessionContext::admin(Uuid::new_v4(), "a@example.com", mine.id);
        let service = TourService::new(admin, store);

        let patch: TourPatch = serde_json::from_str(
            r#"{"name": " Harbor Walk ", "location": "Old Port", "duration_minutes": 90, "support_text": "  "}"#,
        )
        .unwrap();
        let updated = service.update(None, patch).await.unwrap();
        assert_eq!(updated.name, "Harbor Walk");
        assert_eq!(updated.location.as_deref(), Some("Old Port"));
        assert_eq!(updated.duration_minutes, Some(90));
        assert_eq!(updated.support_text, None);

        let cleared: TourPatch = serde_json::from_str(r#"{"location": null}"#).unwrap();
        let updated = service.update(Some(mine.id), cleared).await.unwrap();
        assert_eq!(updated.location, None);
        assert_eq!(updated.duration_minutes, Some(90));
    }

    #[tokio::test]
    async fn admin_cannot_edit_other_tours_or_slugs() {
        let store = MemoryTours::default();
        let mine = seeded(&store, "Mine").await;
        let other = seeded(&store, "Other").await;
        let admin = SessionContext::admin(Uuid::new_v4(), "a@example.com", mine.id);
        let service = TourService::new(admin, store);

        let rename = TourPatch { name: Some("Hijack".into()), ..Default::default() };
        let denied = service.update(Some(other.id), rename).await;
        assert!(matches!(denied, Err(TourError::Auth(AuthError::TourOutOfScope(id))) if id == other.id));

        let reslug = TourPatch { slug: Some("new-slug".into()), ..Default::default() };
        let denied = service.update(None, reslug).await;
        assert!(matches!(denied, Err(TourError::Auth(AuthError::SuperAdminRequired))));
    }

    #[tokio::test]
    async fn slug_change_must_stay_unique() {
        let store = MemoryTours::default();
        let mill = seeded(&store, "Old Mill").await;
        seeded(&store, "Harbor").await;
        let service = TourService::new(root(), store);

        let taken = TourPatch { slug: Some("Harbor".into()), ..Default::default() };
        let err = service.update(Some(mill.id), taken).await;
        assert!(matches!(err, Err(TourError::SlugTaken(slug)) if slug == "harbor"));

        // Keeping its own slug is not a conflict
        let same = TourPatch { slug: Some("old-mill".into()), ..Default::default() };
        assert_eq!(service.update(Some(mill.id), same).await.unwrap().slug, "old-mill");
    }

    #[tokio::test]
    async fn toggle_publishes_and_persists() {
        let store = MemoryTours::default();
        let tour = seeded(&store, "Harbor").await;
        let service = TourService::new(root(), store);

        let mut local = service.get(Some(tour.id)).await.unwrap();
        assert!(service.toggle_published(&mut local).await.unwrap());
        assert_eq!(local.is_published, Some(true));
        assert_eq!(service.get(Some(tour.id)).await.unwrap().is_published, Some(true));
    }

    #[tokio::test]
    async fn failed_toggle_reverts_local_flag() {
        let store = MemoryTours::default();
        let tour = seeded(&store, "Harbor").await;
        store.fail_writes.store(true, Ordering::SeqCst);
        let admin = SessionContext::admin(Uuid::new_v4(), "a@example.com", tour.id);
        let service = TourService::new(admin, store);

        let mut local = tour.clone();
        let result = service.toggle_published(&mut local).await;
        assert!(matches!(result, Err(TourError::Database(_))));
        assert_eq!(local.is_published, Some(false));
        assert_eq!(service.get(None).await.unwrap().is_published, Some(false));
    }
}
