use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::FromRow;
use uuid::Uuid;

use crate::collection::Positioned;
use crate::database::models::{nullable, Orderable};
use crate::database::repository::PgEntity;
use crate::error::{RequiredFields, ValidationError};

/// A point of interest on the tour route. Owns its images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Stop {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub audio_url: Option<String>,
    pub display_order: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopDraft {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StopPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Option<f64>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Option<f64>>,
}

impl Positioned for Stop {
    fn id(&self) -> Uuid {
        self.id
    }

    fn display_order(&self) -> i32 {
        self.display_order
    }

    fn set_display_order(&mut self, order: i32) {
        self.display_order = order;
    }
}

impl Orderable for Stop {
    type Draft = StopDraft;
    type Patch = StopPatch;

    const LABEL: &'static str = "stop";
    const PLURAL: &'static str = "stops";

    fn tour_id(&self) -> Uuid {
        self.tour_id
    }

    fn headline(&self) -> &str {
        &self.title
    }

    fn validate_draft(draft: &StopDraft) -> Result<(), ValidationError> {
        RequiredFields::new().require("title", &draft.title).finish()
    }

    fn validate_patch(patch: &StopPatch) -> Result<(), ValidationError> {
        RequiredFields::new()
            .require_if_present("title", patch.title.as_deref())
            .finish()
    }

    fn apply_patch(&mut self, patch: &StopPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(latitude) = patch.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = patch.longitude {
            self.longitude = longitude;
        }
    }

    fn from_draft(id: Uuid, tour_id: Uuid, display_order: i32, draft: &StopDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            tour_id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            latitude: draft.latitude,
            longitude: draft.longitude,
            audio_url: None,
            display_order,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

impl PgEntity for Stop {
    const TABLE: &'static str = "stops";
    const DRAFT_COLUMNS: &'static [&'static str] = &["title", "content", "latitude", "longitude"];
    const DEPENDENTS: &'static [(&'static str, &'static str)] =
        &[("stop_images", "stop_id"), ("stop_audio", "stop_id")];

    fn push_draft(draft: &StopDraft, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values.push_bind(draft.title.clone());
        values.push_bind(draft.content.clone());
        values.push_bind(draft.latitude);
        values.push_bind(draft.longitude);
    }

    fn push_patch(patch: &StopPatch, sets: &mut Separated<'_, '_, Postgres, &'static str>) -> usize {
        let mut count = 0;
        if let Some(title) = &patch.title {
            sets.push("title = ").push_bind_unseparated(title.clone());
            count += 1;
        }
        if let Some(content) = &patch.content {
            sets.push("content = ").push_bind_unseparated(content.clone());
            count += 1;
        }
        if let Some(latitude) = patch.latitude {
            sets.push("latitude = ").push_bind_unseparated(latitude);
            count += 1;
        }
        if let Some(longitude) = patch.longitude {
            sets.push("longitude = ").push_bind_unseparated(longitude);
            count += 1;
        }
        count
    }
}
