use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::FromRow;
use uuid::Uuid;

use crate::collection::Positioned;
use crate::database::models::{Orderable, Publishable};
use crate::database::repository::PgEntity;
use crate::error::{RequiredFields, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TourFact {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub fact: String,
    pub is_published: Option<bool>,
    pub display_order: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactDraft {
    pub fact: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

impl FactDraft {
    pub fn new(fact: impl Into<String>) -> Self {
        Self {
            fact: fact.into(),
            is_published: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactPatch {
    pub fact: Option<String>,
    pub is_published: Option<bool>,
}

impl Positioned for TourFact {
    fn id(&self) -> Uuid {
        self.id
    }

    fn display_order(&self) -> i32 {
        self.display_order.unwrap_or(0)
    }

    fn set_display_order(&mut self, order: i32) {
        self.display_order = Some(order);
    }
}

impl Orderable for TourFact {
    type Draft = FactDraft;
    type Patch = FactPatch;

    const LABEL: &'static str = "fact";
    const PLURAL: &'static str = "facts";

    fn tour_id(&self) -> Uuid {
        self.tour_id
    }

    fn headline(&self) -> &str {
        &self.fact
    }

    fn validate_draft(draft: &FactDraft) -> Result<(), ValidationError> {
        RequiredFields::new().require("fact", &draft.fact).finish()
    }

    fn validate_patch(patch: &FactPatch) -> Result<(), ValidationError> {
        RequiredFields::new()
            .require_if_present("fact", patch.fact.as_deref())
            .finish()
    }

    fn apply_patch(&mut self, patch: &FactPatch) {
        if let Some(fact) = &patch.fact {
            self.fact = fact.clone();
        }
        if let Some(published) = patch.is_published {
            self.is_published = Some(published);
        }
    }

    fn from_draft(id: Uuid, tour_id: Uuid, display_order: i32, draft: &FactDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            tour_id,
            fact: draft.fact.clone(),
            is_published: Some(draft.is_published),
            display_order: Some(display_order),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

impl Publishable for TourFact {
    fn is_published(&self) -> bool {
        self.is_published.unwrap_or(true)
    }

    fn set_published(&mut self, value: bool) {
        self.is_published = Some(value);
    }
}

impl PgEntity for TourFact {
    const TABLE: &'static str = "tour_facts";
    const DRAFT_COLUMNS: &'static [&'static str] = &["fact", "is_published"];

    fn push_draft(draft: &FactDraft, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values.push_bind(draft.fact.clone());
        values.push_bind(draft.is_published);
    }

    fn push_patch(patch: &FactPatch, sets: &mut Separated<'_, '_, Postgres, &'static str>) -> usize {
        let mut count = 0;
        if let Some(fact) = &patch.fact {
            sets.push("fact = ").push_bind_unseparated(fact.clone());
            count += 1;
        }
        if let Some(published) = patch.is_published {
            sets.push("is_published = ").push_bind_unseparated(published);
            count += 1;
        }
        count
    }
}
