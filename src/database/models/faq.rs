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
pub struct TourFaq {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub question: String,
    pub answer: String,
    pub is_published: Option<bool>,
    pub display_order: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqDraft {
    pub question: String,
    pub answer: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub is_published: Option<bool>,
}

impl Positioned for TourFaq {
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

impl Orderable for TourFaq {
    type Draft = FaqDraft;
    type Patch = FaqPatch;

    const LABEL: &'static str = "FAQ";
    const PLURAL: &'static str = "FAQs";

    fn tour_id(&self) -> Uuid {
        self.tour_id
    }

    fn headline(&self) -> &str {
        &self.question
    }

    fn validate_draft(draft: &FaqDraft) -> Result<(), ValidationError> {
        RequiredFields::new()
            .require("question", &draft.question)
            .require("answer", &draft.answer)
            .finish()
    }

    fn validate_patch(patch: &FaqPatch) -> Result<(), ValidationError> {
        RequiredFields::new()
            .require_if_present("question", patch.question.as_deref())
            .require_if_present("answer", patch.answer.as_deref())
            .finish()
    }

    fn apply_patch(&mut self, patch: &FaqPatch) {
        if let Some(question) = &patch.question {
            self.question = question.clone();
        }
        if let Some(answer) = &patch.answer {
            self.answer = answer.clone();
        }
        if let Some(published) = patch.is_published {
            self.is_published = Some(published);
        }
    }

    fn from_draft(id: Uuid, tour_id: Uuid, display_order: i32, draft: &FaqDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            tour_id,
            question: draft.question.clone(),
            answer: draft.answer.clone(),
            is_published: Some(draft.is_published),
            display_order: Some(display_order),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

impl Publishable for TourFaq {
    fn is_published(&self) -> bool {
        self.is_published.unwrap_or(true)
    }

    fn set_published(&mut self, value: bool) {
        self.is_published = Some(value);
    }
}

impl PgEntity for TourFaq {
    const TABLE: &'static str = "tour_faqs";
    const DRAFT_COLUMNS: &'static [&'static str] = &["question", "answer", "is_published"];

    fn push_draft(draft: &FaqDraft, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values.push_bind(draft.question.clone());
        values.push_bind(draft.answer.clone());
        values.push_bind(draft.is_published);
    }

    fn push_patch(patch: &FaqPatch, sets: &mut Separated<'_, '_, Postgres, &'static str>) -> usize {
        let mut count = 0;
        if let Some(question) = &patch.question {
            sets.push("question = ").push_bind_unseparated(question.clone());
            count += 1;
        }
        if let Some(answer) = &patch.answer {
            sets.push("answer = ").push_bind_unseparated(answer.clone());
            count += 1;
        }
        if let Some(published) = patch.is_published {
            sets.push("is_published = ").push_bind_unseparated(published);
            count += 1;
        }
        count
    }
}
