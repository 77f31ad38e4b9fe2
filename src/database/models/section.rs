use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::Postgres;
use sqlx::query_builder::Separated;
use sqlx::FromRow;
use uuid::Uuid;

use crate::collection::Positioned;
use crate::database::models::{nullable, Orderable, Publishable};
use crate::database::repository::PgEntity;
use crate::error::{RequiredFields, ValidationError};

/// A free-form content page of the tour ("History", "Visiting hours")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TourSection {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub title: String,
    pub content: String,
    pub icon: Option<String>,
    pub show_donate_button: Option<bool>,
    pub audio_url: Option<String>,
    pub is_published: Option<bool>,
    pub display_order: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub show_donate_button: bool,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

impl Default for SectionDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            icon: None,
            show_donate_button: false,
            is_published: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub icon: Option<Option<String>>,
    pub show_donate_button: Option<bool>,
    pub is_published: Option<bool>,
}

impl Positioned for TourSection {
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

impl Orderable for TourSection {
    type Draft = SectionDraft;
    type Patch = SectionPatch;

    const LABEL: &'static str = "section";
    const PLURAL: &'static str = "sections";

    fn tour_id(&self) -> Uuid {
        self.tour_id
    }

    fn headline(&self) -> &str {
        &self.title
    }

    fn validate_draft(draft: &SectionDraft) -> Result<(), ValidationError> {
        RequiredFields::new()
            .require("title", &draft.title)
            .require("content", &draft.content)
            .finish()
    }

    fn validate_patch(patch: &SectionPatch) -> Result<(), ValidationError> {
        RequiredFields::new()
            .require_if_present("title", patch.title.as_deref())
            .require_if_present("content", patch.content.as_deref())
            .finish()
    }

    fn apply_patch(&mut self, patch: &SectionPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(icon) = &patch.icon {
            self.icon = icon.clone();
        }
        if let Some(show) = patch.show_donate_button {
            self.show_donate_button = Some(show);
        }
        if let Some(published) = patch.is_published {
            self.is_published = Some(published);
        }
    }

    fn from_draft(id: Uuid, tour_id: Uuid, display_order: i32, draft: &SectionDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            tour_id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            icon: draft.icon.clone(),
            show_donate_button: Some(draft.show_donate_button),
            audio_url: None,
            is_published: Some(draft.is_published),
            display_order: Some(display_order),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

impl Publishable for TourSection {
    fn is_published(&self) -> bool {
        self.is_published.unwrap_or(true)
    }

    fn set_published(&mut self, value: bool) {
        self.is_published = Some(value);
    }
}

impl PgEntity for TourSection {
    const TABLE: &'static str = "tour_sections";
    const DRAFT_COLUMNS: &'static [&'static str] =
        &["title", "content", "icon", "show_donate_button", "is_published"];

    fn push_draft(draft: &SectionDraft, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values.push_bind(draft.title.clone());
        values.push_bind(draft.content.clone());
        values.push_bind(draft.icon.clone());
        values.push_bind(draft.show_donate_button);
        values.push_bind(draft.is_published);
    }

    fn push_patch(patch: &SectionPatch, sets: &mut Separated<'_, '_, Postgres, &'static str>) -> usize {
        let mut count = 0;
        if let Some(title) = &patch.title {
            sets.push("title = ").push_bind_unseparated(title.clone());
            count += 1;
        }
        if let Some(content) = &patch.content {
            sets.push("content = ").push_bind_unseparated(content.clone());
            count += 1;
        }
        if let Some(icon) = &patch.icon {
            sets.push("icon = ").push_bind_unseparated(icon.clone());
            count += 1;
        }
        if let Some(show) = patch.show_donate_button {
            sets.push("show_donate_button = ").push_bind_unseparated(show);
            count += 1;
        }
        if let Some(published) = patch.is_published {
            sets.push("is_published = ").push_bind_unseparated(published);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_content_are_required() {
        let err = TourSection::validate_draft(&SectionDraft::default()).unwrap_err();
        assert!(err.for_field("title").is_some());
        assert!(err.for_field("content").is_some());
    }

    #[test]
    fn draft_defaults_to_published() {
        let draft: SectionDraft =
            serde_json::from_str(r#"{"title":"History","content":"<p>…</p>"}"#).unwrap();
        assert!(draft.is_published);
        assert!(!draft.show_donate_button);
    }

    #[test]
    fn null_publish_flag_reads_as_published() {
        let mut section =
            TourSection::from_draft(Uuid::new_v4(), Uuid::new_v4(), 1, &SectionDraft::default());
        section.is_published = None;
        assert!(section.is_published());
        section.display_order = None;
        assert_eq!(Positioned::display_order(&section), 0);
    }

    #[test]
    fn icon_can_be_cleared() {
        let mut section = TourSection::from_draft(
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            &SectionDraft { icon: Some("clock".into()), ..Default::default() },
        );
        let keep: SectionPatch = serde_json::from_str(r#"{"title": "Hours"}"#).unwrap();
        section.apply_patch(&keep);
        assert_eq!(section.icon.as_deref(), Some("clock"));

        let clear: SectionPatch = serde_json::from_str(r#"{"icon": null}"#).unwrap();
        section.apply_patch(&clear);
        assert_eq!(section.icon, None);
    }
}
