pub mod fact;
pub mod faq;
pub mod image;
pub mod section;
pub mod stop;
pub mod tour;

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::collection::Positioned;
use crate::error::ValidationError;

pub use fact::{FactDraft, FactPatch, TourFact};
pub use faq::{FaqDraft, FaqPatch, TourFaq};
pub use image::{NewStopImage, StopImage};
pub use section::{SectionDraft, SectionPatch, TourSection};
pub use stop::{Stop, StopDraft, StopPatch};
pub use tour::{NewTour, Tour, TourPatch};

/// An entity that lives in a tour's ordered sibling set
pub trait Orderable:
    Positioned + Clone + Debug + Serialize + Send + Sync + Unpin + 'static
{
    /// Fields supplied when creating
    type Draft: Clone + Debug + DeserializeOwned + Send + Sync;
    /// Fields supplied when editing; `None` leaves a field as is
    type Patch: Clone + Debug + Default + DeserializeOwned + Send + Sync;

    /// Singular noun used in notices ("stop", "FAQ")
    const LABEL: &'static str;
    const PLURAL: &'static str;

    fn tour_id(&self) -> Uuid;

    /// Primary text shown in list rows
    fn headline(&self) -> &str;

    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;

    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError>;

    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Build the row a store would return for an insert
    fn from_draft(id: Uuid, tour_id: Uuid, display_order: i32, draft: &Self::Draft) -> Self;
}

/// Entities the mobile app can show or hide independently of ordering
pub trait Publishable: Orderable {
    fn is_published(&self) -> bool;
    fn set_published(&mut self, value: bool);
}

/// Patch field for a nullable column: absent key is `None`, explicit `null`
/// is `Some(None)` and clears the column.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// "section" -> "Section", "FAQ" -> "FAQ"
pub(crate) fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
