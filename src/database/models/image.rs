use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::collection::{CollectionError, OrderedCollection, Positioned};

/// A photo belonging to exactly one stop; deleted with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StopImage {
    pub id: Uuid,
    pub stop_id: Uuid,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub display_order: Option<i32>,
}

/// Row written when a stop's gallery is saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStopImage {
    pub image_url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
}

impl Positioned for StopImage {
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

/// Gallery rows in visual order, numbered from 0 as the mobile app expects.
///
/// Saving a gallery replaces every row, so images keep their url and alt
/// text but not their ids.
pub fn gallery_rows(images: &OrderedCollection<StopImage>) -> Vec<NewStopImage> {
    images
        .sorted()
        .into_iter()
        .enumerate()
        .map(|(index, image)| NewStopImage {
            image_url: image.image_url.clone(),
            alt_text: image.alt_text.clone(),
            display_order: index as i32,
        })
        .collect()
}

/// Rows to save after moving the image at `from` to `to`, or `None` when the
/// gallery keeps its order and nothing needs rewriting
pub fn moved_gallery_rows(
    gallery: &OrderedCollection<StopImage>,
    from: usize,
    to: usize,
) -> Result<Option<Vec<NewStopImage>>, CollectionError> {
    let moved = gallery.with_reordered(from, to)?;
    if from == to {
        return Ok(None);
    }
    Ok(Some(gallery_rows(&moved)))
}
