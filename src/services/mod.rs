pub mod tour_service;

pub use tour_service::{slugify, PgTourStore, TourError, TourService, TourStore};
