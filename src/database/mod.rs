pub mod gateway;
pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;

pub use gateway::{Gateway, PublishGateway};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryGateway;
pub use repository::{PgEntity, PgRepository};
