pub mod images;
pub mod lists;
pub mod token;
pub mod tours;
