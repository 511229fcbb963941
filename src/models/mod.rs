pub mod generation;
pub mod recipe;
pub mod source_item;
pub mod summary;
