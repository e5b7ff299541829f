pub mod documents;
pub mod mapping;
