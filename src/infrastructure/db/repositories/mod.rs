pub mod document_repository_memory;
pub mod document_repository_sqlx;
