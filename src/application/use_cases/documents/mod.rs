use crate::application::dto::documents::DtoError;
use crate::application::ports::document_repository::RepositoryError;

pub mod create_document;
pub mod delete_document;
pub mod get_document;
pub mod list_documents;
pub mod update_document;

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error(transparent)]
    Input(#[from] DtoError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
