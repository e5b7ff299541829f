use crate::application::dto::documents::DocumentDto;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::use_cases::documents::DocumentError;

pub struct ListDocuments<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> ListDocuments<'a, R> {
    pub async fn execute(&self) -> Result<Vec<DocumentDto>, DocumentError> {
        let docs = self.repo.get_all().await?;
        Ok(docs.iter().map(DocumentDto::from).collect())
    }
}
