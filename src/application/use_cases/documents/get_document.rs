use crate::application::dto::documents::DocumentDto;
use crate::application::ports::document_repository::DocumentRepository;
use crate::application::use_cases::documents::DocumentError;

pub struct GetDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> GetDocument<'a, R> {
    pub async fn execute(&self, id: i64) -> Result<Option<DocumentDto>, DocumentError> {
        Ok(self.repo.get_by_id(id).await?.map(DocumentDto::from))
    }
}
