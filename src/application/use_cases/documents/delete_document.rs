use crate::application::ports::document_repository::DocumentRepository;
use crate::application::use_cases::documents::DocumentError;

pub struct DeleteDocument<'a, R: DocumentRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: DocumentRepository + ?Sized> DeleteDocument<'a, R> {
    pub async fn execute(&self, id: i64) -> Result<(), DocumentError> {
        self.repo.delete(id).await?;
        Ok(())
    }
}
