use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{Student, StudentId};

/// Persistence operations the HTTP layer delegates to.
#[async_trait]
pub trait StudentService: Send + Sync {
    /// All records in ascending id order.
    async fn list_all(&self) -> Result<Vec<Student>, AppError>;

    async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>, AppError>;

    /// Insert or replace a record and return it as stored.
    ///
    /// A record without an id gets the next free one. Fails with
    /// [`AppError::ValidationError`] when the record is illegal, in which
    /// case nothing is stored.
    async fn save(&self, student: Student) -> Result<Student, AppError>;

    /// Remove a record. Removing an absent id is not an error.
    async fn delete_by_id(&self, id: StudentId) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
