use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use validator::Validate;

use crate::models::{Student, StudentId};
use crate::services::StudentService;

#[derive(Debug)]
struct Inner {
    next_id: StudentId,
    students: BTreeMap<StudentId, Student>,
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug)]
pub struct InMemoryStudents {
    inner: RwLock<Inner>,
}

impl InMemoryStudents {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                students: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryStudents {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudentService for InMemoryStudents {
    async fn list_all(&self) -> Result<Vec<Student>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.students.values().cloned().collect())
    }

    async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.students.get(&id).cloned())
    }

    async fn save(&self, student: Student) -> Result<Student, AppError> {
        student.validate()?;

        let mut inner = self.inner.write().await;
        let id = match student.id {
            Some(id) => id,
            None => inner.next_id,
        };
        inner.next_id = inner.next_id.max(id.saturating_add(1));

        let stored = student.with_id(id);
        inner.students.insert(id, stored.clone());

        tracing::debug!(student_id = id, "Stored student in memory");
        Ok(stored)
    }

    async fn delete_by_id(&self, id: StudentId) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.students.remove(&id);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
