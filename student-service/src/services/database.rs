use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReplaceOptions, ReturnDocument, UpdateOptions},
    Client as MongoClient, Collection, Database,
};
use serde_json::Value;
use service_core::error::AppError;
use validator::Validate;

use crate::models::{Student, StudentId};
use crate::services::StudentService;

/// Name of the counter document holding the last assigned student id.
const STUDENT_SEQUENCE: &str = "students";

/// MongoDB-backed store.
///
/// Students live in the `students` collection as
/// `{ _id: <i64>, attributes: { ... } }`. Ids come from a counter document
/// in `counters` that is incremented atomically, so concurrent creates never
/// share an id.
#[derive(Clone)]
pub struct StudentDb {
    client: MongoClient,
    db: Database,
}

impl StudentDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub fn students(&self) -> Collection<Document> {
        self.db.collection("students")
    }

    fn counters(&self) -> Collection<Document> {
        self.db.collection("counters")
    }

    async fn next_id(&self) -> Result<StudentId, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters()
            .find_one_and_update(
                doc! { "_id": STUDENT_SEQUENCE },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to allocate student id: {}", e);
                AppError::from(e)
            })?
            .ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!("Student id counter was not returned"))
            })?;

        counter
            .get_i64("seq")
            .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))
    }

    /// Keep the counter at or above an id that was chosen by the caller.
    async fn reserve_id(&self, id: StudentId) -> Result<(), AppError> {
        let options = UpdateOptions::builder().upsert(true).build();

        self.counters()
            .update_one(
                doc! { "_id": STUDENT_SEQUENCE },
                doc! { "$max": { "seq": id } },
                options,
            )
            .await
            .map_err(|e| {
                tracing::error!(student_id = id, "Failed to reserve student id: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}

/// BSON has no unsigned 64-bit integer, so numbers above `i64::MAX` are
/// rejected as bad input.
fn to_document(student: &Student, id: StudentId) -> Result<Document, AppError> {
    let attributes = mongodb::bson::to_document(&student.attributes).map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!(
            "Failed to encode student {} as BSON: {}",
            id,
            e
        ))
    })?;

    Ok(doc! { "_id": id, "attributes": attributes })
}

fn from_document(mut document: Document) -> Result<Student, AppError> {
    let id = match document.get("_id") {
        Some(Bson::Int64(id)) => *id,
        Some(Bson::Int32(id)) => StudentId::from(*id),
        other => {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Student document has a non-integer _id: {:?}",
                other
            )))
        }
    };

    let attributes = match document
        .remove("attributes")
        .map(Bson::into_relaxed_extjson)
    {
        Some(Value::Object(attributes)) => attributes,
        other => {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Student {} has malformed attributes: {:?}",
                id,
                other
            )))
        }
    };

    Ok(Student::new(attributes).with_id(id))
}

#[async_trait]
impl StudentService for StudentDb {
    async fn list_all(&self) -> Result<Vec<Student>, AppError> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();

        let cursor = self.students().find(None, options).await.map_err(|e| {
            tracing::error!("Failed to list students: {}", e);
            AppError::from(e)
        })?;

        let documents: Vec<Document> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect students: {}", e);
            AppError::from(e)
        })?;

        documents.into_iter().map(from_document).collect()
    }

    async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>, AppError> {
        self.students()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(student_id = id, "Failed to find student: {}", e);
                AppError::from(e)
            })?
            .map(from_document)
            .transpose()
    }

    async fn save(&self, student: Student) -> Result<Student, AppError> {
        student.validate()?;

        let id = match student.id {
            Some(id) => {
                self.reserve_id(id).await?;
                id
            }
            None => self.next_id().await?,
        };

        let document = to_document(&student, id)?;
        let options = ReplaceOptions::builder().upsert(true).build();

        self.students()
            .replace_one(doc! { "_id": id }, document, options)
            .await
            .map_err(|e| {
                tracing::error!(student_id = id, "Failed to save student: {}", e);
                AppError::from(e)
            })?;

        Ok(student.with_id(id))
    }

    async fn delete_by_id(&self, id: StudentId) -> Result<(), AppError> {
        self.students()
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(student_id = id, "Failed to delete student: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
