#![allow(dead_code)]

use std::sync::Arc;
use student_service::config::{MongoConfig, StoreBackend, StudentConfig};
use student_service::services::StudentService;
use student_service::startup::Application;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub students: Arc<dyn StudentService>,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the service on a random port with an empty in-memory store.
    pub async fn spawn() -> Self {
        Self::spawn_with(StudentConfig::in_memory()).await
    }

    /// Spawn against a throwaway MongoDB database.
    pub async fn spawn_mongo() -> Self {
        let mut config = StudentConfig::in_memory();
        config.store.backend = StoreBackend::MongoDb;
        config.store.mongodb = Some(MongoConfig {
            uri: std::env::var("TEST_MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database: format!("student_test_{}", uuid::Uuid::new_v4().simple()),
        });
        Self::spawn_with(config).await
    }

    pub async fn spawn_with(config: StudentConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let students = app.students();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            students,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// POST a student and return the `Location` header.
    pub async fn create_student(&self, body: serde_json::Value) -> String {
        let response = self
            .client
            .post(self.url("/students"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 201);

        response
            .headers()
            .get("location")
            .expect("Missing Location header")
            .to_str()
            .expect("Invalid Location header")
            .to_string()
    }
}
