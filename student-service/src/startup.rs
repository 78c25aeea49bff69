//! Application startup and lifecycle management.

use crate::config::{StoreBackend, StudentConfig};
use crate::handlers;
use crate::services::{InMemoryStudents, StudentDb, StudentService};
use axum::{
    http::Method,
    middleware::from_fn,
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: StudentConfig,
    pub students: Arc<dyn StudentService>,
}

impl AppState {
    pub fn new(config: StudentConfig, students: Arc<dyn StudentService>) -> Self {
        Self { config, students }
    }
}

/// Open the store selected by configuration.
pub async fn connect_store(config: &StudentConfig) -> Result<Arc<dyn StudentService>, AppError> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory student store");
            Ok(Arc::new(InMemoryStudents::new()))
        }
        StoreBackend::MongoDb => {
            let mongo = config.store.mongodb.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "MongoDB backend selected but no MongoDB settings were provided"
                ))
            })?;
            let db = StudentDb::connect(&mongo.uri, &mongo.database)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    e
                })?;
            Ok(Arc::new(db))
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Any origin may call the student API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let student_routes = Router::new()
        .route(
            "/students",
            get(handlers::list_students).post(handlers::create_student),
        )
        .route(
            "/students/:id",
            get(handlers::get_student)
                .put(handlers::update_student)
                .delete(handlers::delete_student),
        )
        .layer(cors);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/test", get(handlers::ping))
        .merge(student_routes)
        .with_state(state)
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: StudentConfig) -> Result<Self, AppError> {
        let students = connect_store(&config).await?;
        Self::with_store(config, students).await
    }

    /// Build around an already constructed store.
    pub async fn with_store(
        config: StudentConfig,
        students: Arc<dyn StudentService>,
    ) -> Result<Self, AppError> {
        let state = AppState::new(config.clone(), students);
        let app = build_router(state.clone());

        // Port 0 = random port for testing
        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            backend = state.students.backend(),
            "Student service listening on port {}",
            port
        );

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn students(&self) -> Arc<dyn StudentService> {
        self.state.students.clone()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
