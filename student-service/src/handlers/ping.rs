pub const PING_MESSAGE: &str = "student-service: deployment OK";

/// GET /test
pub async fn ping() -> &'static str {
    PING_MESSAGE
}
