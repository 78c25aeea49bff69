pub mod health;
pub mod ping;
pub mod students;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use ping::{ping, PING_MESSAGE};
pub use students::{
    create_student, delete_student, get_student, list_students, update_student,
    StudentListResponse,
};
