pub mod database;
pub mod memory;
pub mod metrics;
pub mod store;

pub use database::StudentDb;
pub use memory::InMemoryStudents;
pub use metrics::{get_metrics, init_metrics, record_operation};
pub use store::StudentService;
