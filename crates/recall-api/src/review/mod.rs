pub mod model;
pub mod routes;
pub mod scheduler;

pub use routes::routes;
pub use scheduler::{Scheduler, SchedulerError};
