pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod review;
pub mod router;
pub mod state;
pub mod tracing;
pub mod v1;
pub mod validation;

pub use config::{ApiConfig, Environment, SchedulerConfig};
pub use review::{Scheduler, SchedulerError};
pub use state::ApiState;
