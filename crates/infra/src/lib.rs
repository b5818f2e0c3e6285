//! Infrastructure layer: upstream access, job orchestration, storage and the
//! caller-facing service.

pub mod config;
pub mod jobs;
pub mod narrative;
pub mod riot;
pub mod service;
pub mod store;
pub mod upstream;

pub use config::{AppConfig, ConfigError};
pub use service::{CreateJobRequest, InsightService, JobStatusView, ServiceError};
