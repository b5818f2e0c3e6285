//! Asynchronous player-ingestion jobs.
//!
//! ## Components
//!
//! - `Job`: status, progress and result of one ingestion
//! - `JobManager`: lifecycle persisted through a `BlobStore`
//! - `JobProcessor`: runs a job on a background task
//!
//! Callers poll; there is no push of progress.

pub mod manager;
pub mod processor;
pub mod types;

pub use manager::{JobError, JobManager};
pub use processor::{JobProcessor, ProcessError};
pub use types::{
    FetchStats, Job, JobId, JobOutcome, JobParams, JobPatch, JobProgress, JobStatus, TransitionError,
    MAX_MATCH_LIMIT, MIN_MATCH_LIMIT,
};
