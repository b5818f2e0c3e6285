//! Job lifecycle persisted through a [`BlobStore`].
//!
//! Layout:
//! - `jobs/<id>.json`: the [`Job`] record
//! - `matches/<id>.json`: the raw ranked [`MatchRecord`]s a completed job aggregated
//!
//! Every mutation is a read-modify-write of the whole record; concurrent
//! writers to the same job resolve as last-write-wins.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use matchlens_core::{MatchRecord, Region, RiotId};

use crate::store::{BlobStore, StoreError};

use super::types::{Job, JobId, JobOutcome, JobParams, JobPatch, TransitionError};

const JOBS_PREFIX: &str = "jobs/";
const MATCHES_PREFIX: &str = "matches/";

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored match set missing: {0}")]
    MissingMatches(String),
}

#[derive(Clone)]
pub struct JobManager {
    store: Arc<dyn BlobStore>,
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager").finish_non_exhaustive()
    }
}

fn job_key(id: JobId) -> String {
    format!("{JOBS_PREFIX}{id}.json")
}

fn matches_key(id: JobId) -> String {
    format!("{MATCHES_PREFIX}{id}.json")
}

impl JobManager {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Persist a new queued job.
    pub async fn create(&self, params: JobParams) -> Result<JobId, JobError> {
        let job = Job::new(params);
        self.save(&job).await?;
        debug!(job_id = %job.id, riot_id = %job.params.riot_id, "job created");
        Ok(job.id)
    }

    pub async fn get(&self, id: JobId) -> Result<Option<Job>, JobError> {
        self.read_json(&job_key(id)).await
    }

    pub async fn mark_running(&self, id: JobId) -> Result<Job, JobError> {
        self.modify(id, |job| job.mark_running()).await
    }

    pub async fn update(&self, id: JobId, patch: JobPatch) -> Result<Job, JobError> {
        self.modify(id, |job| job.apply(patch)).await
    }

    pub async fn complete(&self, id: JobId, outcome: JobOutcome) -> Result<Job, JobError> {
        self.modify(id, |job| job.mark_complete(outcome)).await
    }

    pub async fn fail(&self, id: JobId, error: impl Into<String>) -> Result<Job, JobError> {
        let error = error.into();
        self.modify(id, |job| job.mark_error(error)).await
    }

    /// Every readable job, oldest first. Unreadable records are skipped.
    pub async fn list_all(&self) -> Result<Vec<Job>, JobError> {
        let mut jobs = Vec::new();
        for key in self.store.list_keys(JOBS_PREFIX).await? {
            match self.read_json::<Job>(&key).await {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "skipping unreadable job record"),
            }
        }
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(jobs)
    }

    /// Most recently completed job for this identity on this platform.
    pub async fn latest_complete_for(
        &self,
        riot_id: &RiotId,
        region: Region,
    ) -> Result<Option<Job>, JobError> {
        let latest = self
            .list_all()
            .await?
            .into_iter()
            .filter(|job| {
                job.result.is_some()
                    && job.params.region == region
                    && job.params.riot_id.matches(riot_id)
            })
            .max_by_key(|job| (job.completed_at, job.created_at, job.id));
        Ok(latest)
    }

    /// Store the raw match set for a job; returns the blob key.
    pub async fn store_matches(&self, id: JobId, matches: &[MatchRecord]) -> Result<String, JobError> {
        let key = matches_key(id);
        self.write_json(&key, &matches).await?;
        Ok(key)
    }

    pub async fn load_matches(&self, key: &str) -> Result<Vec<MatchRecord>, JobError> {
        self.read_json(key)
            .await?
            .ok_or_else(|| JobError::MissingMatches(key.to_string()))
    }

    async fn modify<F>(&self, id: JobId, f: F) -> Result<Job, JobError>
    where
        F: FnOnce(&mut Job) -> Result<(), TransitionError>,
    {
        let mut job = self.get(id).await?.ok_or(JobError::NotFound(id))?;
        f(&mut job)?;
        self.save(&job).await?;
        Ok(job)
    }

    async fn save(&self, job: &Job) -> Result<(), JobError> {
        self.write_json(&job_key(job.id), job).await
    }

    async fn write_json<V: Serialize + ?Sized>(&self, key: &str, value: &V) -> Result<(), JobError> {
        let bytes = serde_json::to_vec(value)?;
        self.store.put(key, bytes).await?;
        Ok(())
    }

    async fn read_json<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>, JobError> {
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
