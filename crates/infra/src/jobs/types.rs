//! Core job types and lifecycle rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use matchlens_analytics::PlayerSummary;
use matchlens_core::{Region, RiotId};

/// Inclusive bounds on how many recent matches one job may ingest.
pub const MIN_MATCH_LIMIT: u8 = 1;
pub const MAX_MATCH_LIMIT: u8 = 100;

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Job execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet picked up
    Queued,
    /// Currently being executed
    Running,
    /// Finished with a result
    Complete,
    /// Finished with an error message
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }

    /// Allowed moves: `Queued -> Running -> {Complete, Error}`, plus
    /// `Queued -> Error` so a processor task that dies before `mark_running`
    /// can still fail its job instead of leaving it queued forever.
    /// `Complete` is only reachable through `Running`.
    fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Complete)
                | (JobStatus::Running, JobStatus::Error)
                | (JobStatus::Queued, JobStatus::Error)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job transition {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// What to ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParams {
    pub riot_id: RiotId,
    pub region: Region,
    pub match_limit: u8,
}

impl JobParams {
    /// `match_limit` is clamped into `[MIN_MATCH_LIMIT, MAX_MATCH_LIMIT]`.
    pub fn new(riot_id: RiotId, region: Region, match_limit: u32) -> Self {
        let clamped = match_limit.clamp(MIN_MATCH_LIMIT as u32, MAX_MATCH_LIMIT as u32) as u8;
        Self {
            riot_id,
            region,
            match_limit: clamped,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub percent: u8,
    pub message: Option<String>,
}

/// Counts from the match-body fetch phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    /// Ids returned by the listing endpoint.
    pub requested: u32,
    pub fetched: u32,
    pub failed: u32,
    /// Fetched matches that were in a ranked queue.
    pub ranked: u32,
}

impl FetchStats {
    pub fn filtered_out(&self) -> u32 {
        self.fetched.saturating_sub(self.ranked)
    }
}

/// Result payload of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub summary: PlayerSummary,
    /// Blob key of the raw ranked match set the summary was built from.
    pub matches_key: String,
    pub fetch: FetchStats,
}

/// Partial update merged into a job record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPatch {
    pub percent: Option<u8>,
    pub message: Option<String>,
}

impl JobPatch {
    pub fn progress(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: Some(percent),
            message: Some(message.into()),
        }
    }
}

/// A player-ingestion job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub params: JobParams,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub result: Option<JobOutcome>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(params: JobParams) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            params,
            status: JobStatus::Queued,
            progress: JobProgress::default(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    fn transition(&mut self, to: JobStatus) -> Result<DateTime<Utc>, TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        let now = Utc::now();
        self.status = to;
        self.updated_at = now;
        Ok(now)
    }

    pub fn mark_running(&mut self) -> Result<(), TransitionError> {
        let now = self.transition(JobStatus::Running)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// Merge a progress patch. Percent never moves backwards and is capped at 100.
    pub fn apply(&mut self, patch: JobPatch) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: self.status,
            });
        }
        if let Some(percent) = patch.percent {
            self.progress.percent = self.progress.percent.max(percent.min(100));
        }
        if patch.message.is_some() {
            self.progress.message = patch.message;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_complete(&mut self, outcome: JobOutcome) -> Result<(), TransitionError> {
        let now = self.transition(JobStatus::Complete)?;
        self.progress = JobProgress {
            percent: 100,
            message: Some("complete".to_string()),
        };
        self.result = Some(outcome);
        self.completed_at = Some(now);
        Ok(())
    }

    pub fn mark_error(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        let now = self.transition(JobStatus::Error)?;
        self.error = Some(error.into());
        self.completed_at = Some(now);
        Ok(())
    }
}
