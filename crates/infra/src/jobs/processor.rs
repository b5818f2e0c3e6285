//! Drives one ingestion job from `queued` to a terminal state.
//!
//! Steps:
//! 1. mark running
//! 2. resolve the riot id to an account
//! 3. fetch level/ranks (failure is logged and ignored)
//! 4. list recent match ids
//! 5. fetch match bodies concurrently; individual failures are counted, not fatal
//! 6. keep ranked queues only
//! 7. aggregate into a [`PlayerSummary`](matchlens_analytics::PlayerSummary)
//! 8. persist the raw match set and complete the job
//!
//! Anything that escapes `execute`, including a panic, fails the job.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use matchlens_analytics::{PlayerAggregator, PlayerInput, PlayerProfile};
use matchlens_core::{MatchRecord, RANKED_QUEUES};

use crate::riot::MatchSource;
use crate::upstream::UpstreamError;

use super::manager::{JobError, JobManager};
use super::types::{FetchStats, JobId, JobOutcome, JobPatch};

const PROGRESS_STARTED: u8 = 5;
const PROGRESS_IDENTITY: u8 = 10;
const PROGRESS_LISTED: u8 = 20;
const PROGRESS_FETCHED: u8 = 90;
const PROGRESS_AGGREGATING: u8 = 95;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("could not resolve {riot_id}: {source}")]
    Identity {
        riot_id: String,
        #[source]
        source: UpstreamError,
    },
    #[error("could not list matches: {0}")]
    MatchList(#[source] UpstreamError),
    #[error(transparent)]
    Job(#[from] JobError),
}

/// Percent reached after `done` of `total` match fetches finished.
pub(crate) fn fetch_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return PROGRESS_FETCHED;
    }
    let span = (PROGRESS_FETCHED - PROGRESS_LISTED) as usize;
    PROGRESS_LISTED + (span * done.min(total) / total) as u8
}

pub struct JobProcessor<S: MatchSource> {
    manager: Arc<JobManager>,
    source: Arc<S>,
    aggregator: PlayerAggregator,
}

impl<S: MatchSource> std::fmt::Debug for JobProcessor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobProcessor")
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}

impl<S: MatchSource> JobProcessor<S> {
    pub fn new(manager: Arc<JobManager>, source: Arc<S>) -> Self {
        Self {
            manager,
            source,
            aggregator: PlayerAggregator::default(),
        }
    }

    /// Run the job on a background task.
    pub fn spawn(self: &Arc<Self>, id: JobId) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(id).await })
    }

    /// Run the job to a terminal state. Never returns an error: failures are
    /// recorded on the job instead.
    pub async fn run(self: Arc<Self>, id: JobId) {
        let inner = Arc::clone(&self);
        let joined = tokio::spawn(async move { inner.execute(id).await }).await;

        let message = match joined {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(e) if e.is_panic() => "job task panicked".to_string(),
            Err(_) => "job task was cancelled".to_string(),
        };

        error!(job_id = %id, error = %message, "job failed");
        if let Err(e) = self.manager.fail(id, message).await {
            error!(job_id = %id, error = %e, "could not record job failure");
        }
    }

    async fn execute(&self, id: JobId) -> Result<(), ProcessError> {
        let job = self.manager.mark_running(id).await?;
        let params = job.params;
        let region = params.region;
        info!(job_id = %id, riot_id = %params.riot_id, region = %region, "job started");
        self.progress(id, PROGRESS_STARTED, "resolving account").await?;

        let account = self
            .source
            .resolve_account(&params.riot_id, region)
            .await
            .map_err(|source| ProcessError::Identity {
                riot_id: params.riot_id.to_string(),
                source,
            })?;
        self.progress(id, PROGRESS_IDENTITY, "fetching profile").await?;

        let profile = match self.source.fetch_profile(&account.puuid, region).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(job_id = %id, error = %e, "profile unavailable, continuing without it");
                PlayerProfile::default()
            }
        };

        let ids = self
            .source
            .list_match_ids(&account.puuid, region, params.match_limit)
            .await
            .map_err(ProcessError::MatchList)?;
        let total = ids.len();
        self.progress(id, PROGRESS_LISTED, format!("fetching {total} matches"))
            .await?;

        let mut fetches = JoinSet::new();
        for match_id in ids {
            let source = Arc::clone(&self.source);
            fetches.spawn(async move {
                let result = source.fetch_match(&match_id, region).await;
                (match_id, result)
            });
        }

        let mut stats = FetchStats {
            requested: total as u32,
            ..FetchStats::default()
        };
        let mut fetched: Vec<MatchRecord> = Vec::with_capacity(total);
        let mut done = 0usize;

        while let Some(joined) = fetches.join_next().await {
            done += 1;
            match joined {
                Ok((_, Ok(record))) => {
                    stats.fetched += 1;
                    fetched.push(record);
                }
                Ok((match_id, Err(e))) => {
                    stats.failed += 1;
                    warn!(job_id = %id, match_id = %match_id, error = %e, "match fetch failed");
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(job_id = %id, error = %e, "match fetch task aborted");
                }
            }
            self.progress(id, fetch_progress(done, total), format!("fetched {done}/{total}"))
                .await?;
        }

        let mut ranked: Vec<MatchRecord> = fetched.into_iter().filter(MatchRecord::is_ranked).collect();
        ranked.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.match_id.cmp(&b.match_id)));
        stats.ranked = ranked.len() as u32;
        debug!(
            job_id = %id,
            fetched = stats.fetched,
            failed = stats.failed,
            ranked = stats.ranked,
            "match fetch finished"
        );
        self.progress(id, PROGRESS_AGGREGATING, "aggregating").await?;

        let summary = self.aggregator.aggregate(PlayerInput {
            puuid: &account.puuid,
            riot_id: &account.riot_id,
            region,
            profile,
            matches: &ranked,
            queue_filter: &RANKED_QUEUES,
            generated_at: Utc::now(),
        });

        let matches_key = self.manager.store_matches(id, &ranked).await?;
        self.manager
            .complete(
                id,
                JobOutcome {
                    summary,
                    matches_key,
                    fetch: stats,
                },
            )
            .await?;

        info!(job_id = %id, sample_size = stats.ranked, "job complete");
        Ok(())
    }

    async fn progress(&self, id: JobId, percent: u8, message: impl Into<String>) -> Result<(), JobError> {
        self.manager.update(id, JobPatch::progress(percent, message)).await?;
        Ok(())
    }
}
