//! Caller-facing operations. Each is a thin delegation to the job manager,
//! the processor, the duo aggregator or the narrative generator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use matchlens_analytics::{DuoAggregator, DuoInput, DuoSummary};
use matchlens_core::{DomainError, MatchRecord, Puuid, Region, RiotId};

use crate::config::AppConfig;
use crate::jobs::{
    JobError, JobId, JobManager, JobOutcome, JobParams, JobProcessor, JobProgress, JobStatus,
};
use crate::narrative::{DisabledNarrator, Narrative, NarrativeError, NarrativeGenerator};
use crate::riot::{MatchSource, RiotApi};
use crate::upstream::{RateLimitedClient, ReqwestTransport, UpstreamError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    Validation(#[from] DomainError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("job {id} is {status}, not complete")]
    JobNotComplete { id: JobId, status: JobStatus },
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
}

/// Untrusted input for [`InsightService::create_job`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    /// `Name#TAG`
    pub riot_id: String,
    pub region: String,
    pub match_limit: Option<u32>,
}

impl CreateJobRequest {
    pub fn new(riot_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            riot_id: riot_id.into(),
            region: region.into(),
            match_limit: None,
        }
    }

    pub fn with_match_limit(mut self, limit: u32) -> Self {
        self.match_limit = Some(limit);
        self
    }
}

/// Polling view of a job; never includes the result payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusView {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub error: Option<String>,
    pub riot_id: RiotId,
    pub region: Region,
    pub match_limit: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct InsightService<S: MatchSource> {
    manager: Arc<JobManager>,
    processor: Arc<JobProcessor<S>>,
    source: Arc<S>,
    duo: DuoAggregator,
    narrator: Arc<dyn NarrativeGenerator>,
    default_match_limit: u8,
}

impl<S: MatchSource> std::fmt::Debug for InsightService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightService")
            .field("default_match_limit", &self.default_match_limit)
            .finish_non_exhaustive()
    }
}

impl InsightService<RiotApi<ReqwestTransport>> {
    /// Production wiring: reqwest transport, shared rate-limited client, Riot endpoints.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let transport = ReqwestTransport::new(config.api_key.clone())?;
        let client = Arc::new(RateLimitedClient::new(transport, config.client_config()));
        let source = Arc::new(RiotApi::new(client));
        let manager = Arc::new(JobManager::new(config.blob_store()));
        info!(
            max_concurrency = config.max_concurrency,
            persistent = config.data_dir.is_some(),
            "insight service ready"
        );
        Ok(Self::new(manager, source).with_default_match_limit(config.match_limit))
    }
}

impl<S: MatchSource> InsightService<S> {
    pub fn new(manager: Arc<JobManager>, source: Arc<S>) -> Self {
        let processor = Arc::new(JobProcessor::new(Arc::clone(&manager), Arc::clone(&source)));
        Self {
            manager,
            processor,
            source,
            duo: DuoAggregator::default(),
            narrator: Arc::new(DisabledNarrator),
            default_match_limit: 20,
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeGenerator>) -> Self {
        self.narrator = narrator;
        self
    }

    pub fn with_default_match_limit(mut self, limit: u8) -> Self {
        self.default_match_limit = limit;
        self
    }

    pub fn manager(&self) -> &Arc<JobManager> {
        &self.manager
    }

    /// Validate, persist a queued job and start processing it in the background.
    pub async fn create_job(&self, request: CreateJobRequest) -> Result<JobId, ServiceError> {
        let riot_id: RiotId = request.riot_id.parse()?;
        let region: Region = request.region.parse()?;
        let limit = request
            .match_limit
            .unwrap_or(u32::from(self.default_match_limit));

        let id = self
            .manager
            .create(JobParams::new(riot_id, region, limit))
            .await?;
        let _ = self.processor.spawn(id);
        Ok(id)
    }

    pub async fn get_job_status(&self, id: JobId) -> Result<JobStatusView, ServiceError> {
        let job = self
            .manager
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("job {id}")))?;

        Ok(JobStatusView {
            id: job.id,
            status: job.status,
            progress: job.progress,
            error: job.error,
            riot_id: job.params.riot_id,
            region: job.params.region,
            match_limit: job.params.match_limit,
            created_at: job.created_at,
            updated_at: job.updated_at,
        })
    }

    pub async fn get_job_result(&self, id: JobId) -> Result<JobOutcome, ServiceError> {
        let job = self
            .manager
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("job {id}")))?;

        match job.result {
            Some(outcome) if job.status == JobStatus::Complete => Ok(outcome),
            _ => Err(ServiceError::JobNotComplete {
                id,
                status: job.status,
            }),
        }
    }

    /// Duo profile of `player` and `partner`, computed from `player`'s most
    /// recent completed job on `region`.
    pub async fn get_duo_summary(
        &self,
        player: &RiotId,
        region: Region,
        partner: &RiotId,
    ) -> Result<DuoSummary, ServiceError> {
        let job = self
            .manager
            .latest_complete_for(player, region)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("no completed job for {player} on {region}")))?;
        let outcome = job.result.ok_or_else(|| ServiceError::JobNotComplete {
            id: job.id,
            status: job.status,
        })?;

        let matches = self.manager.load_matches(&outcome.matches_key).await?;
        let player_puuid = outcome.summary.puuid;
        let partner_puuid = match find_by_riot_id(&matches, partner) {
            Some(puuid) => puuid,
            None => {
                debug!(partner = %partner, "partner not in stored matches, resolving");
                self.source
                    .resolve_account(partner, region)
                    .await
                    .map_err(|e| {
                        if e.is_not_found() {
                            ServiceError::NotFound(format!("account {partner}"))
                        } else {
                            ServiceError::Upstream(e)
                        }
                    })?
                    .puuid
            }
        };

        let mut summary = self.duo.aggregate(DuoInput {
            player_a: &player_puuid,
            player_b: &partner_puuid,
            region,
            matches: &matches,
            generated_at: Utc::now(),
        });
        summary.player_a.riot_id.get_or_insert_with(|| player.to_string());
        summary.player_b.riot_id.get_or_insert_with(|| partner.to_string());
        Ok(summary)
    }

    pub async fn player_narrative(
        &self,
        id: JobId,
        focus: Option<&str>,
    ) -> Result<Narrative, ServiceError> {
        let outcome = self.get_job_result(id).await?;
        Ok(self.narrator.describe_player(&outcome.summary, focus).await?)
    }

    pub async fn duo_narrative(
        &self,
        player: &RiotId,
        region: Region,
        partner: &RiotId,
    ) -> Result<Narrative, ServiceError> {
        let summary = self.get_duo_summary(player, region, partner).await?;
        let names = (player.to_string(), partner.to_string());
        Ok(self
            .narrator
            .describe_duo(&summary, Some((names.0.as_str(), names.1.as_str())))
            .await?)
    }
}

/// Puuid of the participant whose display name matches `riot_id`.
fn find_by_riot_id(matches: &[MatchRecord], riot_id: &RiotId) -> Option<Puuid> {
    matches
        .iter()
        .flat_map(|m| &m.participants)
        .find(|p| {
            p.riot_id
                .as_deref()
                .and_then(|name| name.parse::<RiotId>().ok())
                .is_some_and(|seen| seen.matches(riot_id))
        })
        .map(|p| p.puuid.clone())
}

