//! Riot Games API endpoints used by the ingestion pipeline.

pub mod api;
pub mod dto;

use async_trait::async_trait;

use matchlens_analytics::PlayerProfile;
use matchlens_core::{MatchId, MatchRecord, Puuid, Region, RiotId};

use crate::upstream::UpstreamError;

pub use api::RiotApi;

/// A resolved account: stable id plus the canonical handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub puuid: Puuid,
    pub riot_id: RiotId,
}

/// Where the job processor pulls identities and match history from.
#[async_trait]
pub trait MatchSource: Send + Sync + 'static {
    async fn resolve_account(&self, riot_id: &RiotId, region: Region) -> Result<Account, UpstreamError>;

    /// Level and ranked standings. Callers treat failure as non-fatal.
    async fn fetch_profile(&self, puuid: &Puuid, region: Region) -> Result<PlayerProfile, UpstreamError>;

    /// Most recent match ids, newest first.
    async fn list_match_ids(
        &self,
        puuid: &Puuid,
        region: Region,
        count: u8,
    ) -> Result<Vec<MatchId>, UpstreamError>;

    async fn fetch_match(&self, match_id: &MatchId, region: Region) -> Result<MatchRecord, UpstreamError>;
}
