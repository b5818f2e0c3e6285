//! `matchlens-analytics`
//!
//! **Responsibility:** deterministic statistics over ingested match records.
//!
//! Everything here is a pure function of its inputs:
//! - no I/O, no clocks (callers pass `generated_at`),
//! - records are borrowed and never mutated,
//! - output ordering does not depend on the order matches were fetched in.

pub mod duo;
pub mod player;
pub mod stats;
pub mod summary;

#[cfg(test)]
pub(crate) mod fixtures;

pub use duo::{DuoAggregator, DuoInput};
pub use player::{PlayerAggregator, PlayerInput};
pub use stats::{OptionalMean, PairKey, Tally, TallyMap};
pub use summary::{
    ChampionStat, Collaborator, DuoMember, DuoPlayerMetrics, DuoSummary, GameTexture, PairCount,
    PlayerProfile, PlayerSummary, Playstyle, PlaystyleTotals, ProfileBlock, QueueStat, RankEntry,
    RecentRecord, RoleStat, SideCounts, SummaryMeta, Synergy,
};
