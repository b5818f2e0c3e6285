//! Summary payloads produced by the aggregators.
//!
//! These are *derived* read models: immutable once produced, serialised as-is
//! into job results and handed to presentation/narrative layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use matchlens_core::{Puuid, Region, RiotId};

/// Ranked standing in one queue, as reported by the league service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub queue: String,
    pub tier: String,
    pub division: String,
    pub league_points: u32,
    pub wins: u32,
    pub losses: u32,
}

/// Optional profile data fetched alongside match history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub level: Option<u32>,
    pub ranks: Vec<RankEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRecord {
    pub matches: u32,
    pub wins: u32,
    /// `wins / matches`; `None` for an empty sample.
    pub win_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileBlock {
    pub level: Option<u32>,
    pub ranks: Vec<RankEntry>,
    pub recent: RecentRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChampionStat {
    pub champion: String,
    pub games: u32,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleStat {
    pub role: String,
    pub games: u32,
}

/// An unordered pair (roles or champions) with how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCount {
    pub first: String,
    pub second: String,
    pub games: u32,
    pub wins: u32,
}

/// A teammate the target shares games with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    pub puuid: Puuid,
    /// Most recently seen `GameName#TAG`, when the match data carried one.
    pub riot_id: Option<String>,
    pub games_together: u32,
    /// Wins are taken from the target's own result.
    pub wins_together: u32,
    pub last_played: DateTime<Utc>,
    pub top_role_pairs: Vec<PairCount>,
    pub top_champion_pairs: Vec<PairCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaystyleTotals {
    pub games: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub vision_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playstyle {
    /// `(kills + assists) / max(deaths, 1)` over the whole sample.
    pub avg_kda: f64,
    pub avg_kill_participation: Option<f64>,
    pub avg_vision_score: Option<f64>,
    pub avg_team_damage_share: Option<f64>,
    pub totals: PlaystyleTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMeta {
    pub sample_size: u32,
    pub generated_at: DateTime<Utc>,
    /// Queue ids the sample was restricted to.
    pub queue_filter: Vec<u16>,
}

/// Individual performance profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub puuid: Puuid,
    pub riot_id: RiotId,
    pub region: Region,
    pub profile: ProfileBlock,
    pub top_champions: Vec<ChampionStat>,
    pub roles: Vec<RoleStat>,
    pub collaborators: Vec<Collaborator>,
    pub playstyle: Playstyle,
    pub meta: SummaryMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuoMember {
    pub puuid: Puuid,
    pub riot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStat {
    pub queue_id: u16,
    pub queue: String,
    pub games: u32,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuoPlayerMetrics {
    pub avg_kill_participation: Option<f64>,
    pub avg_team_damage_share: Option<f64>,
    pub avg_vision_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synergy {
    /// Both players' kills + assists per shared game.
    pub avg_combined_kills_assists: f64,
    pub player_a: DuoPlayerMetrics,
    pub player_b: DuoPlayerMetrics,
}

/// How many shared games the duo's team played on each side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideCounts {
    pub blue: u32,
    pub red: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTexture {
    pub avg_duration_minutes: f64,
    pub sides: SideCounts,
}

/// Pairwise synergy profile for two players on the same team.
///
/// `synergy` and `texture` are `None` when the pair has no shared games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuoSummary {
    pub player_a: DuoMember,
    pub player_b: DuoMember,
    pub region: Region,
    pub sample_size: u32,
    pub wins: u32,
    pub win_rate: Option<f64>,
    pub no_shared_matches: bool,
    pub low_sample: bool,
    pub queues: Vec<QueueStat>,
    pub role_pairs: Vec<PairCount>,
    pub champion_pairs: Vec<PairCount>,
    pub synergy: Option<Synergy>,
    pub texture: Option<GameTexture>,
    pub generated_at: DateTime<Utc>,
}
