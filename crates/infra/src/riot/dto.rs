//! Wire shapes of the Riot endpoints, and their mapping into domain records.
//!
//! Only the fields the pipeline reads are declared; everything else in the
//! payloads is ignored.

use chrono::DateTime;
use serde::Deserialize;

use matchlens_analytics::RankEntry;
use matchlens_core::{MatchId, MatchRecord, Participant, Puuid, Team};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    pub summoner_level: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    pub queue_type: String,
    pub tier: String,
    pub rank: String,
    pub league_points: u32,
    pub wins: u32,
    pub losses: u32,
}

impl From<LeagueEntryDto> for RankEntry {
    fn from(dto: LeagueEntryDto) -> Self {
        RankEntry {
            queue: dto.queue_type,
            tier: dto.tier,
            division: dto.rank,
            league_points: dto.league_points,
            wins: dto.wins,
            losses: dto.losses,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub metadata: MatchMetadataDto,
    pub info: MatchInfoDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadataDto {
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfoDto {
    pub queue_id: u16,
    /// Seconds when `game_end_timestamp` is present, milliseconds on older records.
    pub game_duration: u64,
    pub game_end_timestamp: Option<i64>,
    pub game_creation: i64,
    #[serde(default)]
    pub game_version: String,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    pub riot_id_game_name: Option<String>,
    pub riot_id_tagline: Option<String>,
    pub team_id: u16,
    #[serde(default)]
    pub team_position: String,
    #[serde(default)]
    pub individual_position: String,
    pub champion_name: String,
    pub win: bool,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub vision_score: Option<u32>,
    pub challenges: Option<ChallengesDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengesDto {
    pub kill_participation: Option<f64>,
    pub team_damage_percentage: Option<f64>,
}

const UNKNOWN_ROLE: &str = "UNKNOWN";

impl ParticipantDto {
    fn role(&self) -> String {
        [&self.team_position, &self.individual_position]
            .into_iter()
            .find(|p| !p.is_empty() && p.as_str() != "Invalid")
            .cloned()
            .unwrap_or_else(|| UNKNOWN_ROLE.to_string())
    }

    fn riot_id(&self) -> Option<String> {
        match (&self.riot_id_game_name, &self.riot_id_tagline) {
            (Some(name), Some(tag)) if !name.is_empty() && !tag.is_empty() => {
                Some(format!("{name}#{tag}"))
            }
            _ => None,
        }
    }

    /// `None` for participants outside the two standard teams.
    fn into_participant(self) -> Option<Participant> {
        let team = Team::from_team_id(self.team_id)?;
        let role = self.role();
        let riot_id = self.riot_id();
        let challenges = self.challenges.unwrap_or_default();

        Some(Participant {
            puuid: Puuid::new(self.puuid),
            riot_id,
            team,
            role,
            champion: self.champion_name,
            win: self.win,
            kills: self.kills,
            deaths: self.deaths,
            assists: self.assists,
            vision_score: self.vision_score,
            kill_participation: challenges.kill_participation,
            team_damage_share: challenges.team_damage_percentage,
        })
    }
}

impl From<MatchDto> for MatchRecord {
    fn from(dto: MatchDto) -> Self {
        let info = dto.info;
        let duration_secs = match info.game_end_timestamp {
            Some(_) => info.game_duration,
            None => info.game_duration / 1000,
        };

        MatchRecord {
            match_id: MatchId::new(dto.metadata.match_id),
            queue_id: info.queue_id,
            duration_secs: u32::try_from(duration_secs).unwrap_or(u32::MAX),
            created_at: DateTime::from_timestamp_millis(info.game_creation).unwrap_or_default(),
            game_version: info.game_version,
            participants: info
                .participants
                .into_iter()
                .filter_map(ParticipantDto::into_participant)
                .collect(),
        }
    }
}
