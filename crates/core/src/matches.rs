//! Immutable match records as ingested from the upstream match service.
//!
//! Records are read-only input to the aggregators. Optional per-participant
//! metrics stay `Option` all the way down so "not reported" is never confused
//! with "zero".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{MatchId, Puuid};

/// Queue ids of the two ranked queues the summaries are computed over.
pub const RANKED_QUEUES: [u16; 2] = [QueueType::RANKED_SOLO_ID, QueueType::RANKED_FLEX_ID];

/// Competitive mode classifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueType {
    RankedSolo,
    RankedFlex,
    Other(u16),
}

impl QueueType {
    pub const RANKED_SOLO_ID: u16 = 420;
    pub const RANKED_FLEX_ID: u16 = 440;

    pub fn from_id(queue_id: u16) -> Self {
        match queue_id {
            Self::RANKED_SOLO_ID => QueueType::RankedSolo,
            Self::RANKED_FLEX_ID => QueueType::RankedFlex,
            other => QueueType::Other(other),
        }
    }

    /// Upstream queue name, e.g. `RANKED_SOLO_5x5`.
    pub fn label(&self) -> String {
        match self {
            QueueType::RankedSolo => "RANKED_SOLO_5x5".to_string(),
            QueueType::RankedFlex => "RANKED_FLEX_SR".to_string(),
            QueueType::Other(id) => format!("QUEUE_{id}"),
        }
    }
}

/// One of the two sides of the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    /// Maps the upstream numeric team id (100 / 200). Other ids belong to
    /// non-standard modes and yield `None`.
    pub fn from_team_id(team_id: u16) -> Option<Self> {
        match team_id {
            100 => Some(Team::Blue),
            200 => Some(Team::Red),
            _ => None,
        }
    }
}

/// One competitor's outcome within a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub puuid: Puuid,
    /// `GameName#TAG` as reported in the match, when present.
    pub riot_id: Option<String>,
    pub team: Team,
    /// Position label such as `TOP` or `UTILITY`; `UNKNOWN` when the upstream left it blank.
    pub role: String,
    pub champion: String,
    pub win: bool,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub vision_score: Option<u32>,
    /// Share of the team's kills this participant took part in, 0.0-1.0.
    pub kill_participation: Option<f64>,
    /// Share of the team's champion damage dealt by this participant, 0.0-1.0.
    pub team_damage_share: Option<f64>,
}

impl Participant {
    pub fn kills_and_assists(&self) -> u32 {
        self.kills + self.assists
    }
}

/// A completed game with per-competitor outcome data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub queue_id: u16,
    pub duration_secs: u32,
    pub created_at: DateTime<Utc>,
    /// Patch string, e.g. `14.3.558.106`.
    pub game_version: String,
    pub participants: Vec<Participant>,
}

impl MatchRecord {
    pub fn is_ranked(&self) -> bool {
        RANKED_QUEUES.contains(&self.queue_id)
    }

    pub fn participant(&self, puuid: &Puuid) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.puuid == puuid)
    }

    /// Everyone on `team` except `puuid`.
    pub fn teammates_of<'a>(
        &'a self,
        puuid: &'a Puuid,
        team: Team,
    ) -> impl Iterator<Item = &'a Participant> + 'a {
        self.participants
            .iter()
            .filter(move |p| p.team == team && &p.puuid != puuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(puuid: &str, team: Team) -> Participant {
        Participant {
            puuid: Puuid::new(puuid),
            riot_id: None,
            team,
            role: "MIDDLE".to_string(),
            champion: "Ahri".to_string(),
            win: team == Team::Blue,
            kills: 1,
            deaths: 1,
            assists: 1,
            vision_score: None,
            kill_participation: None,
            team_damage_share: None,
        }
    }

    fn record(queue_id: u16) -> MatchRecord {
        MatchRecord {
            match_id: MatchId::new("EUW1_1"),
            queue_id,
            duration_secs: 1800,
            created_at: Utc::now(),
            game_version: "14.3.558.106".to_string(),
            participants: vec![
                participant("a", Team::Blue),
                participant("b", Team::Blue),
                participant("c", Team::Red),
            ],
        }
    }

    #[test]
    fn ranked_filter_accepts_only_solo_and_flex() {
        assert!(record(420).is_ranked());
        assert!(record(440).is_ranked());
        assert!(!record(450).is_ranked());
        assert_eq!(QueueType::from_id(450), QueueType::Other(450));
        assert_eq!(QueueType::from_id(420).label(), "RANKED_SOLO_5x5");
        assert_eq!(QueueType::from_id(450).label(), "QUEUE_450");
    }

    #[test]
    fn teammates_excludes_self_and_enemies() {
        let m = record(420);
        let a = Puuid::new("a");
        let mates: Vec<_> = m.teammates_of(&a, Team::Blue).map(|p| p.puuid.as_str()).collect();
        assert_eq!(mates, vec!["b"]);
    }

    #[test]
    fn team_ids_map_both_ways() {
        assert_eq!(Team::from_team_id(100), Some(Team::Blue));
        assert_eq!(Team::from_team_id(200), Some(Team::Red));
        assert_eq!(Team::from_team_id(300), None);
        assert_eq!(serde_json::to_string(&Team::Blue).unwrap(), "\"blue\"");
    }
}
