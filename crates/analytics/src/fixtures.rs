//! Match builders for aggregator tests.

use chrono::{DateTime, TimeZone, Utc};

use matchlens_core::{MatchId, MatchRecord, Participant, Puuid, Team};

pub(crate) fn at(minute: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + minute * 60, 0).unwrap()
}

pub(crate) struct P {
    inner: Participant,
}

pub(crate) fn player(puuid: &str, team: Team) -> P {
    P {
        inner: Participant {
            puuid: Puuid::new(puuid),
            riot_id: Some(format!("{puuid}#TST")),
            team,
            role: "MIDDLE".to_string(),
            champion: "Ahri".to_string(),
            win: team == Team::Blue,
            kills: 0,
            deaths: 0,
            assists: 0,
            vision_score: None,
            kill_participation: None,
            team_damage_share: None,
        },
    }
}

impl P {
    pub(crate) fn role(mut self, role: &str) -> Self {
        self.inner.role = role.to_string();
        self
    }

    pub(crate) fn champ(mut self, champion: &str) -> Self {
        self.inner.champion = champion.to_string();
        self
    }

    pub(crate) fn win(mut self, win: bool) -> Self {
        self.inner.win = win;
        self
    }

    pub(crate) fn kda(mut self, kills: u32, deaths: u32, assists: u32) -> Self {
        self.inner.kills = kills;
        self.inner.deaths = deaths;
        self.inner.assists = assists;
        self
    }

    pub(crate) fn vision(mut self, score: u32) -> Self {
        self.inner.vision_score = Some(score);
        self
    }

    pub(crate) fn kp(mut self, kp: f64) -> Self {
        self.inner.kill_participation = Some(kp);
        self
    }

    pub(crate) fn dmg(mut self, share: f64) -> Self {
        self.inner.team_damage_share = Some(share);
        self
    }

    pub(crate) fn build(self) -> Participant {
        self.inner
    }
}

pub(crate) fn game(n: u32, queue_id: u16, participants: Vec<P>) -> MatchRecord {
    MatchRecord {
        match_id: MatchId::new(format!("EUW1_{n}")),
        queue_id,
        duration_secs: 1800,
        created_at: at(i64::from(n)),
        game_version: "14.3.558.106".to_string(),
        participants: participants.into_iter().map(P::build).collect(),
    }
}
