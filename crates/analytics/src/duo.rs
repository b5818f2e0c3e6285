//! Pairwise synergy profile for two players.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use matchlens_core::{MatchRecord, Participant, Puuid, QueueType, Region, Team};

use crate::stats::{OptionalMean, PairKey, Tally, TallyMap};
use crate::summary::{
    DuoMember, DuoPlayerMetrics, DuoSummary, GameTexture, QueueStat, SideCounts, Synergy,
};

#[derive(Debug, Clone)]
pub struct DuoInput<'a> {
    pub player_a: &'a Puuid,
    pub player_b: &'a Puuid,
    pub region: Region,
    pub matches: &'a [MatchRecord],
    pub generated_at: DateTime<Utc>,
}

/// Builds a [`DuoSummary`] over the matches where both players were teammates.
#[derive(Debug, Clone)]
pub struct DuoAggregator {
    top_champion_pairs: usize,
    low_sample_threshold: u32,
}

impl Default for DuoAggregator {
    fn default() -> Self {
        Self {
            top_champion_pairs: 10,
            low_sample_threshold: 5,
        }
    }
}

struct SharedGame<'a> {
    record: &'a MatchRecord,
    a: &'a Participant,
    b: &'a Participant,
}

#[derive(Default)]
struct PlayerAcc {
    kill_participation: OptionalMean,
    damage_share: OptionalMean,
    vision: u32,
}

impl PlayerAcc {
    fn push(&mut self, p: &Participant) {
        self.kill_participation.push(p.kill_participation);
        self.damage_share.push(p.team_damage_share);
        self.vision += p.vision_score.unwrap_or(0);
    }

    fn finish(self, games: u32) -> DuoPlayerMetrics {
        DuoPlayerMetrics {
            avg_kill_participation: self.kill_participation.value(),
            avg_team_damage_share: self.damage_share.value(),
            avg_vision_score: f64::from(self.vision) / f64::from(games),
        }
    }
}

impl DuoAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self, input: DuoInput<'_>) -> DuoSummary {
        let shared: Vec<SharedGame<'_>> = input
            .matches
            .iter()
            .filter_map(|record| {
                let a = record.participant(input.player_a)?;
                let b = record.participant(input.player_b)?;
                (a.team == b.team).then_some(SharedGame { record, a, b })
            })
            .collect();

        let player_a = member(input.player_a, &shared, |g| g.a);
        let player_b = member(input.player_b, &shared, |g| g.b);
        let sample = shared.len() as u32;

        if shared.is_empty() {
            return DuoSummary {
                player_a,
                player_b,
                region: input.region,
                sample_size: 0,
                wins: 0,
                win_rate: None,
                no_shared_matches: true,
                low_sample: true,
                queues: Vec::new(),
                role_pairs: Vec::new(),
                champion_pairs: Vec::new(),
                synergy: None,
                texture: None,
                generated_at: input.generated_at,
            };
        }

        let mut wins = 0u32;
        let mut queues: BTreeMap<u16, Tally> = BTreeMap::new();
        let mut role_pairs: TallyMap<PairKey> = TallyMap::new();
        let mut champion_pairs: TallyMap<PairKey> = TallyMap::new();
        let mut combined_kills_assists = 0u32;
        let mut acc_a = PlayerAcc::default();
        let mut acc_b = PlayerAcc::default();
        let mut duration_secs = 0u64;
        let mut sides = SideCounts::default();

        for g in &shared {
            let win = g.a.win;
            if win {
                wins += 1;
            }
            queues.entry(g.record.queue_id).or_default().record(win);
            role_pairs.record(PairKey::new(&g.a.role, &g.b.role), win);
            champion_pairs.record(PairKey::new(&g.a.champion, &g.b.champion), win);

            combined_kills_assists += g.a.kills_and_assists() + g.b.kills_and_assists();
            acc_a.push(g.a);
            acc_b.push(g.b);

            duration_secs += u64::from(g.record.duration_secs);
            match g.a.team {
                Team::Blue => sides.blue += 1,
                Team::Red => sides.red += 1,
            }
        }

        let mut queues: Vec<QueueStat> = queues
            .into_iter()
            .map(|(queue_id, t)| QueueStat {
                queue_id,
                queue: QueueType::from_id(queue_id).label(),
                games: t.games,
                wins: t.wins,
            })
            .collect();
        queues.sort_by(|a, b| b.games.cmp(&a.games).then(a.queue_id.cmp(&b.queue_id)));

        let games = f64::from(sample);

        DuoSummary {
            player_a,
            player_b,
            region: input.region,
            sample_size: sample,
            wins,
            win_rate: Some(f64::from(wins) / games),
            no_shared_matches: false,
            low_sample: sample < self.low_sample_threshold,
            queues,
            role_pairs: role_pairs.top_pairs(usize::MAX),
            champion_pairs: champion_pairs.top_pairs(self.top_champion_pairs),
            synergy: Some(Synergy {
                avg_combined_kills_assists: f64::from(combined_kills_assists) / games,
                player_a: acc_a.finish(sample),
                player_b: acc_b.finish(sample),
            }),
            texture: Some(GameTexture {
                avg_duration_minutes: duration_secs as f64 / games / 60.0,
                sides,
            }),
            generated_at: input.generated_at,
        }
    }
}

/// Identity block with the display name from the most recent shared game.
fn member<'a>(
    puuid: &Puuid,
    shared: &[SharedGame<'a>],
    pick: impl Fn(&SharedGame<'a>) -> &'a Participant,
) -> DuoMember {
    let riot_id = shared
        .iter()
        .max_by_key(|g| g.record.created_at)
        .and_then(|g| pick(g).riot_id.clone());
    DuoMember {
        puuid: puuid.clone(),
        riot_id,
    }
}
