//! Individual performance profile.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use matchlens_core::{MatchRecord, Puuid, Region, RiotId};

use crate::stats::{mean, OptionalMean, PairKey, TallyMap};
use crate::summary::{
    ChampionStat, Collaborator, PlayerProfile, PlayerSummary, Playstyle, PlaystyleTotals,
    ProfileBlock, RecentRecord, RoleStat, SummaryMeta,
};

/// Everything the player aggregation reads. Matches are expected to be
/// pre-filtered to the queues listed in `queue_filter`.
#[derive(Debug, Clone)]
pub struct PlayerInput<'a> {
    pub puuid: &'a Puuid,
    pub riot_id: &'a RiotId,
    pub region: Region,
    pub profile: PlayerProfile,
    pub matches: &'a [MatchRecord],
    pub queue_filter: &'a [u16],
    pub generated_at: DateTime<Utc>,
}

/// Builds a [`PlayerSummary`] from a filtered match sample.
#[derive(Debug, Clone)]
pub struct PlayerAggregator {
    top_champions: usize,
    top_collaborators: usize,
    role_pairs_per_collaborator: usize,
    champion_pairs_per_collaborator: usize,
}

impl Default for PlayerAggregator {
    fn default() -> Self {
        Self {
            top_champions: 10,
            top_collaborators: 10,
            role_pairs_per_collaborator: 2,
            champion_pairs_per_collaborator: 3,
        }
    }
}

#[derive(Debug)]
struct CollaboratorAcc {
    riot_id: Option<String>,
    games: u32,
    wins: u32,
    last_played: DateTime<Utc>,
    role_pairs: TallyMap<PairKey>,
    champion_pairs: TallyMap<PairKey>,
}

impl PlayerAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self, input: PlayerInput<'_>) -> PlayerSummary {
        let target = input.puuid;
        let sample = input.matches.len();

        let mut wins = 0u32;
        let mut champions: TallyMap<String> = TallyMap::new();
        let mut roles: TallyMap<String> = TallyMap::new();
        let mut collaborators: HashMap<&Puuid, CollaboratorAcc> = HashMap::new();
        let mut totals = PlaystyleTotals::default();
        let mut kill_participation = OptionalMean::default();
        let mut damage_share = OptionalMean::default();

        for record in input.matches {
            // A record the target is missing from still counts toward the sample as a non-win.
            let Some(me) = record.participant(target) else {
                continue;
            };

            if me.win {
                wins += 1;
            }
            champions.record(me.champion.clone(), me.win);
            roles.record(me.role.clone(), me.win);

            totals.games += 1;
            totals.kills += me.kills;
            totals.deaths += me.deaths;
            totals.assists += me.assists;
            totals.vision_score += me.vision_score.unwrap_or(0);
            kill_participation.push(me.kill_participation);
            damage_share.push(me.team_damage_share);

            for mate in record.teammates_of(target, me.team) {
                let acc = collaborators
                    .entry(&mate.puuid)
                    .or_insert_with(|| CollaboratorAcc {
                        riot_id: None,
                        games: 0,
                        wins: 0,
                        last_played: record.created_at,
                        role_pairs: TallyMap::new(),
                        champion_pairs: TallyMap::new(),
                    });

                acc.games += 1;
                if me.win {
                    acc.wins += 1;
                }
                if record.created_at >= acc.last_played || acc.riot_id.is_none() {
                    acc.riot_id = mate.riot_id.clone().or(acc.riot_id.take());
                }
                acc.last_played = acc.last_played.max(record.created_at);
                acc.role_pairs.record(PairKey::new(&me.role, &mate.role), me.win);
                acc.champion_pairs
                    .record(PairKey::new(&me.champion, &mate.champion), me.win);
            }
        }

        let avg_kda = f64::from(totals.kills + totals.assists) / f64::from(totals.deaths.max(1));

        let playstyle = Playstyle {
            avg_kda,
            avg_kill_participation: kill_participation.value(),
            avg_vision_score: mean(f64::from(totals.vision_score), sample),
            avg_team_damage_share: damage_share.value(),
            totals,
        };

        PlayerSummary {
            puuid: target.clone(),
            riot_id: input.riot_id.clone(),
            region: input.region,
            profile: ProfileBlock {
                level: input.profile.level,
                ranks: input.profile.ranks,
                recent: RecentRecord {
                    matches: sample as u32,
                    wins,
                    win_rate: mean(f64::from(wins), sample),
                },
            },
            top_champions: champions
                .top(self.top_champions)
                .into_iter()
                .map(|(champion, t)| ChampionStat {
                    champion,
                    games: t.games,
                    wins: t.wins,
                })
                .collect(),
            roles: roles
                .ranked()
                .into_iter()
                .map(|(role, t)| RoleStat {
                    role,
                    games: t.games,
                })
                .collect(),
            collaborators: self.rank_collaborators(collaborators),
            playstyle,
            meta: SummaryMeta {
                sample_size: sample as u32,
                generated_at: input.generated_at,
                queue_filter: input.queue_filter.to_vec(),
            },
        }
    }

    fn rank_collaborators(&self, accs: HashMap<&Puuid, CollaboratorAcc>) -> Vec<Collaborator> {
        let mut rows: Vec<(&Puuid, CollaboratorAcc)> = accs.into_iter().collect();
        rows.sort_by(|(pa, a), (pb, b)| {
            b.games
                .cmp(&a.games)
                .then(b.wins.cmp(&a.wins))
                .then(pa.cmp(pb))
        });
        rows.truncate(self.top_collaborators);

        rows.into_iter()
            .map(|(puuid, acc)| Collaborator {
                puuid: puuid.clone(),
                riot_id: acc.riot_id,
                games_together: acc.games,
                wins_together: acc.wins,
                last_played: acc.last_played,
                top_role_pairs: acc.role_pairs.top_pairs(self.role_pairs_per_collaborator),
                top_champion_pairs: acc
                    .champion_pairs
                    .top_pairs(self.champion_pairs_per_collaborator),
            })
            .collect()
    }
}
