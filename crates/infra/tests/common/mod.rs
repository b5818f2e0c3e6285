//! Shared fixtures for the pipeline tests: a path-routed fake of the Riot
//! API and JSON builders for its payloads.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use matchlens_core::Region;
use matchlens_infra::jobs::{Job, JobId, JobManager, JobStatus};
use matchlens_infra::riot::RiotApi;
use matchlens_infra::store::{BlobStore, InMemoryBlobStore, StoreError};
use matchlens_infra::upstream::{
    ClientConfig, HttpTransport, RateLimitedClient, TransportError, UpstreamResponse,
};
use matchlens_infra::InsightService;

pub const REGION: Region = Region::Euw1;

/// Host the fake API is mounted under; routing values are prefixed to it.
pub const API_HOST: &str = "riot.test";

/// Answers by URL path; unknown paths are 404.
#[derive(Debug, Default)]
pub struct FakeRiot {
    routes: Mutex<HashMap<String, UpstreamResponse>>,
    hits: Mutex<Vec<String>>,
}

impl FakeRiot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), UpstreamResponse::new(status, body));
    }

    pub fn json(&self, path: &str, value: Value) {
        self.respond(path, 200, value.to_string());
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn account(&self, puuid: &str, name: &str, tag: &str) {
        self.json(
            &format!("/riot/account/v1/accounts/by-riot-id/{name}/{tag}"),
            json!({ "puuid": puuid, "gameName": name, "tagLine": tag }),
        );
    }

    pub fn profile(&self, puuid: &str, level: u32) {
        self.json(
            &format!("/lol/summoner/v4/summoners/by-puuid/{puuid}"),
            json!({ "summonerLevel": level }),
        );
        self.json(
            &format!("/lol/league/v4/entries/by-puuid/{puuid}"),
            json!([{
                "queueType": "RANKED_SOLO_5x5",
                "tier": "GOLD",
                "rank": "II",
                "leaguePoints": 40,
                "wins": 30,
                "losses": 25
            }]),
        );
    }

    pub fn match_ids(&self, puuid: &str, ids: &[String]) {
        self.json(&format!("/lol/match/v5/matches/by-puuid/{puuid}/ids"), json!(ids));
    }

    pub fn match_body(&self, body: Value) {
        let id = body["metadata"]["matchId"]
            .as_str()
            .expect("match body needs metadata.matchId")
            .to_string();
        self.json(&format!("/lol/match/v5/matches/{id}"), body);
    }
}

#[async_trait]
impl HttpTransport for FakeRiot {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, TransportError> {
        self.hits.lock().unwrap().push(url.to_string());
        let found = self.routes.lock().unwrap().get(url.path()).cloned();
        Ok(found.unwrap_or_else(|| UpstreamResponse::new(404, r#"{"status":{"status_code":404}}"#)))
    }
}

/// One participant of a match body.
pub fn participant(puuid: &str, riot_id: (&str, &str), team: u16, role: &str, champion: &str, win: bool) -> Value {
    json!({
        "puuid": puuid,
        "riotIdGameName": riot_id.0,
        "riotIdTagline": riot_id.1,
        "teamId": team,
        "teamPosition": role,
        "championName": champion,
        "win": win,
        "kills": 5,
        "deaths": 3,
        "assists": 7,
        "visionScore": 20,
        "challenges": { "killParticipation": 0.5, "teamDamagePercentage": 0.25 }
    })
}

pub fn match_body(id: &str, queue_id: u16, minute: i64, participants: Vec<Value>) -> Value {
    let creation = 1_700_000_000_000i64 + minute * 60_000;
    json!({
        "metadata": { "matchId": id },
        "info": {
            "queueId": queue_id,
            "gameCreation": creation,
            "gameEndTimestamp": creation + 1_800_000,
            "gameDuration": 1800,
            "gameVersion": "14.3.1",
            "participants": participants
        }
    })
}

/// A ranked solo game where Alpha (blue) and Bravo (blue) play together.
pub fn duo_game(id: &str, minute: i64, win: bool) -> Value {
    match_body(
        id,
        420,
        minute,
        vec![
            participant("p-alpha", ("Alpha", "EUW"), 100, "JUNGLE", "Vi", win),
            participant("p-bravo", ("Bravo", "EUW"), 100, "MIDDLE", "Ahri", win),
            participant("p-enemy", ("Enemy", "EUW"), 200, "TOP", "Garen", !win),
        ],
    )
}

/// Blob store that records the progress percent of every job write.
#[derive(Debug, Default)]
pub struct ProgressTap {
    inner: InMemoryBlobStore,
    seen: Mutex<Vec<(JobStatus, u8)>>,
}

impl ProgressTap {
    pub fn seen(&self) -> Vec<(JobStatus, u8)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for ProgressTap {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.starts_with("jobs/") {
            if let Ok(job) = serde_json::from_slice::<Job>(&value) {
                self.seen.lock().unwrap().push((job.status, job.progress.percent));
            }
        }
        self.inner.put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key).await
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list_keys(prefix).await
    }
}

pub type FakeService = InsightService<RiotApi<Arc<FakeRiot>>>;

pub fn service_with_store(riot: &Arc<FakeRiot>, store: Arc<dyn BlobStore>) -> FakeService {
    let client = Arc::new(RateLimitedClient::new(Arc::clone(riot), ClientConfig::default()));
    let source = Arc::new(RiotApi::new(client).with_host(API_HOST));
    InsightService::new(Arc::new(JobManager::new(store)), source)
}

pub fn service(riot: &Arc<FakeRiot>) -> FakeService {
    service_with_store(riot, InMemoryBlobStore::arc())
}

/// Poll until the job is terminal.
pub async fn wait_for_terminal(service: &FakeService, id: JobId) -> Job {
    for _ in 0..2_000 {
        let status = service.get_job_status(id).await.expect("job exists");
        if status.status.is_terminal() {
            return service
                .manager()
                .get(id)
                .await
                .expect("store readable")
                .expect("job exists");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} did not finish");
}
