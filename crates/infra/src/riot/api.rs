//! Endpoint layer over [`RateLimitedClient`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use matchlens_analytics::PlayerProfile;
use matchlens_core::{MatchId, MatchRecord, Puuid, Region, RiotId};

use super::dto::{AccountDto, LeagueEntryDto, MatchDto, SummonerDto};
use super::{Account, MatchSource};
use crate::upstream::{HttpTransport, RateLimitedClient, UpstreamError};

pub const DEFAULT_API_HOST: &str = "api.riotgames.com";

/// Builds endpoint URLs for a routing value and fetches them through the shared client.
#[derive(Debug)]
pub struct RiotApi<T: HttpTransport> {
    client: Arc<RateLimitedClient<T>>,
    host: String,
}

impl<T: HttpTransport> RiotApi<T> {
    pub fn new(client: Arc<RateLimitedClient<T>>) -> Self {
        Self {
            client,
            host: DEFAULT_API_HOST.to_string(),
        }
    }

    /// Override the API host (routing values are still prefixed, e.g. `europe.<host>`).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    fn url(&self, routing: &str, segments: &[&str], query: &[(&str, String)]) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("https://{routing}.{}/", self.host))
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(format!("cannot-be-a-base url for {routing}")))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

#[async_trait]
impl<T: HttpTransport> MatchSource for RiotApi<T> {
    async fn resolve_account(&self, riot_id: &RiotId, region: Region) -> Result<Account, UpstreamError> {
        let url = self.url(
            region.account_cluster(),
            &[
                "riot",
                "account",
                "v1",
                "accounts",
                "by-riot-id",
                &riot_id.game_name,
                &riot_id.tag_line,
            ],
            &[],
        )?;
        let dto: AccountDto = self.client.get_json(&url).await?;

        // Keep the caller's spelling when the upstream omits the canonical one.
        let canonical = match (dto.game_name, dto.tag_line) {
            (Some(name), Some(tag)) => RiotId::new(name, tag).unwrap_or_else(|_| riot_id.clone()),
            _ => riot_id.clone(),
        };

        Ok(Account {
            puuid: Puuid::new(dto.puuid),
            riot_id: canonical,
        })
    }

    async fn fetch_profile(&self, puuid: &Puuid, region: Region) -> Result<PlayerProfile, UpstreamError> {
        let platform = region.platform();
        let summoner_url = self.url(
            platform,
            &["lol", "summoner", "v4", "summoners", "by-puuid", puuid.as_str()],
            &[],
        )?;
        let league_url = self.url(
            platform,
            &["lol", "league", "v4", "entries", "by-puuid", puuid.as_str()],
            &[],
        )?;

        let summoner: SummonerDto = self.client.get_json(&summoner_url).await?;
        let entries: Vec<LeagueEntryDto> = self.client.get_json(&league_url).await?;

        Ok(PlayerProfile {
            level: Some(summoner.summoner_level),
            ranks: entries.into_iter().map(Into::into).collect(),
        })
    }

    async fn list_match_ids(
        &self,
        puuid: &Puuid,
        region: Region,
        count: u8,
    ) -> Result<Vec<MatchId>, UpstreamError> {
        let url = self.url(
            region.match_cluster(),
            &["lol", "match", "v5", "matches", "by-puuid", puuid.as_str(), "ids"],
            &[("start", "0".to_string()), ("count", count.to_string())],
        )?;
        let ids: Vec<String> = self.client.get_json(&url).await?;
        debug!(puuid = %puuid, count = ids.len(), "listed match ids");
        Ok(ids.into_iter().map(MatchId::new).collect())
    }

    async fn fetch_match(&self, match_id: &MatchId, region: Region) -> Result<MatchRecord, UpstreamError> {
        let url = self.url(
            region.match_cluster(),
            &["lol", "match", "v5", "matches", match_id.as_str()],
            &[],
        )?;
        let dto: MatchDto = self.client.get_json(&url).await?;
        Ok(dto.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::upstream::{ClientConfig, TransportError, UpstreamResponse};

    #[derive(Default)]
    struct RecordingTransport {
        urls: Mutex<Vec<String>>,
        body: String,
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn get(&self, url: &Url) -> Result<UpstreamResponse, TransportError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(UpstreamResponse::new(200, self.body.clone()))
        }
    }

    fn api(body: &str) -> (Arc<RecordingTransport>, RiotApi<Arc<RecordingTransport>>) {
        let transport = Arc::new(RecordingTransport {
            urls: Mutex::new(Vec::new()),
            body: body.to_string(),
        });
        let client = Arc::new(RateLimitedClient::new(Arc::clone(&transport), ClientConfig::default()));
        (transport, RiotApi::new(client))
    }

    #[tokio::test]
    async fn account_lookup_routes_to_account_cluster_and_escapes_name() {
        let (transport, api) =
            api(r#"{"puuid":"abc","gameName":"Mid or Feed","tagLine":"EUW"}"#);
        let riot_id = RiotId::new("mid or feed", "euw").unwrap();

        let account = api.resolve_account(&riot_id, Region::Euw1).await.unwrap();
        assert_eq!(account.puuid.as_str(), "abc");
        assert_eq!(account.riot_id.game_name, "Mid or Feed");

        let urls = transport.urls.lock().unwrap();
        assert_eq!(
            urls[0],
            "https://europe.api.riotgames.com/riot/account/v1/accounts/by-riot-id/mid%20or%20feed/euw"
        );
    }

    #[tokio::test]
    async fn match_ids_use_match_cluster_and_count() {
        let (transport, api) = api(r#"["OC1_1","OC1_2"]"#);

        let ids = api
            .list_match_ids(&Puuid::new("abc"), Region::Oc1, 20)
            .await
            .unwrap();
        assert_eq!(ids, vec![MatchId::new("OC1_1"), MatchId::new("OC1_2")]);
        assert_eq!(
            transport.urls.lock().unwrap()[0],
            "https://sea.api.riotgames.com/lol/match/v5/matches/by-puuid/abc/ids?start=0&count=20"
        );
    }
}
