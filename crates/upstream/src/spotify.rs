//! HTTP client for the Spotify Web API.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use fetcher::permanent;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::UpstreamError;
use crate::traits::MusicApi;
use crate::types::{Album, ArtistRef, SeedTrack, Track};

/// The artists endpoint accepts at most this many ids per request
const ARTIST_BATCH_SIZE: usize = 50;
const MAX_SEARCH_LIMIT: usize = 50;

/// Connection settings for [`SpotifyClient`]
#[derive(Clone)]
pub struct SpotifyConfig {
    pub base_url: String,
    /// Market used for top-track lookups
    pub market: String,
    /// Bearer token; obtaining and refreshing it happens elsewhere
    pub access_token: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1/".to_string(),
            market: "US".to_string(),
            access_token: String::new(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("base_url", &self.base_url)
            .field("market", &self.market)
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

// Response shapes, reduced to the fields we read

#[derive(Debug, Deserialize)]
struct ApiArtistRef {
    id: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    id: String,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    id: String,
    name: String,
    artists: Vec<ApiArtistRef>,
    album: Album,
    preview_url: Option<String>,
    #[serde(default)]
    external_urls: ExternalUrls,
    #[serde(default)]
    explicit: bool,
}

impl From<ApiTrack> for Track {
    fn from(track: ApiTrack) -> Self {
        Track {
            id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album: track.album,
            preview_url: track.preview_url,
            url: track.external_urls.spotify,
            explicit: track.explicit,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtistsResponse {
    /// Unknown ids come back as `null`
    artists: Vec<Option<ApiArtist>>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    artists: Page<ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct TrackSearchResponse {
    tracks: Page<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct TopTracksResponse {
    tracks: Vec<ApiTrack>,
}

/// Spotify Web API client authenticated with a bearer token.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    base_url: Url,
    market: String,
    access_token: String,
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Result<Self, UpstreamError> {
        if config.access_token.trim().is_empty() {
            return Err(UpstreamError::Config("access token is empty".to_string()));
        }

        let base_url = Url::parse(&config.base_url).map_err(|err| {
            UpstreamError::Config(format!("invalid base URL '{}': {}", config.base_url, err))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::Config(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|err| UpstreamError::Config(format!("failed to build HTTP client: {}", err)))?;

        info!("Spotify client configured for {} (market {})", base_url, config.market);
        Ok(Self {
            client,
            base_url,
            market: config.market,
            access_token: config.access_token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Config(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T> {
        let endpoint = segments.first().copied().unwrap_or_default().to_string();
        let url = self.endpoint_url(segments).map_err(permanent)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(UpstreamError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            }));
        }

        let decoded = response
            .json::<T>()
            .await
            .map_err(|source| UpstreamError::Decode { endpoint, source })?;
        Ok(decoded)
    }
}

impl SpotifyClient {
    /// Genre tags of every artist credited on `tracks`, keyed by artist id.
    ///
    /// Artists are looked up once each, in batches.
    async fn artist_genres<'a>(
        &self,
        tracks: impl IntoIterator<Item = &'a ApiTrack>,
    ) -> Result<HashMap<String, Vec<String>>> {
        let mut seen = HashSet::new();
        let artist_ids: Vec<&str> = tracks
            .into_iter()
            .flat_map(|track| track.artists.iter())
            .filter_map(|artist| artist.id.as_deref())
            .filter(|id| seen.insert(*id))
            .collect();

        let mut genres = HashMap::with_capacity(artist_ids.len());
        for batch in artist_ids.chunks(ARTIST_BATCH_SIZE) {
            let ids = batch.join(",");
            let response: ArtistsResponse = self.get_json(&["artists"], &[("ids", ids.as_str())]).await?;
            for artist in response.artists.into_iter().flatten() {
                debug!("Artist {} carries {} genre tags", artist.id, artist.genres.len());
                genres.insert(artist.id, artist.genres);
            }
        }
        Ok(genres)
    }
}

/// Seed view of a track: the union of its artists' tags, in credit order
fn seed_track(track: ApiTrack, artist_genres: &HashMap<String, Vec<String>>) -> SeedTrack {
    let mut seen = HashSet::new();
    let genres: Vec<String> = track
        .artists
        .iter()
        .filter_map(|artist| artist.id.as_ref())
        .filter_map(|id| artist_genres.get(id))
        .flatten()
        .filter(|genre| seen.insert(*genre))
        .cloned()
        .collect();

    let cover_art = track.album.images.first().map(|image| image.url.clone());
    let artists = track
        .artists
        .into_iter()
        .map(|artist| ArtistRef {
            id: artist.id.unwrap_or_default(),
            name: artist.name,
        })
        .collect();

    SeedTrack {
        id: track.id,
        name: track.name,
        artists,
        genres,
        cover_art,
    }
}

/// Attach the permanent marker to errors retrying cannot fix
fn classify(err: UpstreamError) -> anyhow::Error {
    if err.is_retryable() {
        err.into()
    } else {
        permanent(err)
    }
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("base_url", &self.base_url.as_str())
            .field("market", &self.market)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MusicApi for SpotifyClient {
    fn name(&self) -> &str {
        "spotify"
    }

    async fn fetch_seed_track(&self, track_id: &str) -> Result<SeedTrack> {
        let track: ApiTrack = self.get_json(&["tracks", track_id.trim()], &[]).await?;
        let artist_genres = self.artist_genres([&track]).await?;
        Ok(seed_track(track, &artist_genres))
    }

    async fn find_artist_track(&self, artist: &str) -> Result<Option<Track>> {
        let search: ArtistSearchResponse = self
            .get_json(&["search"], &[("q", artist), ("type", "artist"), ("limit", "1")])
            .await?;

        let Some(found) = search.artists.items.into_iter().next() else {
            debug!("No artist found for '{}'", artist);
            return Ok(None);
        };

        let top: TopTracksResponse = self
            .get_json(
                &["artists", found.id.as_str(), "top-tracks"],
                &[("market", self.market.as_str())],
            )
            .await?;

        Ok(top.tracks.into_iter().next().map(Track::from))
    }

    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<SeedTrack>> {
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        let search: TrackSearchResponse = self
            .get_json(&["search"], &[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .await?;

        let artist_genres = self.artist_genres(&search.tracks.items).await?;
        let hits = search.tracks.items.len();
        let seeds: Vec<SeedTrack> = search
            .tracks
            .items
            .into_iter()
            .map(|track| seed_track(track, &artist_genres))
            .filter(|seed| !seed.genres.is_empty())
            .collect();

        debug!(
            "Search '{}' matched {} tracks, {} with genre tags",
            query,
            hits,
            seeds.len()
        );
        Ok(seeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> SpotifyClient {
        SpotifyClient::new(SpotifyConfig {
            base_url: base_url.to_string(),
            access_token: "token".to_string(),
            ..SpotifyConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_url_appends_segments() {
        let api = client("https://api.spotify.com/v1/");
        let url = api.endpoint_url(&["artists", "abc", "top-tracks"]).unwrap();
        assert_eq!(url.as_str(), "https://api.spotify.com/v1/artists/abc/top-tracks");

        let bare = client("http://127.0.0.1:8080");
        let url = bare.endpoint_url(&["tracks", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/tracks/a%2Fb%20c");
    }

    #[test]
    fn test_config_requires_token() {
        let result = SpotifyClient::new(SpotifyConfig::default());
        assert!(matches!(result, Err(UpstreamError::Config(_))));

        let result = SpotifyClient::new(SpotifyConfig {
            base_url: "not a url".to_string(),
            access_token: "token".to_string(),
            ..SpotifyConfig::default()
        });
        assert!(matches!(result, Err(UpstreamError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = SpotifyConfig {
            access_token: "secret".to_string(),
            ..SpotifyConfig::default()
        };
        assert!(!format!("{:?}", config).contains("secret"));
        assert!(!format!("{:?}", client("https://api.spotify.com/v1/")).contains("token"));
    }

    #[test]
    fn test_classify_marks_client_errors_permanent() {
        let not_found = classify(UpstreamError::Status {
            endpoint: "tracks".into(),
            status: 404,
            body: String::new(),
        });
        assert!(fetcher::is_permanent(&not_found));

        let unavailable = classify(UpstreamError::Status {
            endpoint: "tracks".into(),
            status: 503,
            body: String::new(),
        });
        assert!(!fetcher::is_permanent(&unavailable));
    }
}
