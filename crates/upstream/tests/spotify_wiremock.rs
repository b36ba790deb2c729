use fetcher::{is_permanent, RetryPolicy, RetryingFetcher};
use serde_json::json;
use std::time::Duration;
use upstream::{MusicApi, SpotifyClient, SpotifyConfig, UpstreamError};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer) -> SpotifyClient {
    SpotifyClient::new(SpotifyConfig {
        base_url: server.uri(),
        access_token: "test-token".to_string(),
        timeout: Duration::from_secs(2),
        ..SpotifyConfig::default()
    })
    .unwrap()
}

fn track_json(id: &str, name: &str, artists: &[(&str, &str)]) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "artists": artists
            .iter()
            .map(|(id, name)| json!({ "id": id, "name": name }))
            .collect::<Vec<_>>(),
        "album": {
            "name": format!("{} (album)", name),
            "images": [
                { "url": format!("https://img.example/{}-640.jpg", id), "width": 640, "height": 640 },
                { "url": format!("https://img.example/{}-64.jpg", id), "width": 64, "height": 64 }
            ]
        },
        "preview_url": null,
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", id) },
        "explicit": false
    })
}

#[tokio::test]
async fn test_fetch_seed_track_merges_artist_genres() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/seed1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_json(
            "seed1",
            "Under Pressure",
            &[("a1", "Queen"), ("a2", "David Bowie")],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/artists"))
        .and(query_param("ids", "a1,a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": [
                { "id": "a1", "name": "Queen", "genres": ["classic rock", "glam rock", "rock"] },
                { "id": "a2", "name": "David Bowie", "genres": ["art rock", "glam rock"] }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let seed = client.fetch_seed_track("seed1").await.unwrap();

    assert_eq!(seed.name, "Under Pressure");
    assert_eq!(
        seed.genres,
        vec!["classic rock", "glam rock", "rock", "art rock"]
    );
    assert_eq!(seed.artist_names().collect::<Vec<_>>(), vec!["Queen", "David Bowie"]);
    assert_eq!(
        seed.cover_art.as_deref(),
        Some("https://img.example/seed1-640.jpg")
    );
}

#[tokio::test]
async fn test_find_artist_track_returns_first_top_track() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Portishead"))
        .and(query_param("type", "artist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": { "items": [{ "id": "p1", "name": "Portishead", "genres": ["trip hop"] }] }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/artists/p1/top-tracks"))
        .and(query_param("market", "US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": [
                track_json("t1", "Glory Box", &[("p1", "Portishead")]),
                track_json("t2", "Roads", &[("p1", "Portishead")])
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let track = client.find_artist_track("Portishead").await.unwrap().unwrap();

    assert_eq!(track.name, "Glory Box");
    assert_eq!(track.artist_line(), "Portishead");
    assert_eq!(track.url.as_deref(), Some("https://open.spotify.com/track/t1"));
    assert_eq!(track.cover_art(), Some("https://img.example/t1-640.jpg"));
}

#[tokio::test]
async fn test_find_artist_track_unknown_artist() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": { "items": [] }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/artists/p1/top-tracks"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert!(client.find_artist_track("Nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_search_tracks_clamps_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("type", "track"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [
                track_json("t1", "Teardrop", &[("m1", "Massive Attack")]),
                track_json("t2", "Angel", &[("m1", "Massive Attack")])
            ] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/artists"))
        .and(query_param("ids", "m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": [{ "id": "m1", "name": "Massive Attack", "genres": ["trip hop"] }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let tracks = client.search_tracks("massive attack", 500).await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[1].name, "Angel");
    assert_eq!(tracks[1].genres, vec!["trip hop"]);
}

#[tokio::test]
async fn test_search_tracks_drops_untagged_hits() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [
                track_json("t1", "Glory Box", &[("p1", "Portishead")]),
                track_json("t2", "Demo Take", &[("u1", "Unknown Bedroom Act")]),
                track_json("t3", "Karmacoma", &[("m1", "Massive Attack"), ("t9", "Tricky")])
            ] }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/artists"))
        .and(query_param("ids", "p1,u1,m1,t9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": [
                { "id": "p1", "name": "Portishead", "genres": ["trip hop", "bristol sound"] },
                { "id": "u1", "name": "Unknown Bedroom Act", "genres": [] },
                { "id": "m1", "name": "Massive Attack", "genres": ["trip hop"] },
                { "id": "t9", "name": "Tricky", "genres": ["trip hop", "electronica"] }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let tracks = client.search_tracks("bristol", 10).await.unwrap();

    let names: Vec<_> = tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Glory Box", "Karmacoma"]);
    assert_eq!(tracks[0].genres, vec!["trip hop", "bristol sound"]);
    assert_eq!(tracks[1].genres, vec!["trip hop", "electronica"]);
    assert_eq!(tracks[1].cover_art.as_deref(), Some("https://img.example/t3-640.jpg"));
}

#[tokio::test]
async fn test_client_errors_are_permanent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such track"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.fetch_seed_track("missing").await.unwrap_err();

    assert!(is_permanent(&err));
    match err.downcast_ref::<UpstreamError>() {
        Some(UpstreamError::Status { status, body, .. }) => {
            assert_eq!(*status, 404);
            assert_eq!(body, "no such track");
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_are_retried_by_fetcher() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [track_json("t1", "Unfinished Sympathy", &[("m1", "Massive Attack")])] }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/artists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": [{ "id": "m1", "name": "Massive Attack", "genres": ["trip hop"] }]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let fetcher = RetryingFetcher::new(RetryPolicy::new(3, Duration::from_millis(10), 2.0));

    let tracks = fetcher
        .run("search_tracks", || client.search_tracks("massive attack", 5))
        .await
        .unwrap();
    assert_eq!(tracks.len(), 1);
}

#[tokio::test]
async fn test_permanent_errors_skip_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let fetcher = RetryingFetcher::new(RetryPolicy::new(3, Duration::from_millis(10), 2.0));

    let err = fetcher
        .run("search_tracks", || client.search_tracks("anything", 5))
        .await
        .unwrap_err();
    assert_eq!(err.attempts, 1);
}
