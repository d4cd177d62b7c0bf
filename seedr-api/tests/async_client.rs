//! HTTP behavior of `AsyncSeedrClient` against a mock Seedr server.

use seedr_api::{
    AsyncSeedrClient, ClientConfig, Endpoints, ResponseModel, SeedrError, Token, TorrentSource,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new().with_endpoints(Endpoints::single(&server.uri()))
}

fn settings_body() -> serde_json::Value {
    json!({
        "result": true,
        "settings": { "site_language": "en" },
        "account": { "username": "me", "user_id": 7, "premium": 1 },
        "country": "DE"
    })
}

async fn mount_refresh(server: &MockServer, access_token: &str, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/token.php"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_id=seedr_chrome"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": access_token, "expires_in": 3600 }))
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

// =============================================================================
// Login
// =============================================================================

mod login {
    use super::*;

    #[tokio::test]
    async fn password_grant_builds_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token.php"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=me%40example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a1",
                "refresh_token": "r1",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AsyncSeedrClient::from_password("me@example.com", "pw", config(&server))
            .await
            .unwrap();
        let token = client.token().await;
        assert_eq!(token.access_token(), "a1");
        assert_eq!(token.refresh_token(), Some("r1"));
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn bad_password_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token.php"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid username and password combination"
            })))
            .mount(&server)
            .await;

        let err = AsyncSeedrClient::from_password("me@example.com", "wrong", config(&server))
            .await
            .err()
            .expect("login must fail");
        assert!(err.is_authentication(), "{err:?}");
        assert!(err.to_string().contains("Invalid username"));
        assert!(err.payload().is_some());
    }

    #[tokio::test]
    async fn stored_refresh_token_starts_a_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token.php"))
            .and(body_string_contains("refresh_token=r0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "a2", "expires_in": 60 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = AsyncSeedrClient::from_refresh_token("r0", config(&server)).await.unwrap();
        let token = client.token().await;
        assert_eq!(token.access_token(), "a2");
        assert_eq!(token.refresh_token(), Some("r0"));
        client.close();
    }

    #[tokio::test]
    async fn device_code_flow() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/device/code"))
            .and(query_param("client_id", "seedr_xbmc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device_code": "dev-123",
                "user_code": "ABCD",
                "verification_url": "https://www.seedr.cc/devices",
                "expires_in": 1800,
                "interval": 5
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/device/authorize"))
            .and(query_param("device_code", "dev-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "a1" })))
            .expect(1)
            .mount(&server)
            .await;

        let code = AsyncSeedrClient::get_device_code(&config(&server)).await.unwrap();
        assert_eq!(code.user_code, "ABCD");
        assert_eq!(code.verification_url, "https://www.seedr.cc/devices");

        let client = AsyncSeedrClient::from_device_code(&code.device_code, config(&server))
            .await
            .unwrap();
        let token = client.token().await;
        assert_eq!(token.access_token(), "a1");
        assert_eq!(token.device_code(), Some("dev-123"));
        assert!(token.can_refresh());
    }
}

// =============================================================================
// Refresh cycle
// =============================================================================

mod refresh {
    use super::*;

    #[tokio::test]
    async fn expired_token_refreshes_before_the_call() {
        let server = MockServer::start().await;
        mount_refresh(&server, "new", Duration::ZERO).await;
        Mock::given(method("GET"))
            .and(path("/resource.php"))
            .and(query_param("func", "get_settings"))
            .and(query_param("access_token", "new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(settings_body()))
            .expect(1)
            .mount(&server)
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(None));
        let (c, s) = (Arc::clone(&calls), Arc::clone(&seen));
        let token = Token::new("old").with_refresh_token("r0").with_expires_at(1_000);
        let client = AsyncSeedrClient::new(token, config(&server))
            .unwrap()
            .on_token_refresh_async(move |t| {
                let (c, s) = (Arc::clone(&c), Arc::clone(&s));
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    *s.lock().unwrap() = Some(t);
                }
            });

        let settings = client.get_settings().await.unwrap();
        assert_eq!(settings.account.username, "me");
        assert!(settings.account.premium);
        assert_eq!(settings.raw()["country"], "DE");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let reported = seen.lock().unwrap().clone().unwrap();
        assert_eq!(reported, client.token().await);
        assert_eq!(reported.access_token(), "new");
        assert_eq!(reported.refresh_token(), Some("r0"));
    }

    #[tokio::test]
    async fn unauthorized_call_is_retried_with_new_token() {
        let server = MockServer::start().await;
        mount_refresh(&server, "new", Duration::ZERO).await;
        Mock::given(path("/resource.php"))
            .and(query_param("access_token", "old"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/resource.php"))
            .and(query_param("access_token", "new"))
            .and(query_param("func", "list_contents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "space_used": 10,
                "space_max": 100,
                "id": 0,
                "folders": [{ "id": 12, "name": "Movies", "size": "2048" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = Token::new("old").with_refresh_token("r0");
        let client = AsyncSeedrClient::new(token, config(&server)).unwrap();
        let listing = client.list_contents("0").await.unwrap();
        assert_eq!(listing.space_max, 100);
        assert_eq!(listing.folder.folders[0].name, "Movies");
        assert_eq!(listing.folder.folders[0].size, 2048);
    }

    #[tokio::test]
    async fn expired_token_error_body_counts_as_unauthorized() {
        let server = MockServer::start().await;
        mount_refresh(&server, "new", Duration::ZERO).await;
        Mock::given(path("/resource.php"))
            .and(query_param("access_token", "old"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "expired_token" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/resource.php"))
            .and(query_param("access_token", "new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
            .expect(1)
            .mount(&server)
            .await;

        let token = Token::new("old").with_refresh_token("r0");
        let client = AsyncSeedrClient::new(token, config(&server)).unwrap();
        assert!(client.add_folder("New").await.unwrap().result);
    }

    #[tokio::test]
    async fn rejected_refresh_fails_without_looping() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/token.php"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_grant" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = Token::new("old").with_refresh_token("r0");
        let client = AsyncSeedrClient::new(token, config(&server)).unwrap();
        let err = client.get_memory_bandwidth().await.unwrap_err();
        assert!(err.is_authentication(), "{err:?}");
        assert_eq!(client.token().await.access_token(), "old");
    }

    #[tokio::test]
    async fn refresh_server_outage_stays_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/token.php"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let token = Token::new("old").with_refresh_token("r0");
        let client = AsyncSeedrClient::new(token, config(&server)).unwrap();
        let err = client.get_memory_bandwidth().await.unwrap_err();
        assert!(!err.is_authentication(), "{err:?}");
        assert!(matches!(err, SeedrError::Api { status: 503, .. }), "{err:?}");
        assert_eq!(client.token().await.access_token(), "old");
    }

    #[tokio::test]
    async fn second_rejection_after_refresh_is_final() {
        let server = MockServer::start().await;
        mount_refresh(&server, "new", Duration::ZERO).await;
        Mock::given(path("/resource.php"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let token = Token::new("old").with_refresh_token("r0");
        let client = AsyncSeedrClient::new(token, config(&server)).unwrap();
        let err = client.get_memory_bandwidth().await.unwrap_err();
        assert!(err.is_authentication());
        assert!(err.to_string().contains("after refresh"));
    }

    #[tokio::test]
    async fn token_without_credentials_cannot_refresh() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = AsyncSeedrClient::new(Token::new("old"), config(&server)).unwrap();
        let err = client.get_settings().await.unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn device_code_is_the_refresh_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/device/authorize"))
            .and(query_param("client_id", "seedr_xbmc"))
            .and(query_param("device_code", "dev-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "new" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/resource.php"))
            .and(query_param("access_token", "old"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(path("/resource.php"))
            .and(query_param("access_token", "new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "devices": [
                {
                    "client_id": "seedr_xbmc",
                    "client_name": "Kodi",
                    "device_code": "dev-1",
                    "tk": "t"
                }
            ] })))
            .expect(1)
            .mount(&server)
            .await;

        let token = Token::new("old").with_device_code("dev-1");
        let client = AsyncSeedrClient::new(token, config(&server)).unwrap();
        let devices = client.get_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].client_name, "Kodi");
        assert_eq!(client.token().await.device_code(), Some("dev-1"));
    }

    #[tokio::test]
    async fn concurrent_rejections_share_one_refresh() {
        let server = MockServer::start().await;
        mount_refresh(&server, "new", Duration::from_millis(200)).await;
        Mock::given(path("/resource.php"))
            .and(query_param("access_token", "old"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(path("/resource.php"))
            .and(query_param("access_token", "new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "space_max": 5 })))
            .expect(2)
            .mount(&server)
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let token = Token::new("old").with_refresh_token("r0");
        let client = AsyncSeedrClient::new(token, config(&server))
            .unwrap()
            .on_token_refresh(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });

        let (a, b) = tokio::join!(client.get_memory_bandwidth(), client.get_memory_bandwidth());
        assert_eq!(a.unwrap().space_max, 5);
        assert_eq!(b.unwrap().space_max, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn manual_refresh_reports_result() {
        let server = MockServer::start().await;
        Mock::given(path("/token.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new",
                "refresh_token": "r1",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = Token::new("old").with_refresh_token("r0");
        let client = AsyncSeedrClient::new(token, config(&server)).unwrap();
        let result = client.refresh_token().await.unwrap();
        assert_eq!(result.access_token, "new");
        assert_eq!(result.expires_in, Some(3600));
        assert!(!format!("{result:?}").contains("new\""));
        assert_eq!(client.token().await.refresh_token(), Some("r1"));
    }

    // A blocking callback must not stall the runtime thread it was fired from.
    #[tokio::test(flavor = "current_thread")]
    async fn sync_callback_runs_off_the_event_loop() {
        let server = MockServer::start().await;
        mount_refresh(&server, "new", Duration::ZERO).await;
        Mock::given(path("/resource.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(settings_body()))
            .mount(&server)
            .await;

        let finished = Arc::new(Mutex::new(None));
        let f = Arc::clone(&finished);
        let token = Token::new("old").with_refresh_token("r0").with_expires_at(1_000);
        let client = AsyncSeedrClient::new(token, config(&server))
            .unwrap()
            .on_token_refresh(move |_| {
                std::thread::sleep(Duration::from_millis(400));
                *f.lock().unwrap() = Some(Instant::now());
            });

        let ticker = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Instant::now()
        };
        let (settings, ticked) = tokio::join!(client.get_settings(), ticker);
        settings.unwrap();

        let callback_done = finished.lock().unwrap().expect("callback ran");
        assert!(ticked < callback_done);
    }
}

// =============================================================================
// Endpoints
// =============================================================================

mod endpoints {
    use super::*;

    fn client(server: &MockServer) -> AsyncSeedrClient {
        AsyncSeedrClient::new(Token::new("tok"), config(server)).unwrap()
    }

    #[tokio::test]
    async fn vendor_error_code_is_exposed() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .and(query_param("func", "add_torrent"))
            .and(body_string_contains("torrent_magnet=magnet%3A%3Fxt%3Durn%3Abtih%3Aabc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": false,
                "code": 37,
                "type": "invalid_magnet"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .add_torrent(TorrentSource::Magnet("magnet:?xt=urn:btih:abc".into()), None)
            .await
            .unwrap_err();
        assert_eq!(err.api_code(), Some(37));
        assert_eq!(err.api_kind(), Some("invalid_magnet"));
        assert!(matches!(err, SeedrError::Api { status: 200, .. }));
    }

    #[tokio::test]
    async fn vendor_error_without_result_field_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .and(query_param("func", "add_torrent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "code": 37, "type": "invalid_magnet" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .add_torrent(TorrentSource::Magnet("magnet:?xt=urn:btih:abc".into()), None)
            .await
            .unwrap_err();
        assert_eq!(err.api_code(), Some(37));
        assert_eq!(err.api_kind(), Some("invalid_magnet"));
        assert!(matches!(err, SeedrError::Api { status: 200, .. }));
    }

    #[tokio::test]
    async fn torrent_file_is_uploaded_as_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/resource.php"))
            .and(query_param("func", "add_torrent"))
            .and(body_string_contains("name=\"torrent_file\""))
            .and(body_string_contains("filename=\"ubuntu.torrent\""))
            .and(body_string_contains("d8:announce"))
            .and(body_string_contains("name=\"folder_id\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": true,
                "user_torrent_id": 91,
                "title": "ubuntu",
                "torrent_hash": "abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ubuntu.torrent");
        std::fs::write(&file, b"d8:announce3:urle").unwrap();

        let added = client(&server)
            .add_torrent(TorrentSource::File(file), Some("12"))
            .await
            .unwrap();
        assert_eq!(added.user_torrent_id, 91);
        assert_eq!(added.title, "ubuntu");
    }

    #[tokio::test]
    async fn remote_torrent_is_downloaded_then_uploaded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/debian.torrent"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"d4:infoe".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/resource.php"))
            .and(body_string_contains("filename=\"debian.torrent\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/files/debian.torrent", server.uri());
        let added = client(&server).add_torrent(TorrentSource::Url(url), None).await.unwrap();
        assert!(added.result);
    }

    #[tokio::test]
    async fn missing_remote_torrent_is_api_error_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/gone.torrent"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/files/gone.torrent", server.uri());
        let err = client(&server)
            .add_torrent(TorrentSource::Url(url.clone()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SeedrError::Api { status: 404, .. }), "{err:?}");
        assert!(err.to_string().contains(&url));

        let uploads = server.received_requests().await.unwrap();
        assert!(uploads.iter().all(|r| r.url.path() != "/resource.php"));
    }

    #[tokio::test]
    async fn delete_sends_json_array() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .and(query_param("func", "delete"))
            .and(body_string_contains(
                "delete_arr=%5B%7B%22type%22%3A%22folder%22%2C%22id%22%3A12%7D%5D",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server).delete_folder("12").await.unwrap().result);
    }

    #[tokio::test]
    async fn archive_and_fetch() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .and(query_param("func", "create_empty_archive"))
            .and(body_string_contains("archive_arr="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": true,
                "archive_id": 3,
                "archive_url": "https://example.org/a.zip"
            })))
            .mount(&server)
            .await;
        Mock::given(path("/resource.php"))
            .and(query_param("func", "fetch_file"))
            .and(body_string_contains("folder_file_id=55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": true,
                "url": "https://example.org/f.mkv",
                "name": "f.mkv",
                "size": 1024
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let archive = client.create_archive("9").await.unwrap();
        assert_eq!(archive.archive_id, 3);
        let link = client.fetch_file("55").await.unwrap();
        assert_eq!(link.url, "https://example.org/f.mkv");
        assert_eq!(link.size, 1024);
    }

    #[tokio::test]
    async fn invalid_input_makes_no_request() {
        let server = MockServer::start().await;
        let client = client(&server);

        for err in [
            client.delete_file("abc").await.unwrap_err(),
            client.list_contents("  ").await.unwrap_err(),
            client.search_files("").await.unwrap_err(),
            client.create_archive("x1").await.unwrap_err(),
            client.add_torrent(TorrentSource::Magnet(String::new()), None).await.unwrap_err(),
        ] {
            assert!(matches!(err, SeedrError::InvalidInput(_)), "{err:?}");
        }
        let received = server.received_requests().await.unwrap();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let server = MockServer::start().await;
        let err = client(&server)
            .add_torrent(TorrentSource::File("/nonexistent/x.torrent".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SeedrError::Io(_)));
    }

    #[tokio::test]
    async fn non_json_reply_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(&server).get_settings().await.unwrap_err();
        assert!(matches!(err, SeedrError::Json(_)), "{err:?}");
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(path("/resource.php"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let err = client(&server).get_settings().await.unwrap_err();
        match err {
            SeedrError::Api { status, message, .. } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = ClientConfig::new()
            .with_endpoints(Endpoints::single(&format!("http://127.0.0.1:{port}")))
            .with_timeout(Duration::from_secs(2));
        let client = AsyncSeedrClient::new(Token::new("tok"), config).unwrap();

        let err = client.get_settings().await.unwrap_err();
        assert!(err.is_network(), "{err:?}");
    }
}
