//! Integration tests for the link resolver against a mock site.

use catalog_dl_core::resolver::ResolveStage;
use catalog_dl_core::{HttpClient, ItemKind, LinkResolver, Resolution, ResolveError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::fixtures::{chapter, chapter_page, episode, episode_page, player_page};
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};

#[tokio::test]
async fn test_episode_resolves_through_frame_in_two_hops() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/anime/folge/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(episode_page("/embed/1")))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/embed/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(player_page("/media/1.mp4", "video/mp4")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let item = episode(1, 1, &format!("{}/anime/folge/1", mock_server.uri()));
    let resolution = LinkResolver::new(ItemKind::Episode)
        .resolve(&client, &item)
        .await
        .unwrap();

    match resolution {
        Resolution::Single(media) => {
            assert_eq!(media.url, format!("{}/media/1.mp4", mock_server.uri()));
            assert_eq!(media.media_type, "video/mp4");
        }
        other => panic!("expected single media, got {other:?}"),
    }
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_episode_with_unaccepted_type_fails_without_media_fetch() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/anime/folge/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(episode_page("/embed/2")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/embed/2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(player_page("/media/2.m3u8", "application/x-mpegURL")),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/2.m3u8"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let item = episode(2, 1, &format!("{}/anime/folge/2", mock_server.uri()));
    let err = LinkResolver::new(ItemKind::Episode)
        .resolve(&client, &item)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::TypeMismatch { .. }), "{err:?}");
}

#[tokio::test]
async fn test_episode_page_error_fails_at_start() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/anime/folge/3"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let item = episode(3, 1, &format!("{}/anime/folge/3", mock_server.uri()));
    let err = LinkResolver::new(ItemKind::Episode)
        .resolve(&client, &item)
        .await
        .unwrap_err();

    match err {
        ResolveError::Fetch { stage, .. } => assert_eq!(stage, ResolveStage::Start),
        other => panic!("expected fetch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_episode_frame_error_fails_at_container() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/anime/folge/4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(episode_page("/embed/4")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/embed/4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let item = episode(4, 1, &format!("{}/anime/folge/4", mock_server.uri()));
    let err = LinkResolver::new(ItemKind::Episode)
        .resolve(&client, &item)
        .await
        .unwrap_err();

    match err {
        ResolveError::Fetch { stage, .. } => assert_eq!(stage, ResolveStage::ContainerFound),
        other => panic!("expected fetch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_chapter_resolves_inline_pages_in_one_hop() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    let body = chapter_page(&[
        ("/img/1000/1.jpg", "image/jpeg"),
        ("/img/1000/2.png", "image/png"),
        ("https://cdn.example.com/1000/3.jpg", "image/jpeg"),
    ]);
    Mock::given(method("GET"))
        .and(path("/manga/kapitel/1000"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let item = chapter(1000, 1, &format!("{}/manga/kapitel/1000", mock_server.uri()), 3);
    let resolution = LinkResolver::new(ItemKind::Chapter)
        .resolve(&client, &item)
        .await
        .unwrap();

    let Resolution::Pages(pages) = resolution else {
        panic!("expected pages");
    };
    let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            format!("{}/img/1000/1.jpg", mock_server.uri()).as_str(),
            format!("{}/img/1000/2.png", mock_server.uri()).as_str(),
            "https://cdn.example.com/1000/3.jpg",
        ]
    );
    assert_eq!(pages[1].media_type, "image/png");
}

#[tokio::test]
async fn test_chapter_without_payload_has_no_container() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/manga/kapitel/1001"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><p>bald</p></html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new();
    let item = chapter(1001, 1, &format!("{}/manga/kapitel/1001", mock_server.uri()), 12);
    let err = LinkResolver::new(ItemKind::Chapter)
        .resolve(&client, &item)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolveError::NoContainer { .. }), "{err:?}");
}
