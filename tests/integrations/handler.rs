//! End-to-end tests: host notification in, repository dispatch out.

use content_dispatch::app::App;
use content_dispatch::core::Notification;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::github_mock;
use helpers::{config_for, records, records_from};

#[tokio::test]
async fn test_publish_and_unpublish_notifications_are_labelled() {
    let server = github_mock::accepting_server().await;
    let app = App::builder(config_for(&server.uri())).build().await.unwrap();

    app.handler().handle(Notification::ContentPublished(records(2)));
    app.handler()
        .handle(Notification::ContentUnpublished(records_from(50, 1)));
    let report = app.shutdown().await;
    assert_eq!(report.abandoned, 0);

    let mut seen: Vec<(i64, String)> = github_mock::received(&server)
        .await
        .iter()
        .map(|r| {
            let body = github_mock::body(r);
            (
                github_mock::payload_id(r),
                body["event_type"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    seen.sort();

    assert_eq!(
        seen,
        vec![
            (1, "content_published".to_string()),
            (2, "content_published".to_string()),
            (50, "content_unpublished".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_handle_returns_before_the_response_arrives() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(wiremock::ResponseTemplate::new(204).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    let app = App::builder(config_for(&server.uri())).build().await.unwrap();

    let started = std::time::Instant::now();
    app.handler().handle(Notification::ContentPublished(records(3)));
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(app.handler().dispatcher().tasks().in_flight(), 3);

    let report = app.shutdown_within(Duration::from_secs(5)).await;
    assert_eq!(report.completed, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reloaded_configuration_applies_to_next_notification() {
    let server = github_mock::accepting_server().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content-dispatch.toml");
    let write_config = |token: &str| {
        std::fs::write(
            &path,
            format!(
                "[github]\nowner = \"acme\"\nrepo = \"site\"\ntoken = \"{token}\"\napi_base_url = \"{}\"\n[dispatch]\nwatch_config = true\n",
                server.uri()
            ),
        )
        .unwrap();
    };
    write_config("");

    let (reload_tx, mut reload_rx) = mpsc::channel(8);
    let config = content_dispatch::config::Config::load_from_path(&path).unwrap();
    let app = App::builder(config)
        .config_file(path.clone(), |p| {
            content_dispatch::config::Config::load_from_path(p)
        })
        .reload_notifier(reload_tx)
        .build()
        .await
        .unwrap();

    // Blank token: nothing is sent.
    app.handler().handle(Notification::ContentPublished(records(1)));

    tokio::time::sleep(Duration::from_millis(100)).await;
    write_config("fresh-token");
    timeout(Duration::from_secs(5), async {
        while reload_rx.recv().await.is_some() {
            if app.settings().load().github.token == "fresh-token" {
                break;
            }
        }
    })
    .await
    .expect("configuration was not reloaded");

    app.handler().handle(Notification::ContentPublished(records_from(2, 1)));
    app.shutdown_within(Duration::from_secs(5)).await;

    let requests = github_mock::received(&server).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(github_mock::payload_id(&requests[0]), 2);
    assert_eq!(
        github_mock::header(&requests[0], "authorization"),
        Some("token fresh-token")
    );
}
