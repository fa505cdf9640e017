//! Complete runs driven by a configuration file

use deadlink_patrol::config::{load_config, parse_config};
use deadlink_patrol::Manager;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn broken_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"<html><body><a href="/gone">Gone page</a></body></html>"#,
                    "text/html",
                ),
        )
        .mount(&server)
        .await;
    server
}

async fn healthy_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>all good</body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    server
}

fn webhook_url(server: &MockServer) -> String {
    format!(
        "{}/hook",
        server.uri().replacen("http://", "generic+http://", 1)
    )
}

#[tokio::test]
async fn test_run_notifies_webhook_and_pings_health_check() {
    let broken = broken_site().await;
    let healthy = healthy_site().await;
    let hooks = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_string_contains("Gone page"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&hooks)
        .await;
    let health = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&health)
        .await;

    let toml = format!(
        r#"
[health-check]
url = "{health}/ping"

[[notifiers]]
name = "webhook"
url = "{hook}"

[[notifiers]]
name = "log"
url = "logger://"
template = "html"

[[sites]]
url = "{broken}/"
notify = ["webhook", "log"]

[[sites]]
url = "{healthy}/"
notify = ["webhook"]
"#,
        health = health.uri(),
        hook = webhook_url(&hooks),
        broken = broken.uri(),
        healthy = healthy.uri(),
    );
    let config = parse_config(&toml).expect("Failed to parse config");
    let manager = Manager::new(&config.crawler).unwrap();

    let reports = manager.run(&config).await;

    assert_eq!(reports.len(), 2);
    let broken_root = format!("{}/", broken.uri());
    assert_eq!(reports[&broken_root].broken_links_by_page_url.len(), 1);
    assert!(reports[&format!("{}/", healthy.uri())]
        .broken_links_by_page_url
        .is_empty());
}

#[tokio::test]
async fn test_failed_delivery_skips_health_check() {
    let broken = broken_site().await;
    let hooks = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&hooks)
        .await;
    let health = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&health)
        .await;

    let toml = format!(
        r#"
[health-check]
url = "{health}/ping"

[[notifiers]]
name = "webhook"
url = "{hook}"

[[sites]]
url = "{broken}/"
notify = ["webhook"]
"#,
        health = health.uri(),
        hook = webhook_url(&hooks),
        broken = broken.uri(),
    );
    let config = parse_config(&toml).expect("Failed to parse config");
    let manager = Manager::new(&config.crawler).unwrap();

    let reports = manager.run(&config).await;
    assert_eq!(reports.len(), 1);
}

#[tokio::test]
async fn test_reports_serialize_with_stable_field_names() {
    let broken = broken_site().await;

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[[sites]]\nurl = \"{}/\"", broken.uri()).unwrap();
    let config = load_config(file.path()).expect("Failed to load config");
    let manager = Manager::new(&config.crawler).unwrap();

    let reports = manager.run(&config).await;
    let json: serde_json::Value = serde_json::to_value(&reports).unwrap();
    let report = &json[format!("{}/", broken.uri())];

    assert_eq!(report["Statistics"]["LinksCountTotal"], 1);
    let entries = report["BrokenLinksByPageURL"][format!("{}/", broken.uri())]
        .as_array()
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["LinkValue"], "/gone");
    assert_eq!(entries[0]["StatusCode"], 404);
    assert_eq!(entries[0]["TagTextValue"], "Gone page");
    assert_eq!(entries[0]["CountOnPage"], 1);
}
