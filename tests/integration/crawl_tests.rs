//! Site checks against mock websites

use deadlink_patrol::config::{CrawlerOptions, SiteTarget};
use deadlink_patrol::crawler::build_http_client;
use deadlink_patrol::manager::check_and_report;
use deadlink_patrol::report::SiteReport;
use regex::Regex;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(format!("<html><body>{}</body></html>", body)))
        .mount(server)
        .await;
}

fn site_for(server: &MockServer) -> SiteTarget {
    SiteTarget::new(Url::parse(&format!("{}/", server.uri())).expect("Failed to parse base URL"))
}

async fn check(site: &SiteTarget) -> SiteReport {
    let options = CrawlerOptions::default();
    let client = build_http_client(&options).expect("Failed to build client");
    check_and_report(&client, site, &options).await
}

#[tokio::test]
async fn test_broken_image_counted_per_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<img src="/missing.png" alt="Gone">
           <img src="/missing.png" alt="Gone">
           <a href="/about">About</a>"#,
    )
    .await;
    mount_page(&server, "/about", r#"<img src="/missing.png" alt="Gone">"#).await;

    let site = site_for(&server);
    let site_report = check(&site).await;
    let report = &site_report.report;
    let root = format!("{}/", server.uri());
    let about = format!("{}/about", server.uri());

    assert_eq!(site_report.site_url, root);
    assert_eq!(report.statistics.links_count_total, 4);
    assert_eq!(report.statistics.links_count_by_page_url[&root], 3);
    assert_eq!(report.statistics.links_count_by_page_url[&about], 1);

    let on_root = &report.broken_links_by_page_url[&root];
    assert_eq!(on_root.len(), 1);
    assert_eq!(on_root[0].link_value, "/missing.png");
    assert_eq!(on_root[0].absolute_url, format!("{}/missing.png", server.uri()));
    assert_eq!(on_root[0].tag, "img");
    assert_eq!(on_root[0].attribute, "src");
    assert!(on_root[0].is_tag_text_type_attribute);
    assert_eq!(on_root[0].tag_text_key, "alt");
    assert_eq!(on_root[0].tag_text_value, "Gone");
    assert_eq!(on_root[0].status_code, 404);
    assert_eq!(on_root[0].status_description, "Not Found");
    assert_eq!(on_root[0].count_on_page, 2);

    let on_about = &report.broken_links_by_page_url[&about];
    assert_eq!(on_about.len(), 1);
    assert_eq!(on_about[0].count_on_page, 1);
}

#[tokio::test]
async fn test_healthy_site_has_no_broken_links() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r##"<a href="/docs">Docs</a>
            <a href="#top">Top</a>
            <a href="mailto:team@example.com">Mail</a>
            <a href="tel:+3212345678">Call</a>
            <a href="javascript:void(0)">Nothing</a>
            <link rel="preconnect" href="https://fonts.invalid">
            <link rel="stylesheet" href="/style.css">"##,
    )
    .await;
    mount_page(&server, "/docs", r#"<a href="/">Home</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/css"))
        .expect(1)
        .mount(&server)
        .await;

    let site_report = check(&site_for(&server)).await;

    assert!(!site_report.has_broken_links());
    // docs + stylesheet on the root, home link on docs
    assert_eq!(site_report.report.statistics.links_count_total, 3);
}

#[tokio::test]
async fn test_ignored_links_are_recorded_but_not_visited() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private/area">Private</a><a href="/go">Go</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/private/other"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/area"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut site = site_for(&server);
    site.ignored_links = vec![Regex::new("/private/").unwrap()];
    let site_report = check(&site).await;

    assert_eq!(site_report.report.statistics.links_count_total, 2);
    assert!(!site_report.has_broken_links());
}

#[tokio::test]
async fn test_redirect_to_visited_page_is_not_broken() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/old">Old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/"))
        .mount(&server)
        .await;

    let site_report = check(&site_for(&server)).await;

    assert_eq!(site_report.report.statistics.links_count_total, 1);
    assert!(!site_report.has_broken_links());
}

#[tokio::test]
async fn test_external_links_checked_but_not_crawled() {
    let external = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&external)
        .await;
    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(html(r#"<a href="/deeper">Deeper</a>"#.to_string()))
        .mount(&external)
        .await;
    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&external)
        .await;

    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="{0}/down">Down</a><a href="{0}/up">Up</a>"#,
            external.uri()
        ),
    )
    .await;

    let site_report = check(&site_for(&server)).await;
    let root = format!("{}/", server.uri());

    assert_eq!(site_report.report.statistics.links_count_total, 2);
    let broken = &site_report.report.broken_links_by_page_url[&root];
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].absolute_url, format!("{}/down", external.uri()));
    assert_eq!(broken[0].status_code, 503);
    assert!(broken[0].is_tag_text_type_content);
    assert_eq!(broken[0].tag_text_value, "Down");
}

#[tokio::test]
async fn test_srcset_candidates_checked() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<picture><source srcset="/small.webp 480w, /large.webp 1080w"></picture>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/small.webp"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/webp"))
        .mount(&server)
        .await;

    let site_report = check(&site_for(&server)).await;
    let root = format!("{}/", server.uri());

    assert_eq!(site_report.report.statistics.links_count_total, 2);
    let broken = &site_report.report.broken_links_by_page_url[&root];
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].link_value, "/large.webp");
    assert_eq!(broken[0].tag, "source");
    assert!(broken[0].is_tag_text_type_none);
}

#[tokio::test]
async fn test_unreachable_root_reported_as_broken() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let site_report = check(&site_for(&server)).await;
    let root = format!("{}/", server.uri());

    assert_eq!(site_report.report.statistics.links_count_total, 1);
    let broken = &site_report.report.broken_links_by_page_url[&root];
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].absolute_url, root);
    assert_eq!(broken[0].status_code, 0);
    assert!(broken[0]
        .status_description
        .starts_with("Failed to run checker: "));
}
