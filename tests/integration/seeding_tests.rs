//! Integration tests for robots.txt handling and sitemap seeding

use reqwest::Client;
use seo_crawler::robots::RobotsCache;
use seo_crawler::sitemap::SitemapSeeder;
use seo_crawler::{CrawlConfig, Crawler, DomainFilter};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn start_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

async fn mount_text(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sitemap_declared_in_robots() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_text(
        &server,
        "/robots.txt",
        format!("User-agent: *\nAllow: /\nSitemap: {}/custom-sitemap.xml\n", base),
    )
    .await;
    mount_text(
        &server,
        "/custom-sitemap.xml",
        urlset(&[
            format!("{}/s1", base),
            format!("{}/s2/", base),
            format!("{}/", base),
            "https://other.example/x".to_string(),
        ]),
    )
    .await;

    let seeder = SitemapSeeder::new(Client::new());
    let start = start_url(&server);

    assert_eq!(
        seeder.discover_sitemap_url(&start).await.unwrap().as_str(),
        format!("{}/custom-sitemap.xml", base)
    );

    let seeds = seeder.seed(&start, DomainFilter::Same).await;
    assert_eq!(
        seeds,
        vec![format!("{}/", base), format!("{}/s1", base), format!("{}/s2", base)]
    );

    let all = seeder.seed(&start, DomainFilter::All).await;
    assert_eq!(all.len(), 4);
    assert_eq!(all[3], "https://other.example/x");
}

#[tokio::test]
async fn test_sitemap_index_is_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_text(
        &server,
        "/sitemap.xml",
        sitemap_index(&[
            format!("{}/sitemap-a.xml", base),
            format!("{}/sitemap-missing.xml", base),
            format!("{}/sitemap-b.xml", base),
        ]),
    )
    .await;
    mount_text(&server, "/sitemap-a.xml", urlset(&[format!("{}/a", base)])).await;
    mount_text(&server, "/sitemap-b.xml", urlset(&[format!("{}/b", base)])).await;

    let seeder = SitemapSeeder::new(Client::new());
    let urls = seeder
        .parse_sitemap(&format!("{}/sitemap.xml", base))
        .await
        .unwrap();

    assert_eq!(urls, vec![format!("{}/a", base), format!("{}/b", base)]);
}

#[tokio::test]
async fn test_missing_sitemap_falls_back_to_start_url() {
    let server = MockServer::start().await;

    let seeder = SitemapSeeder::new(Client::new());
    let start = start_url(&server);

    assert!(seeder
        .parse_sitemap(&format!("{}/sitemap.xml", server.uri()))
        .await
        .is_err());
    assert_eq!(
        seeder.seed(&start, DomainFilter::Same).await,
        vec![start.to_string()]
    );
}

#[tokio::test]
async fn test_crawl_seeds_orphan_pages_from_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_text(&server, "/sitemap.xml", urlset(&[format!("{}/orphan", base)])).await;
    for route in ["/", "/orphan"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><head><title>t</title></head><body></body></html>", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = CrawlConfig::new(format!("{}/", base));
    config.parse_sitemap = true;
    config.max_retries = 0;

    let results = Crawler::new(config)
        .unwrap()
        .crawl_with_shutdown(std::future::pending())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    let orphan = results
        .iter()
        .find(|page| page.url.ends_with("/orphan"))
        .unwrap();
    assert_eq!(orphan.depth, 0);
}

#[tokio::test]
async fn test_crawl_follows_redirected_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/sitemap-live.xml"))
        .mount(&server)
        .await;
    mount_text(&server, "/sitemap-live.xml", urlset(&[format!("{}/orphan", base)])).await;
    for route in ["/", "/orphan"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><head><title>t</title></head><body></body></html>", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = CrawlConfig::new(format!("{}/", base));
    config.parse_sitemap = true;
    config.max_retries = 0;

    let results = Crawler::new(config)
        .unwrap()
        .crawl_with_shutdown(std::future::pending())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().any(|page| page.url.ends_with("/orphan")));
}

#[tokio::test]
async fn test_robots_cache_fetches_once_per_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: TestBot\nDisallow: /private\n\nUser-agent: *\nDisallow: /\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = RobotsCache::new(Client::new(), "TestBot", true);
    let base = server.uri();
    let public = Url::parse(&format!("{}/public", base)).unwrap();
    let private = Url::parse(&format!("{}/private/page", base)).unwrap();

    let (a, b) = tokio::join!(cache.is_allowed(&public), cache.is_allowed(&private));
    assert!(a.unwrap());
    assert!(!b.unwrap());
    assert!(cache.is_allowed(&public).await.unwrap());
    assert_eq!(cache.cached_origins(), 1);
}

#[tokio::test]
async fn test_robots_server_error_allows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let cache = RobotsCache::new(Client::new(), "TestBot", true);
    let url = Url::parse(&format!("{}/anything", server.uri())).unwrap();

    assert!(cache.is_allowed(&url).await.unwrap());
    assert!(cache.is_allowed(&url).await.unwrap());
}

#[tokio::test]
async fn test_robots_missing_allows() {
    let server = MockServer::start().await;
    let cache = RobotsCache::new(Client::new(), "TestBot", true);
    let url = Url::parse(&format!("{}/anything", server.uri())).unwrap();

    assert!(cache.is_allowed(&url).await.unwrap());
}
