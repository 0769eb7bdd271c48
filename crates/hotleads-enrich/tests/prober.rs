//! Integration tests for `WebsiteProber` with a stub resolver and wiremock.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hotleads_enrich::{HostResolver, WebsiteProber};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Resolves only the listed hosts and counts every lookup.
#[derive(Clone)]
struct StubResolver {
    known: HashSet<String>,
    lookups: Arc<AtomicUsize>,
}

impl StubResolver {
    fn new(hosts: &[&str]) -> Self {
        Self {
            known: hosts.iter().map(|h| (*h).to_owned()).collect(),
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl HostResolver for StubResolver {
    async fn resolves(&self, host: &str) -> bool {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.known.contains(host)
    }
}

fn tlds() -> Vec<String> {
    ["com", "net", "biz", "co"].iter().map(|t| (*t).to_owned()).collect()
}

fn prober(server: &MockServer, resolver: StubResolver) -> WebsiteProber {
    WebsiteProber::new(tlds(), 2, "hotleads-test/0.1", 16, Duration::from_secs(60))
        .expect("prober construction should not fail")
        .with_resolver(resolver)
        .with_url_template(&format!("{}/{{domain}}", server.uri()))
}

#[tokio::test]
async fn resolving_and_reachable_domain_is_a_website() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/joescuts.net"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = StubResolver::new(&["joescuts.net"]);
    let lookups = Arc::clone(&resolver.lookups);
    assert!(prober(&server, resolver).has_website("Joe's Cuts").await);
    // com misses, net hits; biz and co are never tried
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unresolvable_name_is_not_a_website() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!prober(&server, StubResolver::new(&[])).has_website("Desert Fade").await);
}

#[tokio::test]
async fn error_status_moves_on_to_next_domain() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/desertfade.com"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/desertfade.biz"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let resolver = StubResolver::new(&["desertfade.com", "desertfade.biz"]);
    assert!(prober(&server, resolver).has_website("Desert Fade").await);
}

#[tokio::test]
async fn all_rejections_mean_no_website() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolver = StubResolver::new(&["desertfade.com", "desertfade.co"]);
    assert!(!prober(&server, resolver).has_website("Desert Fade").await);
}

#[tokio::test]
async fn results_are_cached_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = StubResolver::new(&["sonoranbrews.com"]);
    let lookups = Arc::clone(&resolver.lookups);
    let prober = prober(&server, resolver);
    assert!(prober.has_website("Sonoran Brews").await);
    assert!(prober.has_website("Sonoran Brews").await);
    assert_eq!(lookups.load(Ordering::SeqCst), 1);
}
