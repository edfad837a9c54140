//! Location resolver: cascade invalidation, stale-response guard and the
//! session option cache.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;

use common::*;
use repairhub_client::LocationResolver;
use repairhub_core::location::CommitResult;
use repairhub_core::option_cache::{cache_key, MemorySessionStore, OptionCache, SessionStore};

fn resolver(api: &Arc<FakeApi>, store: &Arc<dyn SessionStore>, route: &str) -> LocationResolver {
    LocationResolver::new(api.clone(), OptionCache::for_route(Arc::clone(store), route))
}

fn ids(options: &[repairhub_core::location::RegionOption]) -> Vec<&str> {
    options.iter().map(|o| o.id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Invalidation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_country_clears_state_and_cities() {
    let api = FakeApi::new();
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);
    r.mount().await;
    r.change_country("PK").await;
    r.change_state("PB").await;
    assert_eq!(ids(r.cascade().cities()), ["LHR", "RWP"]);

    let ticket = r.select_country("IN");
    assert!(ticket.is_some());
    assert_eq!(r.cascade().selected_country(), Some("IN"));
    assert_eq!(r.cascade().selected_state(), None);
    assert!(r.cascade().states().is_empty());
    assert!(r.cascade().cities().is_empty());
}

#[tokio::test]
async fn new_state_clears_cities() {
    let api = FakeApi::new();
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);
    r.mount().await;
    r.change_country("PK").await;
    r.change_state("PB").await;

    let ticket = r.select_state("SD");
    assert!(ticket.is_some());
    assert_eq!(r.cascade().selected_state(), Some("SD"));
    assert!(r.cascade().cities().is_empty());
    assert_eq!(ids(r.cascade().states()), ["PB", "SD"]);

    let outcome = r.fetch(ticket.unwrap()).await;
    assert_matches!(r.apply(outcome), CommitResult::Applied(1));
    assert_eq!(ids(r.cascade().cities()), ["KHI"]);
}

#[tokio::test]
async fn clearing_country_issues_no_lookup() {
    let api = FakeApi::new();
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);
    r.mount().await;
    r.change_country("PK").await;
    let before = api.location_calls();

    assert!(r.change_country("").await.is_none());
    assert_eq!(r.cascade().selected_country(), None);
    assert!(r.cascade().states().is_empty());
    assert_eq!(api.location_calls(), before);
}

// ---------------------------------------------------------------------------
// Stale responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn out_of_order_city_responses() {
    let api = FakeApi::new();
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);
    r.mount().await;
    r.change_country("PK").await;

    let punjab = r.select_state("PB").unwrap();
    let sindh = r.select_state("SD").unwrap();
    let punjab = r.fetch(punjab);
    let sindh = r.fetch(sindh);

    assert_matches!(r.apply(sindh.await), CommitResult::Applied(1));
    assert_matches!(r.apply(punjab.await), CommitResult::Stale);
    assert_eq!(ids(r.cascade().cities()), ["KHI"]);
}

#[tokio::test]
async fn city_response_for_abandoned_country_is_stale() {
    let api = FakeApi::new();
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);
    r.mount().await;
    r.change_country("PK").await;

    // A city lookup is in flight when the user switches country.
    let cities = r.select_state("PB").unwrap();
    let cities = r.fetch(cities);
    r.change_country("IN").await;

    assert_matches!(r.apply(cities.await), CommitResult::Stale);
    assert!(r.cascade().cities().is_empty());
    assert_eq!(ids(r.cascade().states()), ["MH", "DL"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_lookup_sets_banner_and_keeps_selection() {
    let api = FakeApi::new();
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);
    r.mount().await;
    api.fail("states");

    assert_matches!(r.change_country("PK").await, Some(CommitResult::Failed(_)));
    assert_eq!(r.cascade().selected_country(), Some("PK"));
    assert!(r.cascade().states().is_empty());
    assert_eq!(r.banner(), Some("Could not load states. Please try again."));

    // Retrying after the backend recovers fills the list in.
    api.recover("states");
    r.dismiss_banner();
    r.load_missing().await;
    assert_eq!(ids(r.cascade().states()), ["PB", "SD"]);
    assert!(r.banner().is_none());
}

#[tokio::test]
async fn country_failure_on_mount() {
    let api = FakeApi::new();
    api.fail("countries");
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);

    r.mount().await;
    assert!(r.cascade().countries().is_empty());
    assert!(r.banner().is_some());
}

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remount_on_same_route_rehydrates_without_network() {
    let api = FakeApi::new();
    let store = new_store();

    let mut first = resolver(&api, &store, ROUTE);
    first.mount().await;
    first.change_country("PK").await;
    let calls = api.location_calls();

    let mut second = resolver(&api, &store, ROUTE);
    second.mount().await;

    assert_eq!(api.location_calls(), calls);
    assert_eq!(second.cascade().selected_country(), Some("PK"));
    assert_eq!(second.cascade().states(), first.cascade().states());
    assert_eq!(second.cascade().countries(), first.cascade().countries());
}

#[tokio::test]
async fn trailing_slash_shares_the_cache_record() {
    let api = FakeApi::new();
    let store = new_store();

    let mut first = resolver(&api, &store, ROUTE);
    first.mount().await;

    let mut second = resolver(&api, &store, &format!("{ROUTE}/"));
    assert!(second.rehydrate());
    assert_eq!(second.cascade().countries().len(), 2);
}

#[tokio::test]
async fn other_routes_do_not_share_options() {
    let api = FakeApi::new();
    let store = new_store();

    let mut first = resolver(&api, &store, ROUTE);
    first.mount().await;
    first.change_country("PK").await;

    let mut other = resolver(&api, &store, "/technician/profile");
    assert!(!other.rehydrate());
    other.mount().await;
    assert_eq!(other.cascade().selected_country(), None);
    assert!(other.cascade().states().is_empty());
}

#[tokio::test]
async fn undecodable_cache_record_is_dropped() {
    let api = FakeApi::new();
    let memory = MemorySessionStore::new();
    memory.set(&cache_key(ROUTE), "{not json".into());
    let store: Arc<dyn SessionStore> = Arc::new(memory.clone());

    let mut r = resolver(&api, &store, ROUTE);
    assert!(!r.rehydrate());
    assert!(memory.get(&cache_key(ROUTE)).is_none());

    r.mount().await;
    assert_eq!(r.cascade().countries().len(), 2);
    assert!(memory.get(&cache_key(ROUTE)).is_some());
}

#[tokio::test]
async fn stale_failure_is_ignored() {
    let api = FakeApi::new();
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);
    r.mount().await;

    let india = r.select_country("IN").unwrap();
    api.fail("states");
    let india = r.fetch(india).await;
    assert!(india.result.is_err());
    api.recover("states");

    r.change_country("PK").await;
    assert_matches!(r.apply(india), CommitResult::Stale);
    assert!(r.banner().is_none());
    assert_eq!(r.cascade().selected_country(), Some("PK"));
    assert_eq!(ids(r.cascade().states()), ["PB", "SD"]);
}

#[tokio::test]
async fn stale_response_is_not_persisted() {
    let api = FakeApi::new();
    let store = new_store();
    let mut r = resolver(&api, &store, ROUTE);
    r.mount().await;

    let india = r.select_country("IN").unwrap();
    let india = r.fetch(india);
    r.change_country("PK").await;
    assert_matches!(r.apply(india.await), CommitResult::Stale);

    let mut reloaded = resolver(&api, &store, ROUTE);
    assert!(reloaded.rehydrate());
    assert_eq!(reloaded.cascade().selected_country(), Some("PK"));
    assert_eq!(ids(reloaded.cascade().states()), ["PB", "SD"]);
}
