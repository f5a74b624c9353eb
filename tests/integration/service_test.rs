// End-to-end tests for the server directory service
//
// The API is faked and the clock is manual, so every expiry boundary is exact.

use serde_json::json;
use std::sync::Arc;
use webclient::api::FetchError;
use webclient::clock::ManualClock;
use webclient::config::Config;
use webclient::{ServerDirectoryService, WebclientError};

use super::test_harness::{listing_body, FakeDirectoryApi};

const T0: i64 = 1_700_000_000;

fn service_with(api: &Arc<FakeDirectoryApi>, clock: &ManualClock, config: &Config) -> ServerDirectoryService {
    ServerDirectoryService::with_api(api.clone(), Arc::new(clock.clone()), config)
}

#[tokio::test]
async fn test_listing_is_normalised_and_counted() {
    let api = FakeDirectoryApi::new();
    api.set_listing(json!({
        "servers": [
            {"info": {"openttd_version": "13.0.0", "clients_on": 5, "start_date": 0, "game_date": 0}}
        ],
        "expire": T0 + 60
    }));
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    let listing = service.list_servers(None).await.unwrap();

    assert_eq!(listing.servers.len(), 1);
    let info = listing.servers[0].get("info").unwrap();
    assert_eq!(info["start_date"], json!("0000-01-01"));
    assert_eq!(info["game_date"], json!("0000-01-01"));
    assert_eq!(listing.clients, 5);
    assert_eq!(listing.servers_ipv4, 0);
    assert_eq!(listing.servers_ipv6, 0);
    assert_eq!(listing.expire, "2023-11-14 22:14:21 UTC");
}

#[tokio::test]
async fn test_filter_keeps_matching_versions() {
    let api = FakeDirectoryApi::new();
    api.set_listing(listing_body(&[("12.2.0", 1), ("13.0.0", 2)], T0 + 60));
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    let listing = service.list_servers(Some("13")).await.unwrap();
    assert_eq!(listing.servers.len(), 1);
    assert_eq!(listing.servers[0].openttd_version(), "13.0.0");
    assert_eq!(listing.clients, 2);
    assert_eq!(listing.servers_ipv4, 1);
    assert_eq!(listing.filter.as_deref(), Some("13"));

    let listing = service.list_servers(Some("all")).await.unwrap();
    assert_eq!(listing.servers.len(), 2);
    assert_eq!(listing.clients, 3);

    // Filtering reuses the cached listing.
    assert_eq!(api.listing_calls(), 1);
}

#[tokio::test]
async fn test_listing_is_sorted_newest_and_busiest_first() {
    let api = FakeDirectoryApi::new();
    api.set_listing(listing_body(
        &[
            ("garbage", 100),
            ("12.2.0", 7),
            ("jgrpp-0.41.1", 40),
            ("13.0.0", 1),
            ("13.0.0", 9),
            ("13.1.0-RC1", 0),
        ],
        T0 + 60,
    ));
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    let listing = service.list_servers(None).await.unwrap();
    let order: Vec<(String, u64)> = listing
        .servers
        .iter()
        .map(|s| (s.openttd_version().to_string(), s.clients_on()))
        .collect();

    assert_eq!(
        order,
        vec![
            ("13.0.0".to_string(), 9),
            ("13.0.0".to_string(), 1),
            ("12.2.0".to_string(), 7),
            ("13.1.0-RC1".to_string(), 0),
            ("jgrpp-0.41.1".to_string(), 40),
            ("garbage".to_string(), 100),
        ]
    );
}

#[tokio::test]
async fn test_simple_ranking_changes_order() {
    let api = FakeDirectoryApi::new();
    api.set_listing(listing_body(&[("13.0.0", 1), ("13.1.0-RC1", 0)], T0 + 60));
    let clock = ManualClock::new(T0);
    let config = Config::from_yaml_with_env("listing:\n  ranking: simple\n").unwrap();
    let service = service_with(&api, &clock, &config);

    let listing = service.list_servers(None).await.unwrap();
    assert_eq!(listing.servers[0].openttd_version(), "13.1.0-RC1");
}

#[tokio::test]
async fn test_listing_served_from_cache_until_upstream_expiry() {
    let api = FakeDirectoryApi::new();
    api.set_listing(listing_body(&[("13.0.0", 1)], T0 + 60));
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    service.list_servers(None).await.unwrap();
    api.set_listing(listing_body(&[("14.0.0", 1)], T0 + 120));

    // Stale strictly after expire + 1s drift allowance.
    clock.set(T0 + 61);
    let listing = service.list_servers(None).await.unwrap();
    assert_eq!(listing.servers[0].openttd_version(), "13.0.0");
    assert_eq!(api.listing_calls(), 1);

    clock.set(T0 + 62);
    let listing = service.list_servers(None).await.unwrap();
    assert_eq!(listing.servers[0].openttd_version(), "14.0.0");
    assert_eq!(api.listing_calls(), 2);

    let listing = service.list_servers(None).await.unwrap();
    assert_eq!(listing.servers[0].openttd_version(), "14.0.0");
    assert_eq!(api.listing_calls(), 2);

    let stats = service.listing_cache_stats();
    assert_eq!(stats.refreshes, 2);
    assert_eq!(stats.hits, 2);
}

#[tokio::test]
async fn test_fixed_ttl_ignores_upstream_expiry() {
    let api = FakeDirectoryApi::new();
    // Upstream says the data is already expired.
    api.set_listing(listing_body(&[("13.0.0", 1)], T0 - 1_000));
    let clock = ManualClock::new(T0);
    let config = Config::from_yaml_with_env("cache:\n  expiry: fixed_ttl\n").unwrap();
    let service = service_with(&api, &clock, &config);

    let listing = service.list_servers(None).await.unwrap();
    assert_eq!(listing.expire, "2023-11-14 21:56:40 UTC");

    clock.set(T0 + 120);
    service.list_servers(None).await.unwrap();
    assert_eq!(api.listing_calls(), 1);

    clock.set(T0 + 121);
    service.list_servers(None).await.unwrap();
    assert_eq!(api.listing_calls(), 2);
}

#[tokio::test]
async fn test_expired_upstream_is_still_served_for_the_current_second() {
    let api = FakeDirectoryApi::new();
    api.set_listing(listing_body(&[("13.0.0", 1)], T0 - 10));
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    service.list_servers(None).await.unwrap();
    service.list_servers(None).await.unwrap();
    assert_eq!(api.listing_calls(), 1);

    clock.advance(1);
    service.list_servers(None).await.unwrap();
    assert_eq!(api.listing_calls(), 2);
}

#[tokio::test]
async fn test_get_server_decodes_and_caches_per_id() {
    let api = FakeDirectoryApi::new();
    api.set_entry(
        "+abc",
        json!({
            "server": {"info": {"openttd_version": "13.0.0", "start_date": 712_223, "game_date": 730_485}},
            "expire": T0 + 30
        }),
    );
    api.set_entry(
        "+def",
        json!({"server": {"info": {"openttd_version": "12.0.0"}}, "expire": T0 + 30}),
    );
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    let entry = service.get_server("+abc").await.unwrap();
    assert_eq!(entry.server.server_id(), Some("+abc"));
    let info = entry.server.get("info").unwrap();
    assert_eq!(info["start_date"], json!("1950-01-01"));
    assert_eq!(info["game_date"], json!("2000-01-01"));
    assert_eq!(entry.expire, "2023-11-14 22:13:51 UTC");

    service.get_server("+abc").await.unwrap();
    service.get_server("+def").await.unwrap();
    assert_eq!(api.entry_calls(), 2);
    assert_eq!(service.entry_cache_stats().entries, 2);
}

#[tokio::test]
async fn test_unlisted_server_is_not_found_and_cached() {
    let api = FakeDirectoryApi::new();
    api.set_entry("+gone", json!({"server": null, "expire": T0 + 30}));
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    let err = service.get_server("+gone").await.unwrap_err();
    assert!(matches!(err, WebclientError::ServerNotFound { .. }));
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "This server (no longer) exists");

    // The "not listed" answer is cached like any other payload.
    service.get_server("+gone").await.unwrap_err();
    assert_eq!(api.entry_calls(), 1);
}

#[tokio::test]
async fn test_api_404_is_not_found() {
    let api = FakeDirectoryApi::new();
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    let err = service.get_server("+missing").await.unwrap_err();
    assert!(matches!(err, WebclientError::Fetch(FetchError::NotFound { .. })));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_fetch_failure_propagates_without_stale_fallback() {
    let api = FakeDirectoryApi::new();
    api.set_listing(listing_body(&[("13.0.0", 1)], T0 + 10));
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    service.list_servers(None).await.unwrap();

    api.fail_listing(FetchError::Status {
        status: 500,
        message: "database offline".to_string(),
    });
    clock.set(T0 + 20);

    let err = service.list_servers(None).await.unwrap_err();
    assert!(!err.is_not_found());
    assert_eq!(err.user_message(), "API call failed; sorry for the inconvenience");
    assert_eq!(service.listing_cache_stats().fetch_failures, 1);

    // Not retried within the call, and the next call tries again.
    assert_eq!(api.listing_calls(), 2);
    api.set_listing(listing_body(&[("14.0.0", 1)], T0 + 80));
    let listing = service.list_servers(None).await.unwrap();
    assert_eq!(listing.servers[0].openttd_version(), "14.0.0");
    assert_eq!(api.listing_calls(), 3);
}

#[tokio::test]
async fn test_unknown_server_id_reads_as_not_found() {
    let api = FakeDirectoryApi::new();
    api.fail_entry(
        "bad id",
        FetchError::UnknownServer {
            server_id: "bad id".to_string(),
        },
    );
    let clock = ManualClock::new(T0);
    let service = service_with(&api, &clock, &Config::default());

    let err = service.get_server("bad id").await.unwrap_err();
    assert!(matches!(err, WebclientError::Fetch(FetchError::UnknownServer { .. })));
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "This server (no longer) exists");
}

#[tokio::test]
async fn test_seen_times_follow_listing_option() {
    let body = json!({
        "servers": [{"info": {"openttd_version": "13.0.0"}, "time_first_seen": T0}],
        "expire": T0 + 60
    });

    let api = FakeDirectoryApi::new();
    api.set_listing(body.clone());
    let service = service_with(&api, &ManualClock::new(T0), &Config::default());
    let listing = service.list_servers(None).await.unwrap();
    assert_eq!(
        listing.servers[0].get("time_first_seen"),
        Some(&json!("2023-11-14 22:13:20 UTC"))
    );

    let api = FakeDirectoryApi::new();
    api.set_listing(body);
    let config = Config::from_yaml_with_env("listing:\n  normalize_seen_times: false\n").unwrap();
    let service = service_with(&api, &ManualClock::new(T0), &config);
    let listing = service.list_servers(None).await.unwrap();
    assert_eq!(listing.servers[0].get("time_first_seen"), Some(&json!(T0)));
}

#[tokio::test]
async fn test_listing_serialises_for_rendering() {
    let api = FakeDirectoryApi::new();
    api.set_listing(listing_body(&[("13.0.0", 4)], T0 + 60));
    let service = service_with(&api, &ManualClock::new(T0), &Config::default());

    let listing = service.list_servers(None).await.unwrap();
    let rendered = serde_json::to_value(&listing).unwrap();

    assert_eq!(rendered["clients"], json!(4));
    assert_eq!(rendered["servers_ipv4"], json!(1));
    assert_eq!(rendered["servers"][0]["server_id"], json!("+srv0"));
    assert_eq!(rendered["filter"], json!(null));
}

#[tokio::test]
async fn test_rendered_records_carry_mapset_and_gamescript() {
    let api = FakeDirectoryApi::new();
    api.set_listing(json!({
        "servers": [
            {"info": {"openttd_version": "13.0.0", "landscape": 2, "gamescript_version": 4_294_967_295u64}},
            {"info": {"openttd_version": "12.0.0", "landscape": 1, "gamescript_version": 5}}
        ],
        "expire": T0 + 60
    }));
    api.set_entry(
        "+toy",
        json!({"server": {"info": {"landscape": 3, "gamescript_version": 1}}, "expire": T0 + 60}),
    );
    let service = service_with(&api, &ManualClock::new(T0), &Config::default());

    let listing = serde_json::to_value(service.list_servers(None).await.unwrap()).unwrap();
    assert_eq!(listing["servers"][0]["mapset"], json!("Tropical"));
    assert_eq!(listing["servers"][0]["has_gamescript"], json!(false));
    assert_eq!(listing["servers"][1]["mapset"], json!("Arctic"));
    assert_eq!(listing["servers"][1]["has_gamescript"], json!(true));
    // Raw values stay available next to the annotations.
    assert_eq!(listing["servers"][0]["info"]["landscape"], json!(2));

    let entry = serde_json::to_value(service.get_server("+toy").await.unwrap()).unwrap();
    assert_eq!(entry["server"]["mapset"], json!("Toyland"));
    assert_eq!(entry["server"]["has_gamescript"], json!(true));
}

#[tokio::test]
async fn test_requested_filter_is_passed_through() {
    let api = FakeDirectoryApi::new();
    api.set_listing(listing_body(&[("12.2.0", 1), ("13.0.0", 2)], T0 + 60));
    let service = service_with(&api, &ManualClock::new(T0), &Config::default());

    let all = service.list_servers(Some("all")).await.unwrap();
    assert_eq!(all.filter.as_deref(), Some("all"));
    assert_eq!(all.servers.len(), 2);

    let empty = service.list_servers(Some("")).await.unwrap();
    assert_eq!(empty.filter.as_deref(), Some(""));
    assert_eq!(empty.servers.len(), 2);

    let none = service.list_servers(None).await.unwrap();
    assert_eq!(none.filter, None);
    assert_eq!(serde_json::to_value(&all).unwrap()["filter"], json!("all"));
}
