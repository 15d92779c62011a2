use ipwarden_client::{IpLookup, LinodeClient, WardenError};
use ipwarden_core::{FirewallRule, FirewallRuleSet, NetworkAddresses, RuleAction};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> LinodeClient {
    LinodeClient::builder("T")
        .base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_get_rules_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/networking/firewalls/42/rules"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inbound": [{
                "label": "vpn-admin",
                "action": "ACCEPT",
                "protocol": "TCP",
                "ports": "22",
                "addresses": { "ipv4": ["203.0.113.1/32"] }
            }],
            "inbound_policy": "DROP",
            "outbound": [],
            "outbound_policy": "ACCEPT",
            "version": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rules = client(&server).firewalls().rules(42).await.unwrap();
    assert_eq!(rules.inbound[0].label(), "vpn-admin");
    assert_eq!(rules.inbound[0].addresses.ipv4(), ["203.0.113.1/32"]);
    assert_eq!(rules.inbound_policy, RuleAction::Drop);
}

#[tokio::test]
async fn test_update_rules_puts_full_rule_set() {
    let server = MockServer::start().await;

    let mut rule = FirewallRule::new("vpn-admin");
    rule.addresses = NetworkAddresses::ipv4_only(["198.51.100.9/32"]);
    let update = FirewallRuleSet {
        inbound: vec![rule],
        inbound_policy: RuleAction::Drop,
        ..FirewallRuleSet::default()
    }
    .to_update();

    Mock::given(method("PUT"))
        .and(path("/networking/firewalls/42/rules"))
        .and(header("authorization", "Bearer T"))
        .and(body_json(json!({
            "inbound": [{
                "label": "vpn-admin",
                "action": "ACCEPT",
                "protocol": "TCP",
                "addresses": { "ipv4": ["198.51.100.9/32"] }
            }],
            "outbound": [],
            "inbound_policy": "ACCEPT",
            "outbound_policy": "ACCEPT"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&update))
        .expect(1)
        .mount(&server)
        .await;

    let stored = client(&server)
        .firewalls()
        .update_rules(42, &update)
        .await
        .unwrap();
    assert_eq!(stored.inbound_policy, RuleAction::Accept);
}

#[tokio::test]
async fn test_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(path("/networking/firewalls/1/rules"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(path("/networking/firewalls/2/rules"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "errors": [{ "reason": "Not found" }] })),
        )
        .mount(&server)
        .await;
    Mock::given(path("/networking/firewalls/3/rules"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .mount(&server)
        .await;
    Mock::given(path("/networking/firewalls/4/rules"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "field": "inbound", "reason": "Too many rules" }]
        })))
        .mount(&server)
        .await;

    let api = client(&server);
    let firewalls = api.firewalls();

    assert!(matches!(
        firewalls.rules(1).await,
        Err(WardenError::Unauthorized)
    ));
    match firewalls.rules(2).await {
        Err(WardenError::NotFound { resource }) => assert_eq!(resource, "Not found"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(matches!(
        firewalls.rules(3).await,
        Err(WardenError::RateLimited {
            retry_after: Some(12)
        })
    ));
    match firewalls.rules(4).await {
        Err(WardenError::Api { code, message }) => {
            assert_eq!(code, 400);
            assert_eq!(message, "inbound: Too many rules");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).firewalls().rules(42).await.unwrap_err();
    assert!(matches!(err, WardenError::Json(_)));
}

#[tokio::test]
async fn test_request_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = LinodeClient::builder("T")
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.firewalls().rules(42).await.unwrap_err();
    match err {
        WardenError::Timeout(after) => assert_eq!(after, Duration::from_millis(200)),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ip_lookup_trims_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("198.51.100.9\n"))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = IpLookup::builder()
        .url(format!("{}/ip", server.uri()))
        .build()
        .unwrap();
    let ip = lookup.current_ip().await.unwrap();
    assert_eq!(ip.as_str(), "198.51.100.9");
}

#[tokio::test]
async fn test_ip_lookup_non_2xx_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .mount(&server)
        .await;

    let lookup = IpLookup::builder().url(server.uri()).build().unwrap();
    match lookup.current_ip().await {
        Err(WardenError::Api { code, message }) => {
            assert_eq!(code, 503);
            assert_eq!(message, "try later");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
