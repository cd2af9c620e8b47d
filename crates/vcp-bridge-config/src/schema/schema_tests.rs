use super::*;
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(config.server.url.is_none());
    assert!(config.server.key.is_none());
    assert_eq!(config.connection.heartbeat_interval_secs, 30);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_connection_config_default() {
    let connection = ConnectionConfig::default();
    assert_eq!(connection.heartbeat_interval(), Duration::from_secs(30));
    assert_eq!(connection.missed_heartbeat_limit, 0);
    assert_eq!(connection.send_buffer, 100);
}

#[test]
fn test_observer_config_default() {
    let observer = ObserverConfig::default();
    assert_eq!(observer.debounce(), Duration::from_millis(500));
    assert_eq!(observer.poll_interval(), Duration::from_secs(5));
    assert_eq!(observer.post_action_delay(), Duration::from_millis(500));
}

#[test]
fn test_browser_config_default() {
    let browser = BrowserConfig::default();
    assert_eq!(browser.cdp_endpoint, "http://localhost:9222");
    assert_eq!(browser.command_timeout_ms, 30_000);
}

#[test]
fn test_reconnect_backoff_doubles_and_caps() {
    let reconnect = ReconnectConfig::default();
    assert!(reconnect.enabled);
    assert_eq!(reconnect.delay_for_attempt(0), Duration::from_secs(1));
    assert_eq!(reconnect.delay_for_attempt(1), Duration::from_secs(2));
    assert_eq!(reconnect.delay_for_attempt(3), Duration::from_secs(8));
    assert_eq!(reconnect.delay_for_attempt(10), Duration::from_secs(30));
    assert_eq!(reconnect.delay_for_attempt(u32::MAX), Duration::from_secs(30));
}

#[test]
fn test_partial_section_keeps_other_defaults() {
    let config: Config = toml::from_str(
        r#"
        [observer]
        poll_interval_ms = 1000
        "#,
    )
    .unwrap();
    assert_eq!(config.observer.poll_interval_ms, 1000);
    assert_eq!(config.observer.debounce_ms, 500);
    assert!(config.reconnect.enabled);
}

#[test]
fn test_config_serialization_roundtrip() {
    let mut config = Config::default();
    config.server.url = Some("ws://example:1".to_string());
    let serialized = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&serialized).unwrap();
    assert_eq!(parsed.server.url.as_deref(), Some("ws://example:1"));
}
