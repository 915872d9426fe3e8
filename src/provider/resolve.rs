use crate::config::{ConfigKey, ConfigLayer, ConfigurationSet};

use thiserror::Error;

/// One or more mandatory keys had no usable value in either tier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("missing mandatory configuration: {}", key_list(.missing))]
pub struct ConfigMissingError {
    /// Offending keys, in declaration order.
    pub missing: Vec<ConfigKey>,
}

fn key_list(keys: &[ConfigKey]) -> String {
    keys.iter()
        .map(|key| key.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Two-tier merge: every field `overrides` defines wins, the rest come from
/// `defaults`.
///
/// Fails when the broker host, broker port or WiFi SSID is absent from both
/// tiers. A mandatory text value that is empty or blank counts as absent.
/// Optional fields that neither tier defines resolve to empty strings.
///
/// Pure: the same inputs always produce an equal set.
pub fn resolve(
    defaults: &ConfigLayer,
    overrides: &ConfigLayer,
) -> Result<ConfigurationSet, ConfigMissingError> {
    let merged = overrides.clone().or(defaults);
    let mut missing = Vec::new();

    let broker_host = mandatory_text(merged.broker_host, ConfigKey::BrokerHost, &mut missing);
    let broker_port = merged.broker_port;
    if broker_port.is_none() {
        missing.push(ConfigKey::BrokerPort);
    }
    let wifi_ssid = mandatory_text(merged.wifi_ssid, ConfigKey::WifiSsid, &mut missing);

    match (broker_host, broker_port, wifi_ssid) {
        (Some(broker_host), Some(broker_port), Some(wifi_ssid)) => Ok(ConfigurationSet::new(
            broker_host,
            broker_port,
            merged.username.unwrap_or_default(),
            merged.password.unwrap_or_default(),
            wifi_ssid,
            merged.wifi_password.unwrap_or_default(),
            merged.location_label.unwrap_or_default(),
        )),
        _ => Err(ConfigMissingError { missing }),
    }
}

fn mandatory_text(
    value: Option<String>,
    key: ConfigKey,
    missing: &mut Vec<ConfigKey>,
) -> Option<String> {
    let value = value.filter(|v| !v.trim().is_empty());
    if value.is_none() {
        missing.push(key);
    }
    value
}
