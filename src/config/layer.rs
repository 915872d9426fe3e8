use super::key::ConfigKey;
use super::port::{BrokerPort, PortError};
use crate::secret::Secret;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid value for {key}")]
pub struct ValueError {
    pub key: ConfigKey,
    #[source]
    pub source: PortError,
}

/// A partial configuration, as supplied by one source. Every field may be
/// missing; [`crate::provider::resolve`] decides what a missing field means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigLayer {
    /// Hostname or IP address of the MQTT broker.
    #[serde(
        rename = "mqtt_server_host",
        alias = "MQTT_SERVER_HOST",
        skip_serializing_if = "Option::is_none"
    )]
    pub broker_host: Option<String>,

    /// TCP port of the MQTT broker (8883 for TLS, 1883 for plaintext).
    #[serde(
        rename = "mqtt_port",
        alias = "MQTT_PORT",
        skip_serializing_if = "Option::is_none"
    )]
    pub broker_port: Option<BrokerPort>,

    /// MQTT username. May be empty when the broker allows anonymous access.
    #[serde(
        rename = "mqtt_user",
        alias = "MQTT_USER",
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,

    /// MQTT password.
    #[serde(
        rename = "mqtt_pass",
        alias = "MQTT_PASS",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Secret>,

    /// Network the node joins.
    #[serde(
        rename = "wifi_ssid",
        alias = "WIFI_SSID",
        skip_serializing_if = "Option::is_none"
    )]
    pub wifi_ssid: Option<String>,

    /// Pre-shared key for `wifi_ssid`.
    #[serde(
        rename = "wifi_pass",
        alias = "WIFI_PASS",
        skip_serializing_if = "Option::is_none"
    )]
    pub wifi_password: Option<Secret>,

    /// Human readable place the node reports from, used for display and
    /// topic routing only.
    #[serde(
        rename = "location_name",
        alias = "LOCATION_NAME",
        skip_serializing_if = "Option::is_none"
    )]
    pub location_label: Option<String>,
}

impl ConfigLayer {
    /// The placeholder values shipped in `config.example.h`. Every field is
    /// present, none of them is usable against a real broker.
    pub fn example() -> Self {
        Self {
            broker_host: Some(String::from("tu-broker.hivemq.cloud")),
            broker_port: Some(BrokerPort::TLS),
            username: Some(String::from("tu_usuario")),
            password: Some(Secret::from("tu_contraseña")),
            wifi_ssid: Some(String::from("Tu_WiFi")),
            wifi_password: Some(Secret::from("tu_contraseña_wifi")),
            location_label: Some(String::from("Habitación Principal")),
        }
    }

    pub fn is_empty(&self) -> bool {
        ConfigKey::ALL.into_iter().all(|key| !self.is_defined(key))
    }

    pub fn is_defined(&self, key: ConfigKey) -> bool {
        match key {
            ConfigKey::BrokerHost => self.broker_host.is_some(),
            ConfigKey::BrokerPort => self.broker_port.is_some(),
            ConfigKey::Username => self.username.is_some(),
            ConfigKey::Password => self.password.is_some(),
            ConfigKey::WifiSsid => self.wifi_ssid.is_some(),
            ConfigKey::WifiPassword => self.wifi_password.is_some(),
            ConfigKey::LocationLabel => self.location_label.is_some(),
        }
    }

    /// Keys this layer defines, in declaration order.
    pub fn defined_keys(&self) -> Vec<ConfigKey> {
        ConfigKey::ALL
            .into_iter()
            .filter(|key| self.is_defined(*key))
            .collect()
    }

    /// Set `key` from its textual form, replacing any existing value.
    pub fn set(&mut self, key: ConfigKey, raw: &str) -> Result<(), ValueError> {
        match key {
            ConfigKey::BrokerHost => self.broker_host = Some(raw.to_owned()),
            ConfigKey::BrokerPort => {
                let port = raw
                    .parse::<BrokerPort>()
                    .map_err(|source| ValueError { key, source })?;
                self.broker_port = Some(port);
            }
            ConfigKey::Username => self.username = Some(raw.to_owned()),
            ConfigKey::Password => self.password = Some(Secret::from(raw)),
            ConfigKey::WifiSsid => self.wifi_ssid = Some(raw.to_owned()),
            ConfigKey::WifiPassword => self.wifi_password = Some(Secret::from(raw)),
            ConfigKey::LocationLabel => self.location_label = Some(raw.to_owned()),
        }
        Ok(())
    }

    /// Field-wise merge: values from `self` win, holes are filled from
    /// `fallback`.
    pub fn or(self, fallback: &ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            broker_host: self.broker_host.or_else(|| fallback.broker_host.clone()),
            broker_port: self.broker_port.or(fallback.broker_port),
            username: self.username.or_else(|| fallback.username.clone()),
            password: self.password.or_else(|| fallback.password.clone()),
            wifi_ssid: self.wifi_ssid.or_else(|| fallback.wifi_ssid.clone()),
            wifi_password: self
                .wifi_password
                .or_else(|| fallback.wifi_password.clone()),
            location_label: self
                .location_label
                .or_else(|| fallback.location_label.clone()),
        }
    }

    /// Stack `upper` on top of this layer; `upper` wins where it is defined.
    pub fn overlay(&mut self, upper: ConfigLayer) {
        *self = upper.or(self);
    }
}
