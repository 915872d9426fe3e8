use super::key::ConfigKey;
use super::port::BrokerPort;
use crate::secret::Secret;

use serde::Serialize;
use std::fmt;

/// The resolved, validated configuration. Built only by
/// [`crate::provider::resolve`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationSet {
    #[serde(rename = "mqtt_server_host")]
    broker_host: String,
    #[serde(rename = "mqtt_port")]
    broker_port: BrokerPort,
    #[serde(rename = "mqtt_user")]
    username: String,
    #[serde(rename = "mqtt_pass")]
    password: Secret,
    #[serde(rename = "wifi_ssid")]
    wifi_ssid: String,
    #[serde(rename = "wifi_pass")]
    wifi_password: Secret,
    #[serde(rename = "location_name")]
    location_label: String,
}

impl ConfigurationSet {
    pub(crate) fn new(
        broker_host: String,
        broker_port: BrokerPort,
        username: String,
        password: Secret,
        wifi_ssid: String,
        wifi_password: Secret,
        location_label: String,
    ) -> Self {
        Self {
            broker_host,
            broker_port,
            username,
            password,
            wifi_ssid,
            wifi_password,
            location_label,
        }
    }

    pub fn broker_host(&self) -> &str {
        &self.broker_host
    }

    pub fn broker_port(&self) -> BrokerPort {
        self.broker_port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &Secret {
        &self.password
    }

    pub fn wifi_ssid(&self) -> &str {
        &self.wifi_ssid
    }

    pub fn wifi_password(&self) -> &Secret {
        &self.wifi_password
    }

    pub fn location_label(&self) -> &str {
        &self.location_label
    }

    /// Whether the broker is reached over MQTT-over-TLS.
    pub fn uses_tls(&self) -> bool {
        self.broker_port == BrokerPort::TLS
    }

    /// Textual value of `key`, with secrets redacted.
    pub fn display_value(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::BrokerHost => self.broker_host.clone(),
            ConfigKey::BrokerPort => self.broker_port.to_string(),
            ConfigKey::Username => self.username.clone(),
            ConfigKey::Password => self.password.to_string(),
            ConfigKey::WifiSsid => self.wifi_ssid.clone(),
            ConfigKey::WifiPassword => self.wifi_password.to_string(),
            ConfigKey::LocationLabel => self.location_label.clone(),
        }
    }
}

impl fmt::Display for ConfigurationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in ConfigKey::ALL {
            writeln!(f, "{:<17}{}", key.name(), self.display_value(key))?;
        }
        Ok(())
    }
}
