use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("no such configuration key")]
    NoSuchKey,
}

/// A recognised configuration key, named the way the firmware header
/// spells it.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, PartialOrd, Ord)]
pub enum ConfigKey {
    BrokerHost,
    BrokerPort,
    Username,
    Password,
    WifiSsid,
    WifiPassword,
    LocationLabel,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 7] = [
        ConfigKey::BrokerHost,
        ConfigKey::BrokerPort,
        ConfigKey::Username,
        ConfigKey::Password,
        ConfigKey::WifiSsid,
        ConfigKey::WifiPassword,
        ConfigKey::LocationLabel,
    ];

    /// Header / environment spelling.
    pub const fn name(self) -> &'static str {
        match self {
            ConfigKey::BrokerHost => "MQTT_SERVER_HOST",
            ConfigKey::BrokerPort => "MQTT_PORT",
            ConfigKey::Username => "MQTT_USER",
            ConfigKey::Password => "MQTT_PASS",
            ConfigKey::WifiSsid => "WIFI_SSID",
            ConfigKey::WifiPassword => "WIFI_PASS",
            ConfigKey::LocationLabel => "LOCATION_NAME",
        }
    }

    /// Key used by structured sources (JSON, TOML, environment after the
    /// prefix has been stripped).
    pub const fn field(self) -> &'static str {
        match self {
            ConfigKey::BrokerHost => "mqtt_server_host",
            ConfigKey::BrokerPort => "mqtt_port",
            ConfigKey::Username => "mqtt_user",
            ConfigKey::Password => "mqtt_pass",
            ConfigKey::WifiSsid => "wifi_ssid",
            ConfigKey::WifiPassword => "wifi_pass",
            ConfigKey::LocationLabel => "location_name",
        }
    }

    /// Without a mandatory value the node can neither join the network nor
    /// reach its broker.
    pub const fn is_mandatory(self) -> bool {
        matches!(
            self,
            ConfigKey::BrokerHost | ConfigKey::BrokerPort | ConfigKey::WifiSsid
        )
    }

    pub const fn is_secret(self) -> bool {
        matches!(self, ConfigKey::Password | ConfigKey::WifiPassword)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for ConfigKey {
    type Error = KeyError;

    /// Only works for uppercase inputs.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.name() == value)
            .ok_or(KeyError::NoSuchKey)
    }
}

#[cfg(test)]
mod tests {
    use super::ConfigKey;

    #[test]
    fn test_names_round_trip() {
        for key in ConfigKey::ALL {
            assert_eq!(ConfigKey::try_from(key.name()).expect("known"), key);
        }
    }

    #[test]
    fn test_lowercase_rejected() {
        assert!(ConfigKey::try_from("wifi_ssid").is_err());
    }

    #[test]
    fn test_mandatory_and_secret() {
        let mandatory: Vec<_> = ConfigKey::ALL
            .into_iter()
            .filter(|k| k.is_mandatory())
            .collect();
        assert_eq!(
            mandatory,
            [ConfigKey::BrokerHost, ConfigKey::BrokerPort, ConfigKey::WifiSsid]
        );
        assert!(ConfigKey::Password.is_secret());
        assert!(ConfigKey::WifiPassword.is_secret());
        assert!(!ConfigKey::Username.is_secret());
    }
}
