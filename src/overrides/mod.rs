use crate::config::{BrokerPort, ConfigKey, ConfigLayer, KeyError, ValueError};
use crate::secret::REDACTED;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("assignment missing KEY=value separator")]
    MissingSeparator,
    #[error("unknown configuration key")]
    UnknownKey(#[from] KeyError),
    #[error("invalid value")]
    InvalidValue(#[from] ValueError),
}

#[derive(Clone)]
/// A single `KEY=value` override, typically given on the command line. The
/// key uses the header spelling (`WIFI_SSID`, `MQTT_PORT`, ...).
pub struct Assignment {
    pub key: ConfigKey,
    pub value: String,
}

impl Assignment {
    /// Apply on top of `layer`, replacing whatever it held for the key.
    pub fn apply(&self, layer: &mut ConfigLayer) -> Result<(), ValueError> {
        layer.set(self.key, &self.value)
    }
}

impl FromStr for Assignment {
    type Err = AssignmentError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or(AssignmentError::MissingSeparator)?;
        let key = ConfigKey::try_from(key.trim())?;
        if key == ConfigKey::BrokerPort {
            value
                .parse::<BrokerPort>()
                .map_err(|source| ValueError { key, source })?;
        }
        Ok(Self {
            key,
            value: value.trim().to_owned(),
        })
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.key.is_secret() {
            REDACTED
        } else {
            self.value.as_str()
        };
        write!(f, "{}={}", self.key, value)
    }
}
