use std::fmt;
use std::num::NonZeroU16;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("port is not an integer")]
    NotAnInteger,
    #[error("port {0} outside 1-65535")]
    OutOfRange(i64),
}

/// TCP port of the MQTT broker, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct BrokerPort(NonZeroU16);

impl BrokerPort {
    /// Conventional MQTT-over-TLS port.
    pub const TLS: BrokerPort = BrokerPort(match NonZeroU16::new(8883) {
        Some(port) => port,
        None => unreachable!(),
    });

    /// Conventional plaintext MQTT port.
    pub const PLAINTEXT: BrokerPort = BrokerPort(match NonZeroU16::new(1883) {
        Some(port) => port,
        None => unreachable!(),
    });

    pub const fn get(self) -> u16 {
        self.0.get()
    }
}

impl TryFrom<i64> for BrokerPort {
    type Error = PortError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u16::try_from(value)
            .ok()
            .and_then(NonZeroU16::new)
            .map(BrokerPort)
            .ok_or(PortError::OutOfRange(value))
    }
}

impl From<BrokerPort> for u16 {
    fn from(value: BrokerPort) -> Self {
        value.get()
    }
}

impl FromStr for BrokerPort {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map_err(|_| PortError::NotAnInteger)
            .and_then(BrokerPort::try_from)
    }
}

impl fmt::Display for BrokerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
