//! Layered configuration for the environmental sensor node: broker, WiFi
//! and location settings resolved once at start-up and shared read-only.
pub mod config;
pub mod header;
pub mod mqtt;
pub mod overrides;
pub mod provider;
pub mod secret;
