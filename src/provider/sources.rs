//! Adapters that let header files and in-memory layers take part in a
//! `config` crate builder alongside its own file and environment sources.
use crate::config::{ConfigKey, ConfigLayer};
use crate::header;

use config::{ConfigError, Map, Source, Value, ValueKind};
use log::debug;
use std::path::{Path, PathBuf};

/// A header file (`#define` / `KEY=value`) as a configuration source.
#[derive(Debug, Clone)]
pub struct HeaderFile {
    path: PathBuf,
    required: bool,
}

impl HeaderFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An optional header contributes nothing when the file does not exist.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl Source for HeaderFile {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        if !self.required && !self.path.exists() {
            debug!("optional header {} not present", self.path.display());
            return Ok(Map::new());
        }
        let layer = header::read(&self.path).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        Ok(layer_to_map(&layer, &self.path.display().to_string()))
    }
}

/// An already-parsed layer (inline assignments, a provisioning payload) as
/// a configuration source.
#[derive(Debug, Clone)]
pub struct LayerSource {
    origin: String,
    layer: ConfigLayer,
}

impl LayerSource {
    pub fn new(origin: impl Into<String>, layer: ConfigLayer) -> Self {
        Self {
            origin: origin.into(),
            layer,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Source for LayerSource {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        Ok(layer_to_map(&self.layer, &self.origin))
    }
}

// Only the keys the layer defines are emitted, so lower-priority sources
// keep their values for the rest.
fn layer_to_map(layer: &ConfigLayer, origin: &str) -> Map<String, Value> {
    let origin = origin.to_owned();
    let mut map = Map::new();
    for key in layer.defined_keys() {
        let kind = match key {
            ConfigKey::BrokerPort => layer
                .broker_port
                .map(|port| ValueKind::I64(i64::from(port.get()))),
            ConfigKey::BrokerHost => layer.broker_host.clone().map(ValueKind::String),
            ConfigKey::Username => layer.username.clone().map(ValueKind::String),
            ConfigKey::Password => layer
                .password
                .as_ref()
                .map(|s| ValueKind::String(s.expose().to_owned())),
            ConfigKey::WifiSsid => layer.wifi_ssid.clone().map(ValueKind::String),
            ConfigKey::WifiPassword => layer
                .wifi_password
                .as_ref()
                .map(|s| ValueKind::String(s.expose().to_owned())),
            ConfigKey::LocationLabel => layer.location_label.clone().map(ValueKind::String),
        };
        if let Some(kind) = kind {
            map.insert(key.field().to_owned(), Value::new(Some(&origin), kind));
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_layer_source_emits_defined_keys_only() {
        let mut layer = ConfigLayer::default();
        layer.set(ConfigKey::WifiSsid, "HomeNet").expect("set");
        layer.set(ConfigKey::BrokerPort, "1883").expect("set");
        let map = LayerSource::new("test", layer).collect().expect("collect");
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("wifi_ssid"));
        assert!(map.contains_key("mqtt_port"));
    }

    #[test]
    fn test_optional_header_may_be_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = HeaderFile::new(dir.path().join("config.h")).required(false);
        assert!(source.collect().expect("collect").is_empty());

        let source = HeaderFile::new(dir.path().join("config.h"));
        assert!(source.collect().is_err());
    }

    #[test]
    fn test_header_file_collects() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "#define MQTT_SERVER_HOST \"broker.local\"").expect("write");
        let map = HeaderFile::new(file.path()).collect().expect("collect");
        assert_eq!(map.len(), 1);
        let host = map
            .get("mqtt_server_host")
            .cloned()
            .expect("host")
            .into_string()
            .expect("string");
        assert_eq!(host, "broker.local");
    }
}
