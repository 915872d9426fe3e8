//! Resolution of the node configuration from a default tier and a stack of
//! override sources.
//!
//! Overrides are layered in the order they are registered; a later source
//! wins over an earlier one for every key it defines. The merged override
//! layer then goes through [`resolve`] against the defaults.
mod global;
mod resolve;
mod sources;

pub use global::{current, install, InstallError};
pub use resolve::{resolve, ConfigMissingError};
pub use sources::{HeaderFile, LayerSource};

use crate::config::{ConfigKey, ConfigLayer, ConfigurationSet, ValueError};
use crate::header::{self, HeaderError};
use crate::overrides::Assignment;

use config::{ConfigError, Environment, File, Map};
use log::{debug, info, warn};
use std::path::PathBuf;
use thiserror::Error;

/// Environment prefix used when none is given.
pub const DEFAULT_ENV_PREFIX: &str = "SENSOR";

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("configuration incomplete")]
    Missing(#[from] ConfigMissingError),
    #[error("failed to load defaults")]
    Defaults(#[from] HeaderError),
    #[error("failed to collect overrides")]
    Source(#[from] ConfigError),
    #[error("invalid override")]
    Value(#[from] ValueError),
}

/// One tier of the override stack.
#[derive(Clone)]
pub enum OverrideSource {
    Header(HeaderFile),
    /// JSON or TOML, chosen by file extension.
    File { path: PathBuf, required: bool },
    /// `<PREFIX>_<KEY>` variables. `vars` replaces the process environment
    /// when set.
    Environment {
        prefix: String,
        vars: Option<Map<String, String>>,
    },
    Assignments(Vec<Assignment>),
    Layer(LayerSource),
}

impl OverrideSource {
    fn describe(&self) -> String {
        match self {
            OverrideSource::Header(header) => format!("header {}", header.path().display()),
            OverrideSource::File { path, .. } => format!("file {}", path.display()),
            OverrideSource::Environment { prefix, .. } => format!("environment {prefix}_*"),
            OverrideSource::Assignments(assignments) => {
                format!("{} inline assignment(s)", assignments.len())
            }
            OverrideSource::Layer(layer) => layer.origin().to_owned(),
        }
    }
}

enum Defaults {
    Layer(ConfigLayer),
    Header(PathBuf),
}

/// Supplies the resolved [`ConfigurationSet`] to the rest of the node.
pub struct ConfigurationProvider {
    defaults: ConfigLayer,
    sources: Vec<OverrideSource>,
}

impl ConfigurationProvider {
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    pub fn defaults(&self) -> &ConfigLayer {
        &self.defaults
    }

    /// Collect every override source into a single layer. Reading the
    /// sources is the only side effect.
    pub fn overrides(&self) -> Result<ConfigLayer, ConfigurationError> {
        let mut builder = config::Config::builder();
        for source in self.sources.iter() {
            debug!("layering {}", source.describe());
            builder = match source {
                OverrideSource::Header(header) => builder.add_source(header.clone()),
                OverrideSource::File { path, required } => {
                    builder.add_source(File::from(path.as_path()).required(*required))
                }
                OverrideSource::Environment { prefix, vars } => {
                    builder.add_source(Environment::with_prefix(prefix).source(vars.clone()))
                }
                OverrideSource::Assignments(assignments) => {
                    let mut layer = ConfigLayer::default();
                    for assignment in assignments {
                        assignment.apply(&mut layer)?;
                    }
                    builder.add_source(LayerSource::new("command line", layer))
                }
                OverrideSource::Layer(layer) => builder.add_source(layer.clone()),
            };
        }
        let layer = builder
            .build()
            .and_then(|config| config.try_deserialize::<ConfigLayer>())?;
        Ok(layer)
    }

    /// Resolve the configuration: overrides first, defaults second.
    pub fn load(&self) -> Result<ConfigurationSet, ConfigurationError> {
        let overrides = self.overrides()?;
        debug!("overrides define {:?}", overrides.defined_keys());
        let set = resolve(&self.defaults, &overrides)?;
        for key in placeholder_keys(&set) {
            warn!("{key} still holds the placeholder value from config.example.h");
        }
        info!(
            "configuration resolved: broker {}:{}, location {:?}",
            set.broker_host(),
            set.broker_port(),
            set.location_label()
        );
        Ok(set)
    }
}

/// Keys whose resolved value is still the shipped example placeholder.
pub fn placeholder_keys(set: &ConfigurationSet) -> Vec<ConfigKey> {
    let example = ConfigLayer::example();
    ConfigKey::ALL
        .into_iter()
        .filter(|key| match key {
            ConfigKey::BrokerHost => example.broker_host.as_deref() == Some(set.broker_host()),
            ConfigKey::Username => example.username.as_deref() == Some(set.username()),
            ConfigKey::Password => example.password.as_ref() == Some(set.password()),
            ConfigKey::WifiSsid => example.wifi_ssid.as_deref() == Some(set.wifi_ssid()),
            ConfigKey::WifiPassword => {
                example.wifi_password.as_ref() == Some(set.wifi_password())
            }
            ConfigKey::BrokerPort | ConfigKey::LocationLabel => false,
        })
        .collect()
}

pub struct ProviderBuilder {
    defaults: Defaults,
    sources: Vec<OverrideSource>,
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderBuilder {
    /// Starts from the built-in example defaults and no overrides.
    pub fn new() -> Self {
        Self {
            defaults: Defaults::Layer(ConfigLayer::example()),
            sources: Vec::new(),
        }
    }

    pub fn defaults(mut self, defaults: ConfigLayer) -> Self {
        self.defaults = Defaults::Layer(defaults);
        self
    }

    /// Take the defaults from a header such as `config.example.h`.
    pub fn defaults_header(mut self, path: impl Into<PathBuf>) -> Self {
        self.defaults = Defaults::Header(path.into());
        self
    }

    pub fn header(self, path: impl Into<PathBuf>) -> Self {
        self.source(OverrideSource::Header(HeaderFile::new(path)))
    }

    /// A header that may not exist, like the untracked `config.h`.
    pub fn optional_header(self, path: impl Into<PathBuf>) -> Self {
        self.source(OverrideSource::Header(HeaderFile::new(path).required(false)))
    }

    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.source(OverrideSource::File {
            path: path.into(),
            required: true,
        })
    }

    pub fn optional_file(self, path: impl Into<PathBuf>) -> Self {
        self.source(OverrideSource::File {
            path: path.into(),
            required: false,
        })
    }

    /// Read `<PREFIX>_<KEY>` from the process environment.
    pub fn environment(self, prefix: &str) -> Self {
        self.source(OverrideSource::Environment {
            prefix: prefix.to_owned(),
            vars: None,
        })
    }

    /// Like [`ProviderBuilder::environment`], reading from `vars` instead of
    /// the process environment.
    pub fn environment_vars(self, prefix: &str, vars: Map<String, String>) -> Self {
        self.source(OverrideSource::Environment {
            prefix: prefix.to_owned(),
            vars: Some(vars),
        })
    }

    pub fn assignments(self, assignments: &[Assignment]) -> Self {
        if assignments.is_empty() {
            return self;
        }
        self.source(OverrideSource::Assignments(assignments.to_vec()))
    }

    /// An in-memory layer, e.g. a provisioning payload.
    pub fn layer(self, origin: &str, layer: ConfigLayer) -> Self {
        self.source(OverrideSource::Layer(LayerSource::new(origin, layer)))
    }

    pub fn source(mut self, source: OverrideSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(self) -> Result<ConfigurationProvider, ConfigurationError> {
        let defaults = match self.defaults {
            Defaults::Layer(layer) => layer,
            Defaults::Header(path) => header::read(&path)?,
        };
        Ok(ConfigurationProvider {
            defaults,
            sources: self.sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerPort;
    use std::io::Write;

    fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_overrides_yields_defaults() {
        let provider = ConfigurationProvider::builder().build().expect("build");
        let set = provider.load().expect("load");
        assert_eq!(
            set,
            resolve(&ConfigLayer::example(), &ConfigLayer::default()).expect("resolve")
        );
    }

    #[test]
    fn test_header_override() {
        let header = write_file(
            ".h",
            "#define WIFI_SSID \"HomeNet\"\n#define WIFI_PASS \"s3cr3t\"\n",
        );
        let set = ConfigurationProvider::builder()
            .header(header.path())
            .build()
            .expect("build")
            .load()
            .expect("load");
        assert_eq!(set.wifi_ssid(), "HomeNet");
        assert_eq!(set.wifi_password().expose(), "s3cr3t");
        assert_eq!(set.broker_host(), "tu-broker.hivemq.cloud");
    }

    #[test]
    fn test_later_sources_win() {
        let header = write_file(".h", "MQTT_PORT=1883\nMQTT_USER=\"from-header\"\n");
        let json = write_file(".json", "{\"mqtt_user\": \"from-json\", \"location_name\": \"Lab\"}");
        let assignments = ["MQTT_USER=from-cli".parse::<Assignment>().expect("assignment")];

        let overrides = ConfigurationProvider::builder()
            .header(header.path())
            .file(json.path())
            .environment_vars("SENSOR", vars(&[("SENSOR_LOCATION_NAME", "Attic")]))
            .assignments(&assignments)
            .build()
            .expect("build")
            .overrides()
            .expect("overrides");

        assert_eq!(overrides.broker_port, Some(BrokerPort::PLAINTEXT));
        assert_eq!(overrides.username.as_deref(), Some("from-cli"));
        assert_eq!(overrides.location_label.as_deref(), Some("Attic"));
        assert!(overrides.broker_host.is_none());
    }

    #[test]
    fn test_environment_override() {
        let set = ConfigurationProvider::builder()
            .environment_vars(
                "SENSOR",
                vars(&[
                    ("SENSOR_MQTT_SERVER_HOST", "10.0.0.2"),
                    ("SENSOR_MQTT_PORT", "1883"),
                    ("OTHER_WIFI_SSID", "ignored"),
                ]),
            )
            .build()
            .expect("build")
            .load()
            .expect("load");
        assert_eq!(set.broker_host(), "10.0.0.2");
        assert_eq!(set.broker_port(), BrokerPort::PLAINTEXT);
        assert_eq!(set.wifi_ssid(), "Tu_WiFi");
    }

    #[test]
    fn test_invalid_environment_port() {
        let err = ConfigurationProvider::builder()
            .environment_vars("SENSOR", vars(&[("SENSOR_MQTT_PORT", "0")]))
            .build()
            .expect("build")
            .load()
            .expect_err("port 0");
        assert!(matches!(err, ConfigurationError::Source(_)));
    }

    #[test]
    fn test_optional_sources_may_be_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let set = ConfigurationProvider::builder()
            .optional_header(dir.path().join("config.h"))
            .optional_file(dir.path().join("config.toml"))
            .build()
            .expect("build")
            .load()
            .expect("load");
        assert_eq!(set.wifi_ssid(), "Tu_WiFi");

        let err = ConfigurationProvider::builder()
            .header(dir.path().join("config.h"))
            .build()
            .expect("build")
            .load()
            .expect_err("required header");
        assert!(matches!(err, ConfigurationError::Source(_)));
    }

    #[test]
    fn test_defaults_from_header() {
        let defaults = write_file(".h", "#define MQTT_PORT 1883\n#define WIFI_SSID \"Shed\"\n");
        let err = ConfigurationProvider::builder()
            .defaults_header(defaults.path())
            .build()
            .expect("build")
            .load()
            .expect_err("no host anywhere");
        match err {
            ConfigurationError::Missing(missing) => {
                assert_eq!(missing.missing, [ConfigKey::BrokerHost])
            }
            other => panic!("unexpected error {other:?}"),
        }

        let set = ConfigurationProvider::builder()
            .defaults_header(defaults.path())
            .layer("provisioning", {
                let mut layer = ConfigLayer::default();
                layer.set(ConfigKey::BrokerHost, "broker.lan").expect("set");
                layer
            })
            .build()
            .expect("build")
            .load()
            .expect("load");
        assert_eq!(set.broker_host(), "broker.lan");
        assert_eq!(set.wifi_ssid(), "Shed");
        assert_eq!(set.location_label(), "");
    }

    #[test]
    fn test_file_accepts_header_spelling() {
        let json = write_file(".json", "{\"WIFI_SSID\": \"upper\", \"MQTT_SERVER_HOST\": \"broker.lan\"}");
        let toml = write_file(".toml", "LOCATION_NAME = \"Shed\"\n");
        let overrides = ConfigurationProvider::builder()
            .file(json.path())
            .file(toml.path())
            .build()
            .expect("build")
            .overrides()
            .expect("overrides");
        assert_eq!(overrides.wifi_ssid.as_deref(), Some("upper"));
        assert_eq!(overrides.broker_host.as_deref(), Some("broker.lan"));
        assert_eq!(overrides.location_label.as_deref(), Some("Shed"));
    }

    #[test]
    fn test_toml_file() {
        let toml = write_file(".toml", "wifi_ssid = \"HomeNet\"\nmqtt_port = 1883\n");
        let overrides = ConfigurationProvider::builder()
            .file(toml.path())
            .build()
            .expect("build")
            .overrides()
            .expect("overrides");
        assert_eq!(overrides.wifi_ssid.as_deref(), Some("HomeNet"));
        assert_eq!(overrides.broker_port, Some(BrokerPort::PLAINTEXT));
    }

    #[test]
    fn test_placeholder_detection() {
        let set = resolve(&ConfigLayer::example(), &ConfigLayer::default()).expect("resolve");
        assert_eq!(
            placeholder_keys(&set),
            [
                ConfigKey::BrokerHost,
                ConfigKey::Username,
                ConfigKey::Password,
                ConfigKey::WifiSsid,
                ConfigKey::WifiPassword
            ]
        );

        let mut overrides = ConfigLayer::default();
        overrides.set(ConfigKey::WifiSsid, "HomeNet").expect("set");
        overrides.set(ConfigKey::WifiPassword, "s3cr3t").expect("set");
        let set = resolve(&ConfigLayer::example(), &overrides).expect("resolve");
        assert!(!placeholder_keys(&set).contains(&ConfigKey::WifiSsid));
        assert!(!placeholder_keys(&set).contains(&ConfigKey::WifiPassword));
    }
}
