//! Resolve the sensor node configuration from its defaults and overrides,
//! validate it, and print the effective values with secrets redacted.
use sensor_config::config::ConfigurationSet;
use sensor_config::header;
use sensor_config::mqtt;
use sensor_config::overrides::Assignment;
use sensor_config::provider::{self, ConfigurationProvider, DEFAULT_ENV_PREFIX};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::debug;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Header,
}

#[derive(Debug, Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(name = env!("CARGO_BIN_NAME"))]
/// Sensor node configuration resolver
///
/// Overrides are applied in this order, later ones winning:
/// headers (-c), structured files (-f), environment, assignments (-s).
/// Any key an override leaves undefined falls back to the defaults.
///
/// Recognised keys:
///     MQTT_SERVER_HOST, MQTT_PORT, MQTT_USER, MQTT_PASS,
///     WIFI_SSID, WIFI_PASS, LOCATION_NAME
///
/// Header syntax:
///     #define KEY "string"   |   #define KEY 1234   |   KEY=value
pub struct Cli {
    /// Header holding the default values (built-in example values if absent).
    #[arg(short = 'd', value_names = ["defaults-path"])]
    defaults: Option<PathBuf>,

    /// Override header, repeatable.
    #[arg(short = 'c', value_names = ["header-path"])]
    headers: Vec<PathBuf>,

    /// Override file in JSON or TOML format, repeatable.
    #[arg(short = 'f', value_names = ["config-path"])]
    files: Vec<PathBuf>,

    /// Prefix of the environment variables to read (PREFIX_KEY).
    #[arg(short = 'e', default_value = DEFAULT_ENV_PREFIX)]
    env_prefix: String,

    /// Do not read overrides from the environment.
    #[arg(long)]
    no_env: bool,

    /// Single override, repeatable.
    #[arg(short = 's', value_names = ["KEY=value"])]
    set: Vec<Assignment>,

    /// Output format. Secrets are redacted in every format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Also print the telemetry topics derived from the location.
    #[arg(long)]
    topics: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let provider = configure_provider(&cli)?;
    let config = provider.load().context("Failed to resolve configuration")?;
    let config = provider::install(config)?;

    print_config(config, cli.format)?;
    if cli.topics {
        for topic in mqtt::telemetry_topics(config) {
            println!("{topic}");
        }
    }
    Ok(())
}

// Stack the override sources named on the command line on top of the
// defaults.
fn configure_provider(cli: &Cli) -> Result<ConfigurationProvider> {
    let mut builder = ConfigurationProvider::builder();
    if let Some(defaults) = cli.defaults.as_ref() {
        builder = builder.defaults_header(defaults);
    }
    for path in cli.headers.iter() {
        builder = builder.header(path);
    }
    for path in cli.files.iter() {
        builder = builder.file(path);
    }
    if !cli.no_env {
        builder = builder.environment(&cli.env_prefix);
    }
    debug!("inline overrides: {:?}", cli.set);
    builder
        .assignments(&cli.set)
        .build()
        .context("Failed to load configuration defaults")
}

fn print_config(config: &ConfigurationSet, format: Format) -> Result<()> {
    match format {
        Format::Text => print!("{config}"),
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?
        ),
        Format::Header => print!("{}", header::render(config)),
    }
    Ok(())
}
