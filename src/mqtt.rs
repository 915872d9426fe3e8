//! What the MQTT side of the node derives from a resolved configuration.
//! Nothing here opens a connection.
use crate::config::ConfigurationSet;

use rumqttc::{MqttOptions, Transport};
use std::time::Duration;

pub const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Sensor readings published per location, one topic each.
pub const SENSOR_TYPES: [&str; 3] = ["airquality", "temperature", "humidity"];

/// Client options for the configured broker. Credentials are attached only
/// when a username is set; port 8883 selects a TLS transport.
pub fn client_options(config: &ConfigurationSet, client_id: &str) -> MqttOptions {
    let mut options = MqttOptions::new(
        client_id,
        config.broker_host(),
        config.broker_port().get(),
    );
    options.set_keep_alive(KEEP_ALIVE).set_clean_session(true);
    if !config.username().is_empty() {
        options.set_credentials(config.username(), config.password().expose());
    }
    if config.uses_tls() {
        options.set_transport(Transport::tls_with_default_config());
    }
    options
}

/// Client id derived from the location, e.g. `sensor-habitacion-principal`.
pub fn default_client_id(config: &ConfigurationSet) -> String {
    let slug = location_slug(config.location_label());
    if slug.is_empty() {
        String::from("sensor")
    } else {
        format!("sensor-{slug}")
    }
}

/// Topics the node publishes to: `<location>/<sensor type>`.
pub fn telemetry_topics(config: &ConfigurationSet) -> Vec<String> {
    let slug = location_slug(config.location_label());
    SENSOR_TYPES
        .iter()
        .map(|sensor| format!("{slug}/{sensor}"))
        .collect()
}

/// Reduce a free-form location label to a topic segment: accents folded,
/// lower case, whitespace turned into dashes, anything outside `[a-z0-9-]`
/// dropped, runs of dashes collapsed and trimmed.
pub fn location_slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars().flat_map(char::to_lowercase) {
        let c = if c.is_whitespace() { '-' } else { fold_accent(c) };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        c => c,
    }
}
