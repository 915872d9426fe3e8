//! Key-definition files in the shape of the firmware's `config.h`.
//!
//! Two line forms are understood:
//!
//! ```text
//! #define MQTT_SERVER_HOST "broker.example.org"   // C preprocessor style
//! MQTT_PORT=1883                                 // plain assignment
//! ```
//!
//! Other preprocessor directives (`#ifndef`, `#endif`, `#pragma`, ...),
//! include-guard markers and comments are skipped. Within one file the first
//! definition of a key wins, the way an `#ifndef` guard keeps an earlier
//! `#define`.
use crate::config::{ConfigKey, ConfigLayer, ConfigurationSet, ValueError};

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },
    #[error("line {line}: unknown escape sequence")]
    BadEscape { line: usize },
    #[error("line {line}: expected a string or integer literal")]
    BadLiteral { line: usize },
    #[error("line {line}: malformed definition")]
    Malformed { line: usize },
    #[error("line {line}: invalid value")]
    Value {
        line: usize,
        #[source]
        source: ValueError,
    },
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

enum Form {
    Define,
    Assign,
}

struct Definition<'a> {
    name: &'a str,
    raw: &'a str,
    form: Form,
}

/// Read and parse a header file.
pub fn read(path: &Path) -> Result<ConfigLayer, HeaderError> {
    let text = fs::read_to_string(path).map_err(|source| HeaderError::Io {
        path: path.to_owned(),
        source,
    })?;
    debug!("parsing header {}", path.display());
    parse(&text)
}

/// Parse header text into a layer holding only the keys the text defines.
pub fn parse(text: &str) -> Result<ConfigLayer, HeaderError> {
    let mut layer = ConfigLayer::default();
    let mut in_block_comment = false;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let code = strip_comments(raw_line, &mut in_block_comment);
        let Some(definition) = classify(code.trim(), line)? else {
            continue;
        };
        let Ok(key) = ConfigKey::try_from(definition.name) else {
            debug!("line {line}: skipping unknown key {}", definition.name);
            continue;
        };
        if layer.is_defined(key) {
            debug!("line {line}: {key} already defined, keeping the first definition");
            continue;
        }
        let value = match definition.form {
            Form::Define => literal(definition.raw, line)?,
            Form::Assign if definition.raw.starts_with('"') => {
                string_literals(definition.raw, line)?
            }
            Form::Assign => definition.raw.to_owned(),
        };
        layer
            .set(key, &value)
            .map_err(|source| HeaderError::Value { line, source })?;
    }
    Ok(layer)
}

/// Render a resolved set back into header form. Secrets are redacted, so the
/// output documents a configuration but cannot reproduce it.
pub fn render(set: &ConfigurationSet) -> String {
    let mut out = String::from("#ifndef CONFIG_H\n#define CONFIG_H\n\n");
    for key in ConfigKey::ALL {
        let value = set.display_value(key);
        let line = match key {
            ConfigKey::BrokerPort => format!("#define {:<17}{}\n", key.name(), value),
            _ => format!("#define {:<17}\"{}\"\n", key.name(), escape(&value)),
        };
        out.push_str(&line);
    }
    out.push_str("\n#endif // CONFIG_H\n");
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

// Drop `//` and `/* */` comments that sit outside string literals. Block
// comments may span lines.
fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if *in_block {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block = false;
                out.push(' ');
            }
            continue;
        }
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_block = true;
            }
            _ => out.push(c),
        }
    }
    out
}

fn classify(code: &str, line: usize) -> Result<Option<Definition<'_>>, HeaderError> {
    if code.is_empty() {
        return Ok(None);
    }
    if let Some(directive) = code.strip_prefix('#') {
        let (word, rest) = split_word(directive);
        if word != "define" {
            return Ok(None);
        }
        let (name, raw) = split_word(rest);
        if name.is_empty() {
            return Err(HeaderError::Malformed { line });
        }
        if raw.is_empty() {
            // Include guard marker.
            return Ok(None);
        }
        return Ok(Some(Definition {
            name,
            raw,
            form: Form::Define,
        }));
    }
    let (name, raw) = code
        .split_once('=')
        .ok_or(HeaderError::Malformed { line })?;
    let name = name.trim();
    if !is_identifier(name) {
        return Err(HeaderError::Malformed { line });
    }
    Ok(Some(Definition {
        name,
        raw: raw.trim(),
        form: Form::Assign,
    }))
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    s.split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((s.trim_end(), ""))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn literal(raw: &str, line: usize) -> Result<String, HeaderError> {
    if raw.starts_with('"') {
        return string_literals(raw, line);
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return Ok(raw.to_owned());
    }
    Err(HeaderError::BadLiteral { line })
}

// One or more adjacent string literals, concatenated as C does.
fn string_literals(raw: &str, line: usize) -> Result<String, HeaderError> {
    let mut value = String::new();
    let mut rest = raw.trim();

    while !rest.is_empty() {
        let body = rest
            .strip_prefix('"')
            .ok_or(HeaderError::BadLiteral { line })?;
        let mut chars = body.char_indices();
        let mut closed = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    closed = Some(i);
                    break;
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some(_) => return Err(HeaderError::BadEscape { line }),
                    None => return Err(HeaderError::UnterminatedString { line }),
                },
                c => value.push(c),
            }
        }
        let end = closed.ok_or(HeaderError::UnterminatedString { line })?;
        rest = body[end + 1..].trim_start();
    }
    Ok(value)
}
