//! `helmrc` configuration file parser.
//!
//! A helmrc is a flat list of `key = value` lines:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `instructions_per_update` | executor budget per tick (default 2000) |
//! | `prompt` | input prompt, optionally double-quoted |
//! | `banner` | show the startup banner (`on`/`off`/`true`/`false`) |
//!
//! Lines starting with `#` are comments.  Parse problems are collected and
//! reported, never fatal; a bad value leaves the default in place.

use std::env;
use std::path::{Path, PathBuf};

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a helmrc.
#[derive(Debug)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Console settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Instructions the executor may retire per tick.
    pub instructions_per_update: usize,
    pub prompt: String,
    pub banner: bool,
}

impl Default for ConsoleConfig {
    fn default() -> ConsoleConfig {
        ConsoleConfig {
            instructions_per_update: 2000,
            prompt: "> ".to_owned(),
            banner: true,
        }
    }
}

impl ConsoleConfig {
    /// Parse a helmrc string.
    ///
    /// Returns the config and any errors on recognised lines; each bad
    /// line leaves the corresponding default untouched.
    pub fn load_str(s: &str) -> (ConsoleConfig, Vec<ConfigError>) {
        let mut config = ConsoleConfig::default();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected 'key = value', got '{line}'"),
                });
                continue;
            };
            let key = key.trim();
            let value = unquote(value.trim());

            match key {
                "instructions_per_update" => match value.parse::<usize>() {
                    Ok(n) if n > 0 => config.instructions_per_update = n,
                    Ok(_) => errors.push(ConfigError {
                        line: lineno,
                        message: "instructions_per_update must be positive".into(),
                    }),
                    Err(_) => errors.push(ConfigError {
                        line: lineno,
                        message: format!("not a number: '{value}'"),
                    }),
                },
                "prompt" => config.prompt = value.to_owned(),
                "banner" => match parse_bool(value) {
                    Some(b) => config.banner = b,
                    None => errors.push(ConfigError {
                        line: lineno,
                        message: format!("not a boolean: '{value}'"),
                    }),
                },
                other => errors.push(ConfigError {
                    line: lineno,
                    message: format!("unknown setting '{other}'"),
                }),
            }
        }

        (config, errors)
    }

    /// Read and parse a helmrc from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(ConsoleConfig, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(ConsoleConfig::load_str(&s))
    }

    /// Locate a helmrc: `./helmrc`, then `$HOME/.helmrc`.
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from("helmrc");
        if local.is_file() {
            return Some(local);
        }
        let home = env::var_os("HOME")?;
        let dotted = Path::new(&home).join(".helmrc");
        dotted.is_file().then_some(dotted)
    }
}

/// Strip one level of surrounding double quotes, so values can carry
/// leading or trailing spaces.
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
