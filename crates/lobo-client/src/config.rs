//! Client configuration.
//!
//! Defaults can be overridden from the environment; front-ends layer their
//! own flags on top.
//!
//! | Variable          | Meaning                            | Default                 |
//! |-------------------|------------------------------------|-------------------------|
//! | `LOBO_SERVER`     | Server base URL                    | `http://127.0.0.1:3000` |
//! | `LOBO_PHASE_SECS` | Local day/night countdown length   | `90`                    |
//! | `LOBO_FADE_MS`    | Announcement fade in/out duration  | `800`                   |
//! | `LOBO_HOLD_MS`    | Announcement hold duration         | `2500`                  |

use std::str::FromStr;
use std::time::Duration;

use crate::announcement::Timing;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";
pub const DEFAULT_PHASE_SECS: u32 = 90;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub phase_secs: u32,
    pub timing: Timing,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER.to_string(),
            phase_secs: DEFAULT_PHASE_SECS,
            timing: Timing::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `LOBO_*` variables that are set and parse.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "ignoring unparsable setting");
                    None
                }
            }
        }

        let mut config = Self::default();
        if let Some(server) = lookup("LOBO_SERVER").filter(|s| !s.trim().is_empty()) {
            config.server_url = server.trim().to_string();
        }
        if let Some(secs) = parsed::<u32>(&lookup, "LOBO_PHASE_SECS").filter(|&s| s > 0) {
            config.phase_secs = secs;
        }
        if let Some(ms) = parsed::<u64>(&lookup, "LOBO_FADE_MS") {
            config.timing.fade_in = Duration::from_millis(ms);
            config.timing.fade_out = Duration::from_millis(ms);
        }
        if let Some(ms) = parsed::<u64>(&lookup, "LOBO_HOLD_MS") {
            config.timing.hold = Duration::from_millis(ms);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(ClientConfig::from_lookup(lookup(&[])), ClientConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("LOBO_SERVER", "https://lobo.example.com"),
            ("LOBO_PHASE_SECS", "45"),
            ("LOBO_FADE_MS", "200"),
            ("LOBO_HOLD_MS", "1000"),
        ]));
        assert_eq!(config.server_url, "https://lobo.example.com");
        assert_eq!(config.phase_secs, 45);
        assert_eq!(config.timing.fade_in, Duration::from_millis(200));
        assert_eq!(config.timing.fade_out, Duration::from_millis(200));
        assert_eq!(config.timing.hold, Duration::from_millis(1000));
    }

    #[test]
    fn bad_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("LOBO_PHASE_SECS", "0"),
            ("LOBO_FADE_MS", "rápido"),
            ("LOBO_SERVER", "  "),
        ]));
        assert_eq!(config, ClientConfig::default());
    }
}
