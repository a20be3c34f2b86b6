//! JWT configuration, grounded on
//! `original_source/configs/config.go`'s `AuthConfig`.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "secret".to_string(),
            expires_in: Duration::from_secs(24 * 3600),
        }
    }
}

impl JwtConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        let expires_in = env::var("AUTH_JWT_EXPIRES_IN")
            .ok()
            .and_then(|raw| parse_go_duration(&raw))
            .unwrap_or(default.expires_in);

        Self {
            secret: env::var("AUTH_JWT_SECRET").unwrap_or(default.secret),
            expires_in,
        }
    }
}

/// Parses a small subset of Go's `time.ParseDuration` grammar (`"24h"`,
/// `"30m"`, `"90s"`) since the original config file stores durations this
/// way and deployments carry that value over verbatim.
fn parse_go_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = raw.split_at(raw.find(|c: char| !c.is_ascii_digit())?);
    let value: u64 = digits.parse().ok()?;
    match unit {
        "h" => Some(Duration::from_secs(value * 3600)),
        "m" => Some(Duration::from_secs(value * 60)),
        "s" => Some(Duration::from_secs(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours() {
        assert_eq!(parse_go_duration("24h"), Some(Duration::from_secs(86400)));
    }

    #[test]
    fn parses_minutes() {
        assert_eq!(parse_go_duration("30m"), Some(Duration::from_secs(1800)));
    }
}
