//! Provider configuration.
//!
//! Explicit settings win over environment variables, which win over the
//! built-in polling defaults. Host and token have no default.

use std::time::Duration;

use crate::error::{ProviderError, Result};
use crate::poller::PollConfig;

pub const ENV_HOST: &str = "MISSIONCONTROL_HOST";
pub const ENV_TOKEN: &str = "MISSIONCONTROL_TOKEN";
pub const ENV_POLLING_INTERVAL: &str = "POLLING_INTERVAL_DURATION";
pub const ENV_POLLING_TIMEOUT: &str = "POLLING_TIMEOUT_DURATION";

pub const DEFAULT_POLLING_INTERVAL: &str = "20s";
pub const DEFAULT_POLLING_TIMEOUT: &str = "30m";

/// Unresolved settings, as given on the command line or in a file.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub host: Option<String>,
    pub bearer_token: Option<String>,
    pub polling_interval: Option<String>,
    pub polling_timeout: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub host: String,
    pub bearer_token: Option<String>,
    pub polling_interval: Duration,
    pub polling_timeout: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("polling_interval", &self.polling_interval)
            .field("polling_timeout", &self.polling_timeout)
            .finish()
    }
}

impl ProviderConfig {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.polling_interval,
            timeout: self.polling_timeout,
        }
    }
}

impl ProviderSettings {
    /// Resolve against the process environment.
    pub fn resolve_from_env(self) -> Result<ProviderConfig> {
        self.resolve(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve<F>(self, lookup: F) -> Result<ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |explicit: Option<String>, key: &str| {
            explicit
                .filter(|v| !v.trim().is_empty())
                .or_else(|| lookup(key).filter(|v| !v.trim().is_empty()))
        };

        let host = pick(self.host, ENV_HOST).ok_or_else(|| {
            ProviderError::Config(format!("host is not set (use --host or {})", ENV_HOST))
        })?;
        let bearer_token = pick(self.bearer_token, ENV_TOKEN);

        let interval = pick(self.polling_interval, ENV_POLLING_INTERVAL)
            .unwrap_or_else(|| DEFAULT_POLLING_INTERVAL.to_string());
        let timeout = pick(self.polling_timeout, ENV_POLLING_TIMEOUT)
            .unwrap_or_else(|| DEFAULT_POLLING_TIMEOUT.to_string());

        let polling_interval = parse_duration(&interval)?;
        let polling_timeout = parse_duration(&timeout)?;
        if polling_interval.is_zero() {
            return Err(ProviderError::Config(
                "polling interval must be positive".to_string(),
            ));
        }

        Ok(ProviderConfig {
            host,
            bearer_token,
            polling_interval,
            polling_timeout,
        })
    }
}

/// Parse a duration such as `20s`, `30m`, `1h`, `500ms` or `1m30s`.
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let invalid = || {
        ProviderError::Config(format!(
            "invalid duration '{}', expected e.g. 20s, 30m, 1h, 500ms",
            s
        ))
    };

    if s.is_empty() {
        return Err(invalid());
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let n: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(n)),
            "s" => Some(Duration::from_secs(n)),
            "m" => n.checked_mul(60).map(Duration::from_secs),
            "h" => n.checked_mul(3600).map(Duration::from_secs),
            _ => return Err(invalid()),
        };
        total = part
            .and_then(|p| total.checked_add(p))
            .ok_or_else(invalid)?;
        rest = &rest[unit_len..];
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("20s").unwrap(), Duration::from_secs(20));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration(" 45 ").unwrap(), Duration::from_secs(45));
    }

    #[test]
    fn test_parse_duration_invalid() {
        for input in [
            "",
            "s",
            "10x",
            "ten seconds",
            "1.5s",
            "m30",
            "9999999999999999999h",
            "307445734561825861m",
            "18446744073709551615s18446744073709551615s",
            "99999999999999999999s",
        ] {
            assert!(parse_duration(input).is_err(), "{}", input);
        }
    }

    #[test]
    fn test_defaults() {
        let config = ProviderSettings::default()
            .resolve(env(&[(ENV_HOST, "api.example.com")]))
            .unwrap();
        assert_eq!(config.host, "api.example.com");
        assert!(config.bearer_token.is_none());
        assert_eq!(config.polling_interval, Duration::from_secs(20));
        assert_eq!(config.polling_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn test_explicit_overrides_env() {
        let settings = ProviderSettings {
            host: Some("explicit:8090".to_string()),
            polling_interval: Some("1s".to_string()),
            ..Default::default()
        };
        let config = settings
            .resolve(env(&[
                (ENV_HOST, "from-env"),
                (ENV_TOKEN, "tok"),
                (ENV_POLLING_INTERVAL, "5s"),
                (ENV_POLLING_TIMEOUT, "2m"),
            ]))
            .unwrap();

        assert_eq!(config.host, "explicit:8090");
        assert_eq!(config.bearer_token.as_deref(), Some("tok"));
        assert_eq!(config.polling_interval, Duration::from_secs(1));
        assert_eq!(config.polling_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_missing_host() {
        assert!(matches!(
            ProviderSettings::default().resolve(env(&[])),
            Err(ProviderError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_env_duration() {
        let result = ProviderSettings::default().resolve(env(&[
            (ENV_HOST, "h"),
            (ENV_POLLING_TIMEOUT, "forever"),
        ]));
        assert!(matches!(result, Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ProviderSettings {
            host: Some("h".to_string()),
            bearer_token: Some("s3cret".to_string()),
            ..Default::default()
        }
        .resolve(env(&[]))
        .unwrap();
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
