use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_COURSES_TABLE: &str = "Qriosity-Courses";
pub const DEFAULT_COURSES_URL_INDEX: &str = "url-index";
pub const DEFAULT_TOPICS_TABLE: &str = "Qriosity-Topics";
pub const DEFAULT_USERS_TABLE: &str = "Qriosity-Users";
pub const DEFAULT_ROADMAPS_TABLE: &str = "Qriosity-Roadmaps";
/// Platform author stamped on courses first seen in a generated roadmap.
pub const DEFAULT_GENERATED_AUTHOR: &str = "Qriosity-AI";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Settings read once per cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub courses_table: String,
    pub courses_url_index: String,
    pub topics_table: String,
    pub users_table: String,
    pub roadmaps_table: String,
    /// Base URL of the roadmap generator (`API_ENDPOINT`).
    pub generator_url: Option<String>,
    /// Base URL of the question/rating model (`AI_API_URL`).
    pub challenge_url: Option<String>,
    pub http_timeout: Duration,
    /// Author stamped on courses created from a generated roadmap.
    pub generated_author: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    name: "HTTP_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            courses_table: or("COURSES_TABLE", DEFAULT_COURSES_TABLE),
            courses_url_index: or("COURSES_URL_INDEX", DEFAULT_COURSES_URL_INDEX),
            topics_table: or("TOPICS_TABLE", DEFAULT_TOPICS_TABLE),
            users_table: or("USERS_TABLE", DEFAULT_USERS_TABLE),
            roadmaps_table: or("ROADMAPS_TABLE", DEFAULT_ROADMAPS_TABLE),
            generator_url: lookup("API_ENDPOINT").filter(|v| !v.trim().is_empty()),
            challenge_url: lookup("AI_API_URL").filter(|v| !v.trim().is_empty()),
            http_timeout,
            generated_author: or("GENERATED_COURSE_AUTHOR", DEFAULT_GENERATED_AUTHOR),
        })
    }

    pub fn require_generator_url(&self) -> Result<&str, ConfigError> {
        self.generator_url
            .as_deref()
            .ok_or(ConfigError::Missing("API_ENDPOINT"))
    }

    pub fn require_challenge_url(&self) -> Result<&str, ConfigError> {
        self.challenge_url
            .as_deref()
            .ok_or(ConfigError::Missing("AI_API_URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.courses_table, DEFAULT_COURSES_TABLE);
        assert_eq!(config.users_table, DEFAULT_USERS_TABLE);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.generated_author, "Qriosity-AI");
        assert!(matches!(
            config.require_generator_url(),
            Err(ConfigError::Missing("API_ENDPOINT"))
        ));
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("COURSES_TABLE", "courses-dev"),
            ("API_ENDPOINT", "https://gen.example"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.courses_table, "courses-dev");
        assert_eq!(config.require_generator_url().unwrap(), "https://gen.example");
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("HTTP_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "HTTP_TIMEOUT_SECS", .. }));
    }
}
