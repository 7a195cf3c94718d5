use serde::{Deserialize, Serialize};

use super::string_or_number;

/// Value a check reports when it is healthy.
const CHECK_OK: &str = "ok";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub checks: HealthChecks,
    pub memory_usage: MemoryUsage,
    #[serde(deserialize_with = "string_or_number")]
    pub uptime: String,
    pub server_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: String,
    pub cache: String,
    pub firestore: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    #[serde(deserialize_with = "string_or_number")]
    pub used: String,
    #[serde(deserialize_with = "string_or_number")]
    pub peak: String,
}

impl HealthChecks {
    /// Checks in display order as `(name, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("database", self.database.as_str()),
            ("cache", self.cache.as_str()),
            ("firestore", self.firestore.as_str()),
        ]
        .into_iter()
    }
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == CHECK_OK && self.failing_checks().is_empty()
    }

    /// Names of the checks not reporting "ok".
    pub fn failing_checks(&self) -> Vec<&'static str> {
        self.checks
            .iter()
            .filter(|(_, value)| *value != CHECK_OK)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cache: &str) -> HealthStatus {
        let json = format!(
            r#"{{"status":"ok","checks":{{"database":"ok","cache":"{}","firestore":"ok"}},"memory_usage":{{"used":134217728,"peak":"256 MB"}},"uptime":1042,"server_time":"2024-05-01T10:00:00Z"}}"#,
            cache
        );
        serde_json::from_str(&json).expect("Failed to parse health status")
    }

    #[test]
    fn test_healthy() {
        let health = sample("ok");
        assert!(health.is_healthy());
        assert_eq!(health.memory_usage.used, "134217728");
        assert_eq!(health.uptime, "1042");
    }

    #[test]
    fn test_failing_checks() {
        let health = sample("connection refused");
        assert!(!health.is_healthy());
        assert_eq!(health.failing_checks(), vec!["cache"]);
    }
}
