use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Aggregate request metrics from `GET /analytics/dashboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsData {
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub average_response_time: f64,
    #[serde(default)]
    pub methods: BTreeMap<String, u64>,
    #[serde(default)]
    pub status_codes: BTreeMap<String, u64>,
    #[serde(default)]
    pub daily_requests: BTreeMap<String, u64>,
    #[serde(default)]
    pub recent_requests: Vec<RecentRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRequest {
    pub timestamp: String,
    pub method: String,
    pub endpoint: String,
    pub status: u16,
    /// Milliseconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub ip: Option<String>,
}

impl AnalyticsData {
    /// Share of requests answered with a 4xx/5xx status, 0.0..=1.0.
    pub fn error_rate(&self) -> f64 {
        let total: u64 = self.status_codes.values().sum();
        if total == 0 {
            return 0.0;
        }
        let errors: u64 = self
            .status_codes
            .iter()
            .filter(|(code, _)| code.starts_with('4') || code.starts_with('5'))
            .map(|(_, count)| count)
            .sum();
        errors as f64 / total as f64
    }
}

/// Response of `GET /admin-check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCheck {
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_rate() {
        let json = r#"{"total_requests":100,"average_response_time":145,"methods":{"GET":80,"POST":20},"status_codes":{"200":90,"404":6,"500":4},"daily_requests":{},"recent_requests":[{"timestamp":"2023-11-23 10:30:00","method":"GET","endpoint":"/api/anime","status":200,"duration":120,"ip":"192.168.1.1"}]}"#;
        let data: AnalyticsData = serde_json::from_str(json).expect("Failed to parse analytics");
        assert!((data.error_rate() - 0.10).abs() < f64::EPSILON);
        assert_eq!(data.recent_requests[0].status, 200);
        assert_eq!(AnalyticsData::default().error_rate(), 0.0);
    }

    #[test]
    fn test_admin_check_without_user() {
        let check: AdminCheck =
            serde_json::from_str(r#"{"is_admin":false}"#).expect("Failed to parse admin check");
        assert!(!check.is_admin);
        assert!(check.user.is_none());
    }
}
