//! Result data structures for simulated speed test output.
//!
//! This module provides the persisted `TestRecord` shape and the complete
//! `RunResults` returned by the test engine. `TestRecord` serializes with
//! camelCase field names, keeping the stored history blob compatible with
//! histories exported from the web front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rating::{Assessment, Rating};
use crate::simulate::generator::AdvancedMetrics;

/// One completed test, as persisted to the history store.
///
/// All numeric fields are non-negative. `rating` is derived from the
/// download speed and ping at construction time and `timestamp` is set at
/// completion; neither is ever edited afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// Timestamp when the test completed (ISO-8601 in the blob)
    pub timestamp: DateTime<Utc>,
    /// Final download speed in Mbps
    pub download_speed: f64,
    /// Final upload speed in Mbps
    pub upload_speed: f64,
    /// Measured ping in milliseconds
    pub ping_value: f64,
    /// Measured jitter in milliseconds
    pub jitter_value: f64,
    /// Derived quality tier ("A+", "A", "B+", "B" in the blob)
    pub rating: Rating,
    /// Simulated connection label, e.g. "Fiber Optic"
    pub connection_type: String,
    /// Simulated server label, e.g. "Orbital Station 9"
    pub server_location: String,
}

impl TestRecord {
    /// Create a record for a run completing now.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        download_speed: f64,
        upload_speed: f64,
        ping_value: f64,
        jitter_value: f64,
        rating: Rating,
        connection_type: String,
        server_location: String,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            download_speed,
            upload_speed,
            ping_value,
            jitter_value,
            rating,
            connection_type,
            server_location,
        }
    }
}

/// Complete results from a simulated run.
///
/// Contains the persisted record, the rating annotations, and the cosmetic
/// advanced metrics that are reported but not stored.
#[derive(Debug, Clone, Serialize)]
pub struct RunResults {
    /// The record appended to history (unless saving was disabled)
    pub record: TestRecord,
    /// Tier, comparison percentile, and recommendations
    pub assessment: Assessment,
    /// Packet loss, latency stability, and DNS response time
    pub advanced: AdvancedMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating;

    fn sample_record() -> TestRecord {
        TestRecord::new(
            95.2,
            25.8,
            15.3,
            2.1,
            Rating::A,
            "Fiber Optic".to_string(),
            "Orbital Station 9".to_string(),
        )
    }

    #[test]
    fn test_record_serializes_with_storage_field_names() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"downloadSpeed\":95.2"));
        assert!(json.contains("\"uploadSpeed\":25.8"));
        assert!(json.contains("\"pingValue\":15.3"));
        assert!(json.contains("\"jitterValue\":2.1"));
        assert!(json.contains("\"rating\":\"A\""));
        assert!(json.contains("\"connectionType\":\"Fiber Optic\""));
        assert!(json.contains("\"serverLocation\":\"Orbital Station 9\""));
        assert!(json.contains("\"timestamp\""));
    }

    #[test]
    fn test_record_round_trips() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let parsed: TestRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_record_parses_web_export_layout() {
        let json = r#"{
            "timestamp": "2025-03-14T09:26:53.589Z",
            "downloadSpeed": 42.5,
            "uploadSpeed": 18.1,
            "pingValue": 12.0,
            "jitterValue": 1.4,
            "rating": "A",
            "connectionType": "5G+",
            "serverLocation": "Neural Hub 42"
        }"#;
        let record: TestRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.download_speed, 42.5);
        assert_eq!(record.rating, Rating::A);
        assert_eq!(record.connection_type, "5G+");
    }

    #[test]
    fn test_run_results_serializes() {
        let results = RunResults {
            record: sample_record(),
            assessment: rating::rate(95.2, 15.3),
            advanced: AdvancedMetrics {
                packet_loss_pct: 0.12,
                latency_stability: "Very Good",
                dns_response_ms: 9.8,
            },
        };
        let json = serde_json::to_string(&results).unwrap();
        assert!(json.contains("\"record\""));
        assert!(json.contains("\"assessment\""));
        assert!(json.contains("\"advanced\""));
        assert!(json.contains("\"comparison_percentile\":99"));
    }
}
