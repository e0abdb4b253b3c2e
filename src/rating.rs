//! Connection rating module.
//!
//! This module maps the final download speed and ping of a test run to a
//! discrete quality tier, a comparison percentile, and a list of
//! human-readable recommendations.

use serde::{Deserialize, Serialize};

/// Quality tiers for a simulated connection.
///
/// Variants are ordered from worst to best for correct derived Ord behavior.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Rating {
    /// Decent performance - usable, but upgrades recommended
    #[serde(rename = "B")]
    B,
    /// Good performance - handles HD streaming and most gaming
    #[serde(rename = "B+")]
    BPlus,
    /// Very good performance - comfortable for concurrent heavy use
    #[serde(rename = "A")]
    A,
    /// Excellent performance - low latency, high throughput
    #[serde(rename = "A+")]
    APlus,
}

impl Rating {
    /// Returns the tier label as displayed to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Rating::APlus => "A+",
            Rating::A => "A",
            Rating::BPlus => "B+",
            Rating::B => "B",
        }
    }

    /// Returns a human-readable description of the tier.
    pub fn description(&self) -> &'static str {
        match self {
            Rating::APlus => "excellent",
            Rating::A => "very good",
            Rating::BPlus => "good",
            Rating::B => "decent",
        }
    }

    /// Returns true if this tier is better than or equal to the other tier.
    pub fn is_at_least(&self, other: Rating) -> bool {
        *self >= other
    }
}

/// Full assessment of a completed run: tier plus annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    /// Quality tier derived from download speed and ping
    pub rating: Rating,
    /// "Faster than N% of tested connections" percentile
    pub comparison_percentile: u8,
    /// Advisory strings selected by download-speed bucket; never empty
    pub recommendations: Vec<&'static str>,
}

impl Assessment {
    /// Returns the comparison annotation as displayed to the user.
    pub fn comparison_text(&self) -> String {
        format!("faster than {}% of tested connections", self.comparison_percentile)
    }
}

/// Tier thresholds.
///
/// A tier requires both a download floor and a ping ceiling; rules are
/// evaluated best tier first and the first match wins.
mod tier_thresholds {
    /// Minimum download speed (Mbps) for the A+ tier
    pub const DOWNLOAD_A_PLUS: f64 = 50.0;
    /// Maximum ping (ms) for the A+ tier
    pub const PING_A_PLUS: f64 = 10.0;
    /// Minimum download speed (Mbps) for the A tier
    pub const DOWNLOAD_A: f64 = 30.0;
    /// Maximum ping (ms) for the A tier
    pub const PING_A: f64 = 20.0;
    /// Minimum download speed (Mbps) for the B+ tier
    pub const DOWNLOAD_B_PLUS: f64 = 10.0;
    /// Maximum ping (ms) for the B+ tier
    pub const PING_B_PLUS: f64 = 30.0;
}

/// Rate a completed run.
///
/// Total over all real inputs and deterministic; never errors and always
/// returns a non-empty recommendation list.
///
/// Note the comparison percentile is keyed on download speed alone and its
/// buckets do not line up with the tier rules, so a run can land in tier
/// B+ while still comparing "faster than 95%".
pub fn rate(download_mbps: f64, ping_ms: f64) -> Assessment {
    Assessment {
        rating: tier(download_mbps, ping_ms),
        comparison_percentile: comparison_percentile(download_mbps),
        recommendations: recommendations_for(download_mbps).to_vec(),
    }
}

/// Derive the quality tier from download speed and ping.
pub fn tier(download_mbps: f64, ping_ms: f64) -> Rating {
    use tier_thresholds::*;

    if download_mbps > DOWNLOAD_A_PLUS && ping_ms < PING_A_PLUS {
        Rating::APlus
    } else if download_mbps > DOWNLOAD_A && ping_ms < PING_A {
        Rating::A
    } else if download_mbps > DOWNLOAD_B_PLUS && ping_ms < PING_B_PLUS {
        Rating::BPlus
    } else {
        Rating::B
    }
}

/// Step function mapping download speed to a comparison percentile.
pub fn comparison_percentile(download_mbps: f64) -> u8 {
    if download_mbps > 80.0 {
        99
    } else if download_mbps > 50.0 {
        95
    } else if download_mbps > 30.0 {
        85
    } else if download_mbps > 10.0 {
        70
    } else {
        50
    }
}

/// Fixed advisory strings selected by download-speed bucket.
fn recommendations_for(download_mbps: f64) -> &'static [&'static str] {
    if download_mbps > 50.0 {
        &[
            "Your connection is optimized for streaming 4K content",
            "Great for cloud gaming with low latency",
            "Suitable for multiple concurrent high-bandwidth activities",
            "Video conferencing in high quality with minimal lag",
        ]
    } else if download_mbps > 30.0 {
        &[
            "Your connection is suitable for HD streaming and VR experiences",
            "Good for most cloud gaming applications",
            "Can handle multiple high-bandwidth activities simultaneously",
        ]
    } else if download_mbps > 10.0 {
        &[
            "Your connection is suitable for HD streaming and video calls",
            "Adequate for most online gaming",
            "Consider upgrading for better future-ready performance",
        ]
    } else {
        &[
            "Your connection may struggle with high-definition content",
            "Consider upgrading your plan for better performance",
            "Limit the number of connected devices during important tasks",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_ordering() {
        assert!(Rating::APlus > Rating::A);
        assert!(Rating::A > Rating::BPlus);
        assert!(Rating::BPlus > Rating::B);
    }

    #[test]
    fn test_rating_is_at_least() {
        assert!(Rating::APlus.is_at_least(Rating::A));
        assert!(Rating::BPlus.is_at_least(Rating::BPlus));
        assert!(!Rating::B.is_at_least(Rating::BPlus));
    }

    #[test]
    fn test_rating_labels() {
        assert_eq!(Rating::APlus.label(), "A+");
        assert_eq!(Rating::A.label(), "A");
        assert_eq!(Rating::BPlus.label(), "B+");
        assert_eq!(Rating::B.label(), "B");
    }

    #[test]
    fn test_rating_descriptions() {
        assert_eq!(Rating::APlus.description(), "excellent");
        assert_eq!(Rating::A.description(), "very good");
        assert_eq!(Rating::BPlus.description(), "good");
        assert_eq!(Rating::B.description(), "decent");
    }

    #[test]
    fn test_tier_rules() {
        assert_eq!(tier(60.0, 5.0), Rating::APlus);
        assert_eq!(tier(35.0, 15.0), Rating::A);
        assert_eq!(tier(15.0, 25.0), Rating::BPlus);
        assert_eq!(tier(5.0, 35.0), Rating::B);
    }

    #[test]
    fn test_tier_first_match_wins() {
        // Fast download but ping too high for A+, matches A instead
        assert_eq!(tier(95.2, 15.3), Rating::A);
        // Fast download, ping misses every ceiling
        assert_eq!(tier(95.2, 45.0), Rating::B);
    }

    #[test]
    fn test_tier_boundaries_are_exclusive() {
        // Exactly 50 Mbps does not clear the A+ download floor
        assert_eq!(tier(50.0, 5.0), Rating::A);
        // Exactly 10 ms does not clear the A+ ping ceiling
        assert_eq!(tier(60.0, 10.0), Rating::A);
        assert_eq!(tier(10.0, 5.0), Rating::B);
    }

    #[test]
    fn test_comparison_percentile_buckets() {
        assert_eq!(comparison_percentile(90.0), 99);
        assert_eq!(comparison_percentile(80.0), 95);
        assert_eq!(comparison_percentile(60.0), 95);
        assert_eq!(comparison_percentile(40.0), 85);
        assert_eq!(comparison_percentile(20.0), 70);
        assert_eq!(comparison_percentile(5.0), 50);
    }

    #[test]
    fn test_comparison_can_disagree_with_tier() {
        // download=60, ping=25: tier B+ but comparison 95%
        let assessment = rate(60.0, 25.0);
        assert_eq!(assessment.rating, Rating::BPlus);
        assert_eq!(assessment.comparison_percentile, 95);
    }

    #[test]
    fn test_comparison_text() {
        let assessment = rate(90.0, 5.0);
        assert_eq!(
            assessment.comparison_text(),
            "faster than 99% of tested connections"
        );
    }

    #[test]
    fn test_recommendations_never_empty() {
        for download in [0.0, 5.0, 15.0, 35.0, 75.0, 200.0] {
            let assessment = rate(download, 20.0);
            assert!(!assessment.recommendations.is_empty());
        }
    }

    #[test]
    fn test_recommendation_buckets() {
        assert_eq!(rate(75.0, 5.0).recommendations.len(), 4);
        assert_eq!(rate(40.0, 5.0).recommendations.len(), 3);
        assert!(rate(5.0, 5.0).recommendations[0].contains("struggle"));
    }

    #[test]
    fn test_rating_serde_labels() {
        let json = serde_json::to_string(&Rating::APlus).unwrap();
        assert_eq!(json, "\"A+\"");
        let parsed: Rating = serde_json::from_str("\"B+\"").unwrap();
        assert_eq!(parsed, Rating::BPlus);
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: the tier is total and deterministic over real inputs.
        #[test]
        fn tier_is_total_and_deterministic(
            download_mbps in 0.0f64..1000.0f64,
            ping_ms in 0.0f64..500.0f64,
        ) {
            let first = rate(download_mbps, ping_ms);
            let second = rate(download_mbps, ping_ms);
            prop_assert_eq!(first.rating, second.rating);
            prop_assert_eq!(
                first.comparison_percentile,
                second.comparison_percentile
            );
            prop_assert!(!first.recommendations.is_empty());
        }

        /// Property: more download speed never lowers the tier when ping
        /// is held fixed.
        #[test]
        fn more_download_never_lowers_tier(
            base_download in 0.0f64..200.0f64,
            improvement in 0.1f64..200.0f64,
            ping_ms in 0.0f64..100.0f64,
        ) {
            let base = tier(base_download, ping_ms);
            let improved = tier(base_download + improvement, ping_ms);
            prop_assert!(
                improved >= base,
                "tier went from {:?} to {:?} when download improved",
                base,
                improved
            );
        }

        /// Property: lower ping never lowers the tier when download is
        /// held fixed.
        #[test]
        fn lower_ping_never_lowers_tier(
            download_mbps in 0.0f64..200.0f64,
            base_ping in 1.0f64..200.0f64,
            reduction in 0.1f64..100.0f64,
        ) {
            let improved_ping = (base_ping - reduction).max(0.0);
            let base = tier(download_mbps, base_ping);
            let improved = tier(download_mbps, improved_ping);
            prop_assert!(improved >= base);
        }

        /// Property: the comparison percentile only ever takes the five
        /// documented values and is monotone in download speed.
        #[test]
        fn comparison_percentile_is_step_function(
            download_mbps in 0.0f64..500.0f64,
            improvement in 0.0f64..500.0f64,
        ) {
            let p = comparison_percentile(download_mbps);
            prop_assert!([50u8, 70, 85, 95, 99].contains(&p));
            prop_assert!(comparison_percentile(download_mbps + improvement) >= p);
        }
    }
}
