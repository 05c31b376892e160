use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "veryHigh",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            RiskLevel::Low => "posture is good, maintain it",
            RiskLevel::Medium => "minor adjustment needed, straighten back and reduce bending",
            RiskLevel::High => "risk emerging, adjust posture while lifting",
            RiskLevel::VeryHigh => "high risk — change posture or use mechanical assistance",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 各リスクレベルの下限スコア
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(default = "default_medium")]
    pub medium: u32,
    #[serde(default = "default_high")]
    pub high: u32,
    #[serde(default = "default_very_high")]
    pub very_high: u32,
}

fn default_medium() -> u32 { 4 }
fn default_high() -> u32 { 6 }
fn default_very_high() -> u32 { 8 }

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: default_medium(),
            high: default_high(),
            very_high: default_very_high(),
        }
    }
}

impl RiskThresholds {
    pub fn classify(&self, score: u32) -> RiskLevel {
        if score >= self.very_high {
            RiskLevel::VeryHigh
        } else if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn is_valid(&self) -> bool {
        0 < self.medium && self.medium < self.high && self.high < self.very_high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let t = RiskThresholds::default();
        assert_eq!(t.classify(0), RiskLevel::Low);
        assert_eq!(t.classify(3), RiskLevel::Low);
        assert_eq!(t.classify(4), RiskLevel::Medium);
        assert_eq!(t.classify(5), RiskLevel::Medium);
        assert_eq!(t.classify(6), RiskLevel::High);
        assert_eq!(t.classify(7), RiskLevel::High);
        assert_eq!(t.classify(8), RiskLevel::VeryHigh);
        assert_eq!(t.classify(40), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_classify_non_decreasing() {
        let t = RiskThresholds::default();
        let mut prev = RiskLevel::Low;
        for score in 0..30 {
            let level = t.classify(score);
            assert!(level >= prev);
            prev = level;
        }
    }

    #[test]
    fn test_advice_per_level() {
        assert_eq!(RiskLevel::Low.advice(), "posture is good, maintain it");
        assert_eq!(
            RiskLevel::VeryHigh.advice(),
            "high risk — change posture or use mechanical assistance"
        );
        assert_eq!(RiskLevel::VeryHigh.to_string(), "veryHigh");
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(RiskThresholds::default().is_valid());
        let bad = RiskThresholds { medium: 6, high: 6, very_high: 8 };
        assert!(!bad.is_valid());
    }
}
