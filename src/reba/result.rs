use std::fmt;

use serde::{Deserialize, Serialize};

use super::modifier::{sanitize_weight, ActivityType};
use super::risk::RiskLevel;
use super::segment::Segment;

/// 評価ごとに外部から与えられる条件
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AssessmentContext {
    pub object_weight_kg: f32,
    pub activity: ActivityType,
}

impl AssessmentContext {
    pub fn new(object_weight_kg: f32, activity: ActivityType) -> Self {
        Self {
            object_weight_kg: sanitize_weight(object_weight_kg),
            activity,
        }
    }
}

/// 部位ごとの採点結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentScore {
    pub segment: Segment,
    /// Load / Activity では None
    pub angle_deg: Option<f32>,
    pub points: u32,
    pub advice: String,
}

/// 1 フレーム分の評価結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub total_score: u32,
    pub risk_level: RiskLevel,
    /// neck → back → arm → leg → load → activity の順
    pub segments: Vec<SegmentScore>,
    pub overall_advice: String,
}

impl AssessmentResult {
    pub fn segment(&self, segment: Segment) -> Option<&SegmentScore> {
        self.segments.iter().find(|s| s.segment == segment)
    }
}

impl fmt::Display for AssessmentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score: {}  risk: {}", self.total_score, self.risk_level)?;
        writeln!(f, "advice: {}", self.overall_advice)?;
        for s in &self.segments {
            match s.angle_deg {
                Some(angle) => writeln!(
                    f,
                    "  {}: {:.1}° (points {}) {}",
                    s.segment, angle, s.points, s.advice
                )?,
                None => writeln!(f, "  {}", s.advice)?,
            }
        }
        Ok(())
    }
}
