use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry;
use crate::pose::{LandmarkFrame, LandmarkIndex};

use super::result::SegmentScore;

/// スコア対象の部位。Load / Activity は角度を持たない擬似部位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Neck,
    Back,
    Arm,
    Leg,
    Load,
    Activity,
}

impl Segment {
    pub fn name(&self) -> &'static str {
        match self {
            Segment::Neck => "neck",
            Segment::Back => "back",
            Segment::Arm => "arm",
            Segment::Leg => "leg",
            Segment::Load => "load",
            Segment::Activity => "activity",
        }
    }

    /// 角度計算に使う (端点, 頂点, 端点)
    pub fn triple(&self, side: BodySide) -> Option<[LandmarkIndex; 3]> {
        use LandmarkIndex::*;
        let (shoulder, other_shoulder, elbow, wrist, hip, knee, ankle) = match side {
            BodySide::Left => (
                LeftShoulder,
                RightShoulder,
                LeftElbow,
                LeftWrist,
                LeftHip,
                LeftKnee,
                LeftAnkle,
            ),
            BodySide::Right => (
                RightShoulder,
                LeftShoulder,
                RightElbow,
                RightWrist,
                RightHip,
                RightKnee,
                RightAnkle,
            ),
        };
        match self {
            Segment::Neck => Some([Nose, shoulder, other_shoulder]),
            Segment::Back => Some([shoulder, hip, knee]),
            Segment::Arm => Some([shoulder, elbow, wrist]),
            Segment::Leg => Some([hip, knee, ankle]),
            Segment::Load | Segment::Activity => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 採点に使う体の側
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodySide {
    #[default]
    Left,
    Right,
}

/// 角度帯。`angle < below` または `angle > above` で一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f32>,
    pub points: u32,
    /// None なら部位の ok_advice を使う
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

impl Band {
    pub fn outside(below: f32, above: f32, points: u32) -> Self {
        Self {
            below: Some(below),
            above: Some(above),
            points,
            advice: None,
        }
    }

    pub fn below(below: f32, points: u32) -> Self {
        Self {
            below: Some(below),
            above: None,
            points,
            advice: None,
        }
    }

    pub fn with_advice(mut self, advice: &str) -> Self {
        self.advice = Some(advice.to_string());
        self
    }

    pub fn matches(&self, angle: f32) -> bool {
        self.below.map_or(false, |b| angle < b) || self.above.map_or(false, |a| angle > a)
    }
}

/// 1 部位分の閾値テーブル
///
/// `bands` は厳しい順に評価し、最初に一致した帯を採用する。
/// どの帯にも一致しなければ `default_points` と `ok_advice`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRule {
    #[serde(default)]
    pub default_points: u32,
    #[serde(default = "default_ok_advice")]
    pub ok_advice: String,
    #[serde(default)]
    pub bands: Vec<Band>,
}

fn default_ok_advice() -> String { "posture acceptable".to_string() }

impl SegmentRule {
    pub fn neck() -> Self {
        Self {
            default_points: 0,
            ok_advice: "neck posture acceptable".to_string(),
            bands: vec![
                Band::outside(40.0, 140.0, 2)
                    .with_advice("excessive flexion/extension, realign to neutral"),
                Band::outside(60.0, 120.0, 1),
            ],
        }
    }

    pub fn back() -> Self {
        Self {
            default_points: 1,
            ok_advice: "back within safe range".to_string(),
            bands: vec![
                Band::below(140.0, 3).with_advice("excessive trunk flexion, straighten back"),
                Band::below(160.0, 2),
            ],
        }
    }

    pub fn arm() -> Self {
        Self {
            default_points: 0,
            ok_advice: "arm posture normal".to_string(),
            bands: vec![Band::outside(60.0, 120.0, 2)
                .with_advice("arm over-flexed/extended, keep mid-range")],
        }
    }

    pub fn leg() -> Self {
        Self {
            default_points: 0,
            ok_advice: "leg posture good".to_string(),
            bands: vec![Band::below(160.0, 2).with_advice("leg may be bent, straighten for stability")],
        }
    }

    /// 角度 → (点数, アドバイス)
    pub fn score(&self, angle: f32) -> (u32, &str) {
        match self.bands.iter().find(|band| band.matches(angle)) {
            Some(band) => (
                band.points,
                band.advice.as_deref().unwrap_or(self.ok_advice.as_str()),
            ),
            None => (self.default_points, self.ok_advice.as_str()),
        }
    }
}

/// 設定ファイル上の部位テーブル。省略したフィールドはその部位のデフォルトを引き継ぐ
#[derive(Debug, Default, Deserialize)]
struct SegmentRulePatch {
    default_points: Option<u32>,
    ok_advice: Option<String>,
    bands: Option<Vec<Band>>,
}

impl SegmentRulePatch {
    fn apply(self, base: SegmentRule) -> SegmentRule {
        SegmentRule {
            default_points: self.default_points.unwrap_or(base.default_points),
            ok_advice: self.ok_advice.unwrap_or(base.ok_advice),
            bands: self.bands.unwrap_or(base.bands),
        }
    }
}

impl SegmentRule {
    pub(crate) fn deserialize_neck<'de, D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(SegmentRulePatch::deserialize(d)?.apply(Self::neck()))
    }

    pub(crate) fn deserialize_back<'de, D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(SegmentRulePatch::deserialize(d)?.apply(Self::back()))
    }

    pub(crate) fn deserialize_arm<'de, D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(SegmentRulePatch::deserialize(d)?.apply(Self::arm()))
    }

    pub(crate) fn deserialize_leg<'de, D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(SegmentRulePatch::deserialize(d)?.apply(Self::leg()))
    }
}

/// 部位を採点する。三点のいずれかが欠損なら None（出力にも載せない）
pub fn score_segment(
    segment: Segment,
    rule: &SegmentRule,
    frame: &LandmarkFrame,
    side: BodySide,
    min_visibility: f32,
) -> Option<SegmentScore> {
    let [a, b, c] = segment.triple(side)?;
    let a = frame.visible(a, min_visibility)?;
    let b = frame.visible(b, min_visibility)?;
    let c = frame.visible(c, min_visibility)?;

    let angle = geometry::angle(a, b, c);
    let (points, advice) = rule.score(angle);
    Some(SegmentScore {
        segment,
        angle_deg: Some(angle),
        points,
        advice: advice.to_string(),
    })
}
