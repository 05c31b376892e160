use std::fmt;

use serde::{Deserialize, Serialize};

use super::result::SegmentScore;
use super::segment::Segment;

/// 重量帯（上限を含む）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBand {
    pub max_kg: f32,
    pub points: u32,
}

/// 持ち上げる物の重量 → 点数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRule {
    /// 最後の帯より重い場合の点数
    #[serde(default = "default_over_points")]
    pub over_points: u32,
    #[serde(default = "default_load_bands")]
    pub bands: Vec<LoadBand>,
}

fn default_over_points() -> u32 { 3 }
fn default_load_bands() -> Vec<LoadBand> {
    vec![
        LoadBand { max_kg: 5.0, points: 1 },
        LoadBand { max_kg: 10.0, points: 2 },
    ]
}

impl Default for LoadRule {
    fn default() -> Self {
        Self {
            over_points: default_over_points(),
            bands: default_load_bands(),
        }
    }
}

impl LoadRule {
    pub fn points(&self, weight_kg: f32) -> u32 {
        let weight_kg = sanitize_weight(weight_kg);
        if weight_kg <= 0.0 {
            return 0;
        }
        self.bands
            .iter()
            .find(|band| weight_kg <= band.max_kg)
            .map_or(self.over_points, |band| band.points)
    }

    /// 重量 > 0 のときだけ詳細行を出す
    pub fn score(&self, weight_kg: f32) -> Option<SegmentScore> {
        let weight_kg = sanitize_weight(weight_kg);
        if weight_kg <= 0.0 {
            return None;
        }
        let points = self.points(weight_kg);
        Some(SegmentScore {
            segment: Segment::Load,
            angle_deg: None,
            points,
            advice: format!("load: {} kg (points {})", weight_kg, points),
        })
    }
}

/// NaN と 0 以下は 0 kg。+inf（f32 を超える入力を含む）は f32::MAX に丸める
pub fn sanitize_weight(weight_kg: f32) -> f32 {
    if weight_kg.is_nan() || weight_kg <= 0.0 {
        0.0
    } else {
        weight_kg.min(f32::MAX)
    }
}

/// 入力欄の文字列から重量を読む。数値でなければ 0
pub fn parse_weight(input: &str) -> f32 {
    input.trim().parse::<f32>().map(sanitize_weight).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    #[default]
    None,
    Bending,
    Lifting,
}

impl ActivityType {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::None => "none",
            ActivityType::Bending => "bending",
            ActivityType::Lifting => "lifting",
        }
    }

    /// 英語名（大文字小文字を区別しない）と、タイ語ラベル "ก้ม" / "ยกของ" を受け付ける
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        match label.to_ascii_lowercase().as_str() {
            "" | "none" => Some(ActivityType::None),
            "bending" | "bend" => Some(ActivityType::Bending),
            "lifting" | "lift" => Some(ActivityType::Lifting),
            _ => match label {
                "ก้ม" => Some(ActivityType::Bending),
                "ยกของ" => Some(ActivityType::Lifting),
                _ => None,
            },
        }
    }

    /// 不明なラベルは None 扱い（評価は止めない）
    pub fn parse_lenient(label: &str) -> Self {
        Self::from_label(label).unwrap_or_else(|| {
            tracing::warn!(label, "unrecognized activity label, treating as none");
            ActivityType::None
        })
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 作業内容 → 点数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRule {
    #[serde(default = "default_activity_points")]
    pub bending_points: u32,
    #[serde(default = "default_activity_points")]
    pub lifting_points: u32,
}

fn default_activity_points() -> u32 { 1 }

impl Default for ActivityRule {
    fn default() -> Self {
        Self {
            bending_points: default_activity_points(),
            lifting_points: default_activity_points(),
        }
    }
}

impl ActivityRule {
    pub fn points(&self, activity: ActivityType) -> u32 {
        match activity {
            ActivityType::None => 0,
            ActivityType::Bending => self.bending_points,
            ActivityType::Lifting => self.lifting_points,
        }
    }

    /// 0 点でも必ず詳細行を出す
    pub fn score(&self, activity: ActivityType) -> SegmentScore {
        let points = self.points(activity);
        SegmentScore {
            segment: Segment::Activity,
            angle_deg: None,
            points,
            advice: format!("activity: {} (points {})", activity, points),
        }
    }
}
