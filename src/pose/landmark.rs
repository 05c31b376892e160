use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FrameError;

/// BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 奥行き（角度計算では使わない）
    #[serde(default)]
    pub z: f32,
    /// 可視度 (0.0〜1.0)。モデルが出さない場合は None
    #[serde(default)]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: None,
        }
    }

    pub fn with_visibility(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: Some(visibility),
        }
    }

    /// 座標が有限で、可視度が閾値以上か（可視度なしは可視扱い）
    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.visibility.map_or(true, |v| v >= min_visibility)
    }
}

/// 33 スロットからなるランドマークフレーム。欠損スロットは None
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkFrame {
    slots: Vec<Option<Landmark>>,
}

/// スロット数は `from_slots` で検証する
impl<'de> Deserialize<'de> for LandmarkFrame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Slots {
            slots: Vec<Option<Landmark>>,
        }

        let raw = Slots::deserialize(deserializer)?;
        Self::from_slots(raw.slots).map_err(serde::de::Error::custom)
    }
}

impl LandmarkFrame {
    /// 全スロット欠損のフレーム
    pub fn empty() -> Self {
        Self {
            slots: vec![None; LandmarkIndex::COUNT],
        }
    }

    /// スロット列から作成。スロット数が 33 でなければ Malformed
    pub fn from_slots(slots: Vec<Option<Landmark>>) -> Result<Self, FrameError> {
        if slots.len() != LandmarkIndex::COUNT {
            return Err(FrameError::Malformed {
                expected: LandmarkIndex::COUNT,
                actual: slots.len(),
            });
        }
        Ok(Self { slots })
    }

    pub fn get(&self, index: LandmarkIndex) -> Option<&Landmark> {
        self.slots[index as usize].as_ref()
    }

    pub fn set(&mut self, index: LandmarkIndex, landmark: Landmark) {
        self.slots[index as usize] = Some(landmark);
    }

    pub fn clear(&mut self, index: LandmarkIndex) {
        self.slots[index as usize] = None;
    }

    /// 可視判定を通ったランドマークのみ返す
    pub fn visible(&self, index: LandmarkIndex, min_visibility: f32) -> Option<&Landmark> {
        self.get(index).filter(|lm| lm.is_visible(min_visibility))
    }

    pub fn slots(&self) -> &[Option<Landmark>] {
        &self.slots
    }
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self::empty()
    }
}

/// 姿勢推定プロバイダが返す生のランドマーク。
/// 欠けたフィールドや数値でない値を許容し、境界で `Landmark` に変換する
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLandmark {
    #[serde(default)]
    pub x: Option<serde_json::Value>,
    #[serde(default)]
    pub y: Option<serde_json::Value>,
    #[serde(default)]
    pub z: Option<serde_json::Value>,
    #[serde(default)]
    pub visibility: Option<serde_json::Value>,
}

fn as_f32(value: &Option<serde_json::Value>) -> Option<f32> {
    value.as_ref().and_then(|v| v.as_f64()).map(|v| v as f32)
}

impl RawLandmark {
    /// x, y が数値でなければスロット欠損として扱う
    pub fn into_landmark(self) -> Option<Landmark> {
        let x = as_f32(&self.x)?;
        let y = as_f32(&self.y)?;
        Some(Landmark {
            x,
            y,
            z: as_f32(&self.z).unwrap_or(0.0),
            visibility: as_f32(&self.visibility),
        })
    }
}

impl TryFrom<Vec<Option<RawLandmark>>> for LandmarkFrame {
    type Error = FrameError;

    fn try_from(raw: Vec<Option<RawLandmark>>) -> Result<Self, Self::Error> {
        let slots = raw
            .into_iter()
            .map(|slot| slot.and_then(RawLandmark::into_landmark))
            .collect();
        Self::from_slots(slots)
    }
}

/// JSON 配列（33 要素、各要素はオブジェクトか null）からフレームを作る
pub fn frame_from_json(json: &str) -> Result<LandmarkFrame, FrameError> {
    let raw: Vec<Option<RawLandmark>> =
        serde_json::from_str(json).map_err(|e| FrameError::Decode(e.to_string()))?;
    LandmarkFrame::try_from(raw)
}
