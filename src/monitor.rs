use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::pose::LandmarkFrame;
use crate::reba::{AssessmentContext, AssessmentResult, Assessor};
use crate::session::FrameSlot;

/// 評価の駆動方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessMode {
    /// フレームごとに評価し、最新結果だけを残す
    #[default]
    Continuous,
    /// 要求時に最新フレームを 1 回だけ評価する
    Snapshot,
}

impl FromStr for AssessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" | "c" => Ok(AssessMode::Continuous),
            "snapshot" | "s" => Ok(AssessMode::Snapshot),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// Assessor をフレーム到着と結び付ける
///
/// 結果は `Arc` ごと差し替えるので、読み手が途中状態を見ることはない。
pub struct Monitor {
    assessor: Assessor,
    mode: AssessMode,
    slot: FrameSlot,
    latest: Mutex<Option<Arc<AssessmentResult>>>,
}

impl Monitor {
    pub fn new(assessor: Assessor, mode: AssessMode, slot: FrameSlot) -> Self {
        Self {
            assessor,
            mode,
            slot,
            latest: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> AssessMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AssessMode) {
        self.mode = mode;
    }

    /// フレーム到着時に呼ぶ。continuous モードなら評価して返す
    pub fn on_frame(
        &self,
        frame: &LandmarkFrame,
        context: &AssessmentContext,
    ) -> Option<Arc<AssessmentResult>> {
        match self.mode {
            AssessMode::Continuous => Some(self.store(self.assessor.evaluate(frame, context))),
            AssessMode::Snapshot => None,
        }
    }

    /// スロットの最新フレームを評価する。フレームが無ければ None
    pub fn snapshot(&self, context: &AssessmentContext) -> Option<Arc<AssessmentResult>> {
        let Some(frame) = self.slot.latest() else {
            tracing::warn!("snapshot requested before any frame arrived");
            return None;
        };
        Some(self.store(self.assessor.evaluate(&frame, context)))
    }

    /// 直近に公開された結果
    pub fn latest(&self) -> Option<Arc<AssessmentResult>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, result: AssessmentResult) -> Arc<AssessmentResult> {
        let result = Arc::new(result);
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&result));
        result
    }
}
