use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::pose::LandmarkFrame;

/// 最新フレームを 1 枚だけ保持するスロット。
/// プロバイダ側とセッション側で clone して共有する
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    latest: Arc<Mutex<Option<LandmarkFrame>>>,
    frame_id: Arc<AtomicU64>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 前のフレームは上書きされる（キューしない）
    pub fn publish(&self, frame: LandmarkFrame) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
        self.frame_id.fetch_add(1, Ordering::Release);
    }

    /// 新フレームが届くたびにインクリメントされる
    pub fn frame_id(&self) -> u64 {
        self.frame_id.load(Ordering::Acquire)
    }

    /// 最新フレームのコピー。何度でも取得できる
    pub fn latest(&self) -> Option<LandmarkFrame> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

impl CameraFacing {
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Front => CameraFacing::Back,
            CameraFacing::Back => CameraFacing::Front,
        }
    }
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraFacing::Front => f.write_str("front"),
            CameraFacing::Back => f.write_str("back"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing(CameraFacing),
    Stopped,
}

/// カメラ取得の状態。実際のストリームは外側が持ち、ここは遷移とフレームスロットだけ管理する
#[derive(Debug)]
pub struct CaptureSession {
    state: SessionState,
    facing: CameraFacing,
    slot: FrameSlot,
}

impl CaptureSession {
    pub fn new(facing: CameraFacing) -> Self {
        Self {
            state: SessionState::Idle,
            facing,
            slot: FrameSlot::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, SessionState::Capturing(_))
    }

    /// プロバイダに渡すスロットのハンドル
    pub fn slot(&self) -> &FrameSlot {
        &self.slot
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Stopped => {
                self.state = SessionState::Capturing(self.facing);
                tracing::info!(camera = %self.facing, "capture started");
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                action: "start",
                state,
            }),
        }
    }

    /// カメラを切り替える。前のカメラのフレームは無効になる
    pub fn switch_camera(&mut self) -> Result<CameraFacing, SessionError> {
        match self.state {
            SessionState::Capturing(current) => {
                let next = current.toggled();
                self.slot.clear();
                self.facing = next;
                self.state = SessionState::Capturing(next);
                tracing::info!(camera = %next, "camera switched");
                Ok(next)
            }
            state => Err(SessionError::InvalidTransition {
                action: "switch camera",
                state,
            }),
        }
    }

    pub fn stop(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Capturing(_) => {
                self.slot.clear();
                self.state = SessionState::Stopped;
                tracing::info!("capture stopped");
                Ok(())
            }
            state => Err(SessionError::InvalidTransition {
                action: "stop",
                state,
            }),
        }
    }

    /// 取得中のみフレームを受け付ける
    pub fn accept(&self, frame: LandmarkFrame) -> bool {
        if !self.is_capturing() {
            tracing::debug!(state = ?self.state, "frame dropped, session not capturing");
            return false;
        }
        self.slot.publish(frame);
        true
    }
}
