use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;
use crate::monitor::AssessMode;
use crate::reba::{ActivityRule, BodySide, LoadRule, RiskThresholds, SegmentRule};
use crate::session::CameraFacing;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// 採点テーブル。閾値はすべてここで差し替えられる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// 採点する体の側
    #[serde(default)]
    pub side: BodySide,
    /// これ未満の可視度のランドマークは欠損扱い
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f32,
    #[serde(default = "SegmentRule::neck", deserialize_with = "SegmentRule::deserialize_neck")]
    pub neck: SegmentRule,
    #[serde(default = "SegmentRule::back", deserialize_with = "SegmentRule::deserialize_back")]
    pub back: SegmentRule,
    #[serde(default = "SegmentRule::arm", deserialize_with = "SegmentRule::deserialize_arm")]
    pub arm: SegmentRule,
    #[serde(default = "SegmentRule::leg", deserialize_with = "SegmentRule::deserialize_leg")]
    pub leg: SegmentRule,
    #[serde(default)]
    pub load: LoadRule,
    #[serde(default)]
    pub activity: ActivityRule,
    #[serde(default)]
    pub risk: RiskThresholds,
}

fn default_min_visibility() -> f32 { 0.5 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            side: BodySide::default(),
            min_visibility: default_min_visibility(),
            neck: SegmentRule::neck(),
            back: SegmentRule::back(),
            arm: SegmentRule::arm(),
            leg: SegmentRule::leg(),
            load: LoadRule::default(),
            activity: ActivityRule::default(),
            risk: RiskThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// "continuous" or "snapshot"
    #[serde(default)]
    pub mode: AssessMode,
    /// 起動時のカメラ ("front" / "back")
    #[serde(default)]
    pub camera: CameraFacing,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: AssessMode::default(),
            camera: CameraFacing::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_listen_addr() -> String { "0.0.0.0:9100".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// RUST_LOG が無いときのフィルタ
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LogConfig {
    /// stderr に tracing を出す。RUST_LOG があればそちらを優先
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// 設定の読み込み元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// ファイルが無かったのでデフォルト
    Defaults,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// ファイルが無ければデフォルト。パース・検証エラーはそのまま返す
    ///
    /// ロガーはまだ初期化されていないので、読み込み元のログは呼び出し側が出す
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<(Self, ConfigSource), ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok((config, ConfigSource::File)),
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((Self::default(), ConfigSource::Defaults))
            }
            Err(e) => Err(e),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scoring = &self.scoring;
        if !(0.0..=1.0).contains(&scoring.min_visibility) {
            return Err(ConfigError::Invalid(format!(
                "scoring.min_visibility must be within [0, 1], got {}",
                scoring.min_visibility
            )));
        }
        if !scoring.risk.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "scoring.risk thresholds must be strictly increasing and positive: {:?}",
                scoring.risk
            )));
        }
        let mut prev = 0.0;
        for band in &scoring.load.bands {
            if !band.max_kg.is_finite() || band.max_kg <= prev {
                return Err(ConfigError::Invalid(format!(
                    "scoring.load.bands must have increasing positive max_kg, got {}",
                    band.max_kg
                )));
            }
            prev = band.max_kg;
        }
        for (name, rule) in [
            ("neck", &scoring.neck),
            ("back", &scoring.back),
            ("arm", &scoring.arm),
            ("leg", &scoring.leg),
        ] {
            if rule.bands.iter().any(|b| b.below.is_none() && b.above.is_none()) {
                return Err(ConfigError::Invalid(format!(
                    "scoring.{}: every band needs `below` or `above`",
                    name
                )));
            }
        }
        Ok(())
    }
}
