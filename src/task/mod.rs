pub mod gait;
pub mod jump;
pub mod one_leg;
pub mod raise_hand;
pub mod squat;
pub mod tiptoe;

pub use gait::{GaitClassifier, GaitState};
pub use jump::{JumpClassifier, JumpPhase, JumpState};
pub use one_leg::{OneLegClassifier, OneLegState};
pub use raise_hand::{RaiseHandClassifier, RaiseHandState};
pub use squat::{SquatClassifier, SquatDepth, SquatState};
pub use tiptoe::{TiptoeClassifier, TiptoeState};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::pose::{LandmarkIndex, Pose};

/// フレームごとの判定結果の重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Success,
}

/// メトリクスの値。数値または区分名
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f32),
    Text(String),
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Number(v)
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Number(v as f32)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Number(if v { 1.0 } else { 0.0 })
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

/// 1課題分の累積メトリクス
/// キー名と単位は外部のセッション集計層が読むため安定契約
pub type Metrics = BTreeMap<String, MetricValue>;

/// フレームごとに外部へ返す判定結果
#[derive(Debug, Clone, Serialize)]
pub struct TaskUpdate {
    pub message: String,
    pub level: Level,
    /// 課題の進捗 0.0〜1.0
    pub progress: f32,
    pub metrics: Metrics,
    pub done: bool,
}

impl TaskUpdate {
    pub fn new(message: impl Into<String>, level: Level, progress: f32, metrics: Metrics, done: bool) -> Self {
        Self {
            message: message.into(),
            level,
            progress: progress.clamp(0.0, 1.0),
            metrics,
            done,
        }
    }
}

/// 課題開始時に1回だけ取得する立位基準値
/// 以後のフレームでは読み取り専用
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    /// 立位での両足首の平均y（正規化座標、下が大）
    pub ankle_y: f32,
    /// 立位での推定重心（腰中点）のy
    pub com_y: f32,
}

impl Baseline {
    /// 立位ポーズから基準値を取得する。必要なランドマークが見えなければ None
    pub fn capture(pose: &Pose, visibility: f32) -> Option<Self> {
        let la = pose.get(LandmarkIndex::LeftAnkle);
        let ra = pose.get(LandmarkIndex::RightAnkle);
        if !la.is_visible(visibility) || !ra.is_visible(visibility) {
            return None;
        }
        let (_, com_y) = pose.center_of_mass(visibility)?;
        Some(Self {
            ankle_y: (la.y + ra.y) / 2.0,
            com_y,
        })
    }
}

/// 実行中の課題。分類器（閾値のみ保持）と呼び出し側所有の状態のペア
///
/// 分類器自体は毎フレームの純粋な計算で、履歴はすべてstate側にある
/// 課題の中断はこの値を捨てるだけでよい（解放すべき資源はない）
pub enum Task {
    RaiseHand(RaiseHandClassifier, RaiseHandState),
    OneLeg(OneLegClassifier, OneLegState),
    Gait(GaitClassifier, GaitState),
    Jump(JumpClassifier, JumpState),
    Tiptoe(TiptoeClassifier, TiptoeState),
    Squat(SquatClassifier, SquatState),
}

impl Task {
    pub fn raise_hand(config: &Config) -> Self {
        Task::RaiseHand(
            RaiseHandClassifier::from_config(config),
            RaiseHandState::default(),
        )
    }

    pub fn one_leg(config: &Config) -> Self {
        Task::OneLeg(OneLegClassifier::from_config(config), OneLegState::default())
    }

    pub fn gait(config: &Config) -> Self {
        Task::Gait(GaitClassifier::from_config(config), GaitState::default())
    }

    pub fn jump(config: &Config, baseline: Baseline) -> Self {
        Task::Jump(JumpClassifier::from_config(config), JumpState::new(baseline))
    }

    pub fn tiptoe(config: &Config, baseline: Baseline) -> Self {
        Task::Tiptoe(
            TiptoeClassifier::from_config(config),
            TiptoeState::new(baseline),
        )
    }

    pub fn squat(config: &Config) -> Self {
        Task::Squat(SquatClassifier::from_config(config), SquatState::default())
    }

    /// 名前から課題を構築（replayバイナリ用）
    pub fn by_name(name: &str, config: &Config, baseline: Option<Baseline>) -> Option<Self> {
        match name {
            "raise_hand" => Some(Self::raise_hand(config)),
            "one_leg" => Some(Self::one_leg(config)),
            "gait" => Some(Self::gait(config)),
            "jump" => baseline.map(|b| Self::jump(config, b)),
            "tiptoe" => baseline.map(|b| Self::tiptoe(config, b)),
            "squat" => Some(Self::squat(config)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Task::RaiseHand(..) => "raise_hand",
            Task::OneLeg(..) => "one_leg",
            Task::Gait(..) => "gait",
            Task::Jump(..) => "jump",
            Task::Tiptoe(..) => "tiptoe",
            Task::Squat(..) => "squat",
        }
    }

    /// 1フレーム分を評価する
    ///
    /// dtは前フレームからの経過秒。呼び出し側は同一課題の直前フレームの
    /// 状態をそのまま渡すこと（順序が乱れると有限差分が無意味になる）
    pub fn update(&mut self, pose: &Pose, dt: f32) -> TaskUpdate {
        match self {
            Task::RaiseHand(c, s) => c.update(pose, dt, s),
            Task::OneLeg(c, s) => c.update(pose, dt, s),
            Task::Gait(c, s) => c.update(pose, dt, s),
            Task::Jump(c, s) => c.update(pose, dt, s),
            Task::Tiptoe(c, s) => c.update(pose, dt, s),
            Task::Squat(c, s) => c.update(pose, dt, s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::test_util::standing_pose;

    #[test]
    fn test_baseline_capture() {
        let baseline = Baseline::capture(&standing_pose(), 0.5).unwrap();
        assert!((baseline.ankle_y - 0.90).abs() < 1e-5);
        assert!((baseline.com_y - 0.52).abs() < 1e-5);
    }

    #[test]
    fn test_baseline_capture_missing_ankles() {
        let pose = Pose::default();
        assert!(Baseline::capture(&pose, 0.5).is_none());
    }

    #[test]
    fn test_task_by_name() {
        let config = Config::default();
        let baseline = Baseline::capture(&standing_pose(), 0.5);
        assert!(Task::by_name("raise_hand", &config, None).is_some());
        assert!(Task::by_name("jump", &config, None).is_none());
        assert!(Task::by_name("jump", &config, baseline).is_some());
        assert!(Task::by_name("unknown", &config, None).is_none());
    }

    #[test]
    fn test_progress_clamped() {
        let u = TaskUpdate::new("", Level::Info, 3.5, Metrics::new(), false);
        assert_eq!(u.progress, 1.0);
        let u = TaskUpdate::new("", Level::Info, -0.5, Metrics::new(), false);
        assert_eq!(u.progress, 0.0);
    }

    #[test]
    fn test_metric_value_json() {
        let mut metrics = Metrics::new();
        metrics.insert("hold_time".into(), 2.5_f32.into());
        metrics.insert("lifted_leg".into(), "left".into());
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("2.5"));
        assert!(json.contains("\"left\""));
    }
}
