use tracing::debug;

use super::{Level, Metrics, TaskUpdate};
use crate::config::{Config, RaiseHandConfig};
use crate::measure::trunk::{back_compensation, BackCompensation};
use crate::measure::{arms, Side};
use crate::metrics::Symmetry;
use crate::pose::Pose;

/// 手上げ課題の閾値（分類器は閾値以外の状態を持たない）
#[derive(Debug, Clone)]
pub struct RaiseHandClassifier {
    cfg: RaiseHandConfig,
    visibility: f32,
}

/// 呼び出し側が保持する手上げ課題の履歴
#[derive(Debug, Clone, Default)]
pub struct RaiseHandState {
    /// 左右それぞれの達成姿勢の連続保持時間（秒）
    hold: [f32; 2],
    /// 観測された肩屈曲の最大値
    max_flexion: [f32; 2],
    /// 観測された肘伸展の最大値
    max_extension: [f32; 2],
    /// 観測された最も重い後方代償
    worst_compensation: Option<BackCompensation>,
    done: bool,
}

impl RaiseHandClassifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cfg: config.raise_hand.clone(),
            visibility: config.measure.visibility,
        }
    }

    pub fn update(&self, pose: &Pose, dt: f32, state: &mut RaiseHandState) -> TaskUpdate {
        let vis = self.visibility;

        let mut raised = [false; 2];
        for (i, &side) in Side::BOTH.iter().enumerate() {
            let flexion = arms::shoulder_flexion(pose, side, vis);
            let extension = arms::elbow_extension(pose, side, vis);
            state.max_flexion[i] = state.max_flexion[i].max(flexion);
            state.max_extension[i] = state.max_extension[i].max(extension);

            raised[i] = flexion >= self.cfg.min_flexion && extension >= self.cfg.min_extension;
            if raised[i] && !state.done {
                state.hold[i] += dt;
            } else if !state.done {
                // 姿勢が崩れたら連続保持のカウントをやり直す
                state.hold[i] = 0.0;
            }
        }

        // 後方代償は補助フラグであり、達成を妨げない
        let comp = back_compensation(pose, vis);
        state.worst_compensation = Some(match (state.worst_compensation, comp) {
            (Some(BackCompensation::Significant), _) | (_, BackCompensation::Significant) => {
                BackCompensation::Significant
            }
            (Some(BackCompensation::Mild), _) | (_, BackCompensation::Mild) => BackCompensation::Mild,
            _ => BackCompensation::None,
        });

        // 成績の良い側の腕で判定する
        let best = if state.hold[0] >= state.hold[1] { 0 } else { 1 };
        let best_hold = state.hold[best];

        if !state.done && best_hold >= self.cfg.hold_secs {
            debug!(arm = Side::BOTH[best].name(), hold = best_hold, "raise_hand done");
            state.done = true;
        }

        let metrics = self.metrics(state, best);

        if state.done {
            return TaskUpdate::new("両手を上げられました！", Level::Success, 1.0, metrics, true);
        }

        if raised[0] || raised[1] {
            let progress = 0.3 + 0.7 * (best_hold / self.cfg.hold_secs);
            TaskUpdate::new("そのまま！", Level::Info, progress, metrics, false)
        } else {
            let flexion_frac =
                (state.max_flexion[best] / self.cfg.min_flexion).min(1.0);
            TaskUpdate::new(
                "腕をまっすぐ上に上げてください",
                Level::Info,
                0.3 * flexion_frac,
                metrics,
                false,
            )
        }
    }

    fn metrics(&self, state: &RaiseHandState, best: usize) -> Metrics {
        let symmetry = Symmetry::from_pair(state.max_flexion[0], state.max_flexion[1]);
        let comp_name = match state.worst_compensation.unwrap_or(BackCompensation::None) {
            BackCompensation::None => "none",
            BackCompensation::Mild => "mild",
            BackCompensation::Significant => "significant",
        };

        let mut metrics = Metrics::new();
        metrics.insert("shoulder_flexion_left".into(), state.max_flexion[0].into());
        metrics.insert("shoulder_flexion_right".into(), state.max_flexion[1].into());
        metrics.insert("elbow_extension_left".into(), state.max_extension[0].into());
        metrics.insert("elbow_extension_right".into(), state.max_extension[1].into());
        metrics.insert("hold_time".into(), state.hold[best].into());
        metrics.insert("best_arm".into(), Side::BOTH[best].name().into());
        metrics.insert("flexion_symmetry_pct".into(), symmetry.percentage.into());
        metrics.insert("back_compensation".into(), comp_name.into());
        metrics
    }
}
