use tracing::debug;

use super::{Level, Metrics, TaskUpdate};
use crate::config::{Config, OneLegConfig};
use crate::measure::trunk::trunk_lean;
use crate::measure::{legs, Side};
use crate::metrics::{smooth_series, SwayAnalysis};
use crate::pose::Pose;

/// 足首高さ信号の投票重み（主信号）
const ANKLE_VOTE_WEIGHT: u32 = 2;
/// 膝屈曲差・膝高さ差の投票重み（副信号）
const SECONDARY_VOTE_WEIGHT: u32 = 1;
/// 動揺解析前に重心軌跡へかける移動平均の窓幅
/// ランドマークのフレーム間ジッタを動揺として数えないため
const SWAY_SMOOTH_WINDOW: usize = 3;

/// 片脚立ち課題の分類器
#[derive(Debug, Clone)]
pub struct OneLegClassifier {
    cfg: OneLegConfig,
    visibility: f32,
}

/// 1フレーム分の投票結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StanceVote {
    /// 片脚立位と判定されたか（どちらかの合計得票 ≥ 1）
    pub is_one_leg_stance: bool,
    /// 挙上脚。同点は左を優先
    pub lifted_leg: Side,
    /// 主信号（足首高さ差）だけで閾値を超えたか
    /// 副信号のみの誤検出を防ぐ厳格条件
    pub ankle_signal: bool,
}

/// 呼び出し側が保持する片脚立ち課題の履歴
#[derive(Debug, Clone, Default)]
pub struct OneLegState {
    /// 挙上中の累積保持時間（秒）
    hold_time: f32,
    /// 主信号を一度でも満たしたか。一度立ったら下がらない
    pass_latched: bool,
    lifted_leg: Option<Side>,
    max_trunk_lean: f32,
    trunk_lean_sum: f32,
    lean_samples: u32,
    /// 挙上中の重心軌跡（左右・前後）。動揺解析に使う
    com_x: Vec<f32>,
    com_y: Vec<f32>,
    done: bool,
}

impl OneLegClassifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cfg: config.one_leg.clone(),
            visibility: config.measure.visibility,
        }
    }

    /// 多信号投票: 足首高さ差（重み2）、膝屈曲差（重み1）、膝高さ差（重み1）
    /// 各信号は自身の閾値を超えた場合のみ、高い側の脚に票を入れる
    pub fn vote(&self, pose: &Pose) -> Option<StanceVote> {
        let vis = self.visibility;
        let la = pose.get(Side::Left.ankle());
        let ra = pose.get(Side::Right.ankle());
        let lk = pose.get(Side::Left.knee());
        let rk = pose.get(Side::Right.knee());

        if !la.is_visible(vis) || !ra.is_visible(vis) {
            return None;
        }

        let mut score = [0u32; 2]; // [left, right]

        // 足首高さ差（yは下が大きいので、小さい方が高い）
        let ankle_diff = (la.y - ra.y).abs();
        let ankle_signal = ankle_diff > self.cfg.ankle_diff;
        if ankle_signal {
            let lifted = if la.y < ra.y { 0 } else { 1 };
            score[lifted] += ANKLE_VOTE_WEIGHT;
        }

        // 膝屈曲差: 挙上脚の膝はより曲がる（角度が小さい）
        let left_knee = legs::knee_flexion(pose, Side::Left, vis);
        let right_knee = legs::knee_flexion(pose, Side::Right, vis);
        if (left_knee - right_knee).abs() > self.cfg.knee_bend_diff {
            let lifted = if left_knee < right_knee { 0 } else { 1 };
            score[lifted] += SECONDARY_VOTE_WEIGHT;
        }

        // 膝高さ差
        if lk.is_visible(vis) && rk.is_visible(vis) {
            let knee_diff = (lk.y - rk.y).abs();
            if knee_diff > self.cfg.knee_height_diff {
                let lifted = if lk.y < rk.y { 0 } else { 1 };
                score[lifted] += SECONDARY_VOTE_WEIGHT;
            }
        }

        // 同点は左脚を優先
        let lifted_leg = if score[0] >= score[1] { Side::Left } else { Side::Right };
        Some(StanceVote {
            is_one_leg_stance: score[0].max(score[1]) >= 1,
            lifted_leg,
            ankle_signal,
        })
    }

    pub fn update(&self, pose: &Pose, dt: f32, state: &mut OneLegState) -> TaskUpdate {
        let vote = self.vote(pose);

        if let Some(vote) = vote {
            if vote.is_one_leg_stance && !state.done {
                state.hold_time += dt;
                state.lifted_leg = Some(vote.lifted_leg);

                let lean = trunk_lean(pose, self.visibility);
                state.max_trunk_lean = state.max_trunk_lean.max(lean);
                state.trunk_lean_sum += lean;
                state.lean_samples += 1;

                if let Some((cx, cy)) = pose.center_of_mass(self.visibility) {
                    state.com_x.push(cx);
                    state.com_y.push(cy);
                }
            }
            if vote.ankle_signal && !state.pass_latched {
                debug!(leg = vote.lifted_leg.name(), "one_leg ankle signal latched");
                state.pass_latched = true;
            }
        }

        if !state.done && state.hold_time >= self.cfg.target_hold_secs {
            state.done = true;
        }

        let metrics = self.metrics(state);
        let progress = state.hold_time / self.cfg.target_hold_secs;

        if state.done {
            TaskUpdate::new("上手にバランスが取れました！", Level::Success, 1.0, metrics, true)
        } else if vote.map_or(false, |v| v.is_one_leg_stance) {
            TaskUpdate::new("そのままキープ！", Level::Info, progress, metrics, false)
        } else {
            TaskUpdate::new("片足を上げてください", Level::Info, progress, metrics, false)
        }
    }

    fn metrics(&self, state: &OneLegState) -> Metrics {
        let sway = SwayAnalysis::from_series(
            &smooth_series(&state.com_x, SWAY_SMOOTH_WINDOW),
            &smooth_series(&state.com_y, SWAY_SMOOTH_WINDOW),
        );
        let mean_lean = if state.lean_samples > 0 {
            state.trunk_lean_sum / state.lean_samples as f32
        } else {
            0.0
        };

        let mut metrics = Metrics::new();
        metrics.insert("hold_time".into(), state.hold_time.into());
        metrics.insert("pass".into(), state.pass_latched.into());
        metrics.insert(
            "lifted_leg".into(),
            state.lifted_leg.map_or("none", |s| s.name()).into(),
        );
        metrics.insert("trunk_lean_max".into(), state.max_trunk_lean.into());
        metrics.insert("trunk_lean_mean".into(), mean_lean.into());
        metrics.insert("sway_magnitude".into(), sway.magnitude.into());
        metrics.insert("stability_score".into(), sway.stability_score.into());
        metrics
    }
}
