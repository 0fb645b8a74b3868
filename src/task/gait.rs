use tracing::debug;

use super::{Level, Metrics, TaskUpdate};
use crate::config::{Config, GaitConfig};
use crate::geometry::distance;
use crate::measure::trunk::trunk_lean;
use crate::measure::{legs, Side};
use crate::metrics::Symmetry;
use crate::pose::Pose;

/// 足の歩行周期フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FootPhase {
    /// 接地（立脚）
    #[default]
    Stance,
    /// 足首が反対足より高く上がっている
    Lifted,
    /// 挙上に加えて膝が振り出しの屈曲をしている
    Swinging,
}

/// 歩行課題の分類器
#[derive(Debug, Clone)]
pub struct GaitClassifier {
    cfg: GaitConfig,
    visibility: f32,
}

/// 呼び出し側が保持する歩行課題の履歴
#[derive(Debug, Clone, Default)]
pub struct GaitState {
    phase: [FootPhase; 2],
    /// 直前にステップを完了した足。交互性の判定に使う
    last_step_foot: Option<Side>,
    step_count: u32,
    /// 同じ足が連続してステップした回数（交互でない歩行）
    same_foot_steps: u32,
    /// 課題開始時の腰中心x。前進量の基準
    start_hip_x: Option<f32>,
    max_displacement: f32,
    elapsed: f32,
    max_trunk_sway: f32,
    trunk_sway_sum: f32,
    arm_symmetry_sum: f32,
    samples: u32,
    done: bool,
}

impl GaitClassifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cfg: config.gait.clone(),
            visibility: config.measure.visibility,
        }
    }

    pub fn update(&self, pose: &Pose, dt: f32, state: &mut GaitState) -> TaskUpdate {
        let vis = self.visibility;
        let la = pose.get(Side::Left.ankle());
        let ra = pose.get(Side::Right.ankle());

        if !la.is_visible(vis) || !ra.is_visible(vis) {
            // 足が見えない間は状態を進めず評価を続ける
            return TaskUpdate::new(
                "全身がカメラに入るようにしてください",
                Level::Warning,
                self.progress(state),
                self.metrics(state),
                state.done,
            );
        }

        if !state.done {
            state.elapsed += dt;
        }

        let ankle_y = [la.y, ra.y];
        for (i, &side) in Side::BOTH.iter().enumerate() {
            let other = 1 - i;
            // 正 = 自分の足首が反対足より高い
            let rise = ankle_y[other] - ankle_y[i];
            let knee = legs::knee_flexion(pose, side, vis);

            state.phase[i] = match state.phase[i] {
                FootPhase::Stance if rise > self.cfg.lift_threshold => {
                    if knee < self.cfg.swing_knee_angle {
                        FootPhase::Swinging
                    } else {
                        FootPhase::Lifted
                    }
                }
                FootPhase::Lifted if knee < self.cfg.swing_knee_angle => FootPhase::Swinging,
                FootPhase::Lifted | FootPhase::Swinging
                    if rise.abs() < self.cfg.settle_threshold =>
                {
                    // 足首が反対足の高さまで戻った = ステップ完了
                    if !state.done {
                        state.step_count += 1;
                        if state.last_step_foot == Some(side) {
                            state.same_foot_steps += 1;
                        }
                        state.last_step_foot = Some(side);
                        debug!(foot = side.name(), steps = state.step_count, "gait step");
                    }
                    FootPhase::Stance
                }
                phase => phase,
            };
        }

        if let Some((cx, _)) = pose.center_of_mass(vis) {
            let start = *state.start_hip_x.get_or_insert(cx);
            state.max_displacement = state.max_displacement.max((cx - start).abs());
        }

        // 補助的な歩容品質の信号
        let sway = trunk_lean(pose, vis);
        state.max_trunk_sway = state.max_trunk_sway.max(sway);
        state.trunk_sway_sum += sway;
        let left_swing = distance(pose.get(Side::Left.wrist()), pose.get(Side::Left.hip()));
        let right_swing = distance(pose.get(Side::Right.wrist()), pose.get(Side::Right.hip()));
        state.arm_symmetry_sum += Symmetry::from_pair(left_swing, right_swing).percentage;
        state.samples += 1;

        let steps_done = state.step_count >= self.cfg.target_steps;
        let progressed = state.max_displacement >= self.cfg.min_progress;
        if !state.done && steps_done && progressed {
            debug!(steps = state.step_count, displacement = state.max_displacement, "gait done");
            state.done = true;
        }

        let metrics = self.metrics(state);
        if state.done {
            TaskUpdate::new("上手に歩けました！", Level::Success, 1.0, metrics, true)
        } else if steps_done && !progressed {
            // その場足踏みでは完了しない
            TaskUpdate::new("前に向かって歩いてください", Level::Warning, self.progress(state), metrics, false)
        } else {
            TaskUpdate::new("まっすぐ歩いてください", Level::Info, self.progress(state), metrics, false)
        }
    }

    fn progress(&self, state: &GaitState) -> f32 {
        let steps = (state.step_count as f32 / self.cfg.target_steps as f32).min(1.0);
        let forward = (state.max_displacement / self.cfg.min_progress).min(1.0);
        0.7 * steps + 0.3 * forward
    }

    fn metrics(&self, state: &GaitState) -> Metrics {
        let cadence = if state.elapsed > 0.0 {
            state.step_count as f32 / state.elapsed * 60.0
        } else {
            0.0
        };
        let (mean_sway, mean_arm_sym) = if state.samples > 0 {
            (
                state.trunk_sway_sum / state.samples as f32,
                state.arm_symmetry_sum / state.samples as f32,
            )
        } else {
            (0.0, 0.0)
        };

        let mut metrics = Metrics::new();
        metrics.insert("step_count".into(), state.step_count.into());
        metrics.insert("alternating".into(), (state.same_foot_steps == 0).into());
        metrics.insert("same_foot_steps".into(), state.same_foot_steps.into());
        metrics.insert("forward_progress".into(), state.max_displacement.into());
        metrics.insert("cadence".into(), cadence.into());
        metrics.insert("trunk_sway_max".into(), state.max_trunk_sway.into());
        metrics.insert("trunk_sway_mean".into(), mean_sway.into());
        metrics.insert("arm_symmetry_pct".into(), mean_arm_sym.into());
        metrics
    }
}
