use tracing::debug;

use super::{Baseline, Level, Metrics, TaskUpdate};
use crate::config::{Config, TiptoeConfig};
use crate::measure::{legs, Side};
use crate::pose::Pose;

/// つま先立ち課題の分類器
///
/// 踵上げの検出は3つの独立した手掛かりのORで行う:
/// 底屈角・見かけの脚長比・踵のy位置。正面カメラでは
/// 底屈角が取りにくいため単独の手掛かりに頼らない
#[derive(Debug, Clone)]
pub struct TiptoeClassifier {
    cfg: TiptoeConfig,
    visibility: f32,
}

/// 呼び出し側が保持するつま先立ち課題の履歴
#[derive(Debug, Clone)]
pub struct TiptoeState {
    baseline: Baseline,
    /// 連続保持時間（秒）。踵が下りるかドリフトするとリセット
    hold_time: f32,
    max_plantarflexion: f32,
    /// 前フレームの両足首x平均（ドリフト検出用）
    last_foot_x: Option<f32>,
    drift_resets: u32,
    done: bool,
}

impl TiptoeState {
    pub fn new(baseline: Baseline) -> Self {
        Self {
            baseline,
            hold_time: 0.0,
            max_plantarflexion: 0.0,
            last_foot_x: None,
            drift_resets: 0,
            done: false,
        }
    }
}

impl TiptoeClassifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cfg: config.tiptoe.clone(),
            visibility: config.measure.visibility,
        }
    }

    pub fn update(&self, pose: &Pose, dt: f32, state: &mut TiptoeState) -> TaskUpdate {
        let vis = self.visibility;
        let la = pose.get(Side::Left.ankle());
        let ra = pose.get(Side::Right.ankle());

        if !la.is_visible(vis) || !ra.is_visible(vis) {
            let mut u = self.report(state, 0.0, 0.0);
            u.message = "足元が映っていません".into();
            u.level = Level::Warning;
            return u;
        }

        // 手掛かり1: 足関節底屈角（左右平均）
        let plantar = (legs::ankle_plantarflexion(pose, Side::Left, vis)
            + legs::ankle_plantarflexion(pose, Side::Right, vis))
            / 2.0;
        state.max_plantarflexion = state.max_plantarflexion.max(plantar);

        // 手掛かり2: 重心上昇から推定した見かけの脚長比
        // 踵上げでは足首から上が全体に持ち上がる
        let leg_span = self.baseline_span(state);
        let leg_ratio = pose.center_of_mass(vis).map_or(1.0, |(_, cy)| {
            if leg_span > 1e-6 {
                1.0 + (state.baseline.com_y - cy) / leg_span
            } else {
                1.0
            }
        });

        // 手掛かり3: 踵が立位の足首基準より高い
        let lh = pose.get(Side::Left.heel());
        let rh = pose.get(Side::Right.heel());
        let heel_rise = if lh.is_visible(vis) && rh.is_visible(vis) {
            state.baseline.ankle_y - (lh.y + rh.y) / 2.0
        } else {
            0.0
        };

        let on_toes = plantar >= self.cfg.plantarflexion
            || leg_ratio >= self.cfg.leg_ratio
            || heel_rise > self.cfg.heel_rise;

        // その場保持の確認。足が横に流れたら保持をやり直し
        let foot_x = (la.x + ra.x) / 2.0;
        let drifted = state
            .last_foot_x
            .is_some_and(|prev| (foot_x - prev).abs() > self.cfg.max_drift);
        state.last_foot_x = Some(foot_x);

        if drifted && !state.done {
            debug!(foot_x, "tiptoe drift, hold reset");
            state.drift_resets += 1;
            state.hold_time = 0.0;
        } else if on_toes && !state.done {
            state.hold_time += dt.max(0.0);
        } else if !state.done {
            state.hold_time = 0.0;
        }

        if !state.done && state.hold_time >= self.cfg.hold_secs {
            debug!(plantar = state.max_plantarflexion, "tiptoe hold complete");
            state.done = true;
        }

        self.report(state, leg_ratio, heel_rise)
    }

    /// 立位での重心〜足首のy距離。脚長比の分母に使う
    fn baseline_span(&self, state: &TiptoeState) -> f32 {
        state.baseline.ankle_y - state.baseline.com_y
    }

    fn report(&self, state: &TiptoeState, leg_ratio: f32, heel_rise: f32) -> TaskUpdate {
        let (message, level) = if state.done {
            ("つま先立ちできました！", Level::Success)
        } else if state.hold_time > 0.0 {
            ("そのままキープ！", Level::Info)
        } else {
            ("つま先で立ってみよう！", Level::Info)
        };

        let mut metrics = Metrics::new();
        metrics.insert("hold_time".into(), state.hold_time.into());
        metrics.insert(
            "max_plantarflexion".into(),
            state.max_plantarflexion.into(),
        );
        metrics.insert("leg_ratio".into(), leg_ratio.into());
        metrics.insert("heel_rise".into(), heel_rise.into());
        metrics.insert("drift_resets".into(), state.drift_resets.into());
        metrics.insert("pass".into(), state.done.into());

        let progress = if state.done {
            1.0
        } else {
            state.hold_time / self.cfg.hold_secs
        };
        TaskUpdate::new(message, level, progress, metrics, state.done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::test_util::{pose_with, standing_pose};
    use crate::pose::LandmarkIndex::*;
    use crate::task::MetricValue;

    const DT: f32 = 1.0 / 30.0;

    fn baseline() -> Baseline {
        Baseline::capture(&standing_pose(), 0.5).unwrap()
    }

    /// つま先立ちの姿勢。足首x平均を指定できる（ドリフトテスト用）
    fn tiptoe_pose(center_x: f32) -> Pose {
        let dx = center_x - 0.5;
        pose_with(&[
            (LeftHip, 0.56 + dx, 0.48),
            (RightHip, 0.44 + dx, 0.48),
            (LeftKnee, 0.56 + dx, 0.70),
            (RightKnee, 0.44 + dx, 0.70),
            (LeftAnkle, 0.56 + dx, 0.87),
            (RightAnkle, 0.44 + dx, 0.87),
            (LeftFootIndex, 0.58 + dx, 0.95),
            (RightFootIndex, 0.42 + dx, 0.95),
        ])
    }

    fn hold(c: &TiptoeClassifier, state: &mut TiptoeState, pose: &Pose, frames: u32) -> TaskUpdate {
        let mut last = c.update(pose, DT, state);
        for _ in 1..frames {
            last = c.update(pose, DT, state);
        }
        last
    }

    #[test]
    fn test_hold_to_completion() {
        let config = Config::default();
        let c = TiptoeClassifier::from_config(&config);
        let mut state = TiptoeState::new(baseline());

        // 3秒 = 90フレーム + 余裕
        let last = hold(&c, &mut state, &tiptoe_pose(0.5), 95);
        assert!(last.done);
        assert_eq!(last.level, Level::Success);
        match last.metrics.get("max_plantarflexion") {
            Some(MetricValue::Number(p)) => assert!(*p >= 30.0, "got {}", p),
            other => panic!("max_plantarflexion missing: {:?}", other),
        }
    }

    #[test]
    fn test_standing_does_not_accumulate() {
        let config = Config::default();
        let c = TiptoeClassifier::from_config(&config);
        let mut state = TiptoeState::new(baseline());
        let last = hold(&c, &mut state, &standing_pose(), 120);
        assert!(!last.done);
        assert_eq!(
            last.metrics.get("hold_time"),
            Some(&MetricValue::Number(0.0))
        );
    }

    #[test]
    fn test_drift_resets_hold() {
        let config = Config::default();
        let c = TiptoeClassifier::from_config(&config);
        let mut state = TiptoeState::new(baseline());

        hold(&c, &mut state, &tiptoe_pose(0.5), 45);
        assert!(state.hold_time > 1.0);

        // 横に0.1ずれる → 保持リセット
        c.update(&tiptoe_pose(0.6), DT, &mut state);
        assert_eq!(state.drift_resets, 1);
        assert!(state.hold_time < 0.1);
    }

    #[test]
    fn test_heel_drop_resets_hold() {
        let config = Config::default();
        let c = TiptoeClassifier::from_config(&config);
        let mut state = TiptoeState::new(baseline());

        hold(&c, &mut state, &tiptoe_pose(0.5), 45);
        assert!(state.hold_time > 1.0);

        c.update(&standing_pose(), DT, &mut state);
        assert_eq!(state.hold_time, 0.0);
    }

    #[test]
    fn test_hold_time_frozen_after_completion() {
        // 完了後のフレームで保持時間が増え続けないこと
        // （集計側が読む最終値が呼び出し継続で膨らんではいけない）
        let config = Config::default();
        let c = TiptoeClassifier::from_config(&config);
        let mut state = TiptoeState::new(baseline());

        let done = hold(&c, &mut state, &tiptoe_pose(0.5), 95);
        assert!(done.done);
        let final_hold = state.hold_time;

        let after = hold(&c, &mut state, &tiptoe_pose(0.5), 30);
        assert!(after.done);
        assert_eq!(state.hold_time, final_hold);
        assert_eq!(
            after.metrics.get("hold_time"),
            Some(&MetricValue::Number(final_hold))
        );
    }

    #[test]
    fn test_missing_feet_is_warning() {
        let config = Config::default();
        let c = TiptoeClassifier::from_config(&config);
        let mut state = TiptoeState::new(baseline());
        let u = c.update(&Pose::default(), DT, &mut state);
        assert_eq!(u.level, Level::Warning);
    }
}
