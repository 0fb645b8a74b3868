use tracing::debug;

use super::{Baseline, Level, Metrics, TaskUpdate};
use crate::config::{Config, JumpConfig};
use crate::measure::{legs, Side};
use crate::pose::Pose;

/// 両足跳び課題のフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpPhase {
    Idle,
    Crouching,
    Airborne,
    Landing,
    Complete,
}

/// 踏み切りの質
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TakeoffQuality {
    /// 両足首が許容差以内で同時に上がった
    Excellent,
    /// 片足が先に上がった（ギャロップ様）
    Asymmetric,
}

/// 着地の質
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LandingQuality {
    /// 両足同時・膝で衝撃吸収
    Stable,
    Unstable,
    OneFooted,
}

/// 両足跳び課題の分類器
#[derive(Debug, Clone)]
pub struct JumpClassifier {
    cfg: JumpConfig,
    visibility: f32,
}

/// 呼び出し側が保持するジャンプ課題の履歴
#[derive(Debug, Clone)]
pub struct JumpState {
    baseline: Baseline,
    phase: JumpPhase,
    /// しゃがみで観測された重心降下の最大値
    crouch_depth: f32,
    /// 滞空中の重心上昇の最大値 = ジャンプ高
    peak_elevation: f32,
    takeoff: Option<TakeoffQuality>,
    landing: Option<LandingQuality>,
    /// 着地フェーズ進入時にもう片方の足がまだ高かったか
    one_footed_landing: bool,
}

impl JumpState {
    pub fn new(baseline: Baseline) -> Self {
        Self {
            baseline,
            phase: JumpPhase::Idle,
            crouch_depth: 0.0,
            peak_elevation: 0.0,
            takeoff: None,
            landing: None,
            one_footed_landing: false,
        }
    }

    pub fn phase(&self) -> JumpPhase {
        self.phase
    }
}

impl JumpClassifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cfg: config.jump.clone(),
            visibility: config.measure.visibility,
        }
    }

    pub fn update(&self, pose: &Pose, _dt: f32, state: &mut JumpState) -> TaskUpdate {
        let vis = self.visibility;
        let la = pose.get(Side::Left.ankle());
        let ra = pose.get(Side::Right.ankle());

        if !la.is_visible(vis) || !ra.is_visible(vis) {
            return self.report(state, Some(Level::Warning));
        }

        // 上昇量は基準からの差。yは下が大きいので符号を反転する
        let rise_l = state.baseline.ankle_y - la.y;
        let rise_r = state.baseline.ankle_y - ra.y;
        let com_rise = pose
            .center_of_mass(vis)
            .map_or(0.0, |(_, cy)| state.baseline.com_y - cy);

        let knee = (legs::knee_flexion(pose, Side::Left, vis)
            + legs::knee_flexion(pose, Side::Right, vis))
            / 2.0;

        let both_up = rise_l > self.cfg.takeoff_rise && rise_r > self.cfg.takeoff_rise;

        match state.phase {
            JumpPhase::Idle | JumpPhase::Crouching => {
                if state.phase == JumpPhase::Idle
                    && knee < self.cfg.crouch_knee_angle
                    && -com_rise > self.cfg.crouch_com_drop
                {
                    debug!(knee, drop = -com_rise, "jump crouch");
                    state.phase = JumpPhase::Crouching;
                }
                if state.phase == JumpPhase::Crouching {
                    state.crouch_depth = state.crouch_depth.max(-com_rise);
                }
                // 離地: 両足首が基準を超えて同時に上がる
                if both_up {
                    let quality = if (rise_l - rise_r).abs() <= self.cfg.symmetry_tolerance {
                        TakeoffQuality::Excellent
                    } else {
                        TakeoffQuality::Asymmetric
                    };
                    debug!(rise_l, rise_r, ?quality, "jump takeoff");
                    state.takeoff = Some(quality);
                    state.phase = JumpPhase::Airborne;
                }
            }
            JumpPhase::Airborne => {
                state.peak_elevation = state.peak_elevation.max(com_rise);
                let down_l = rise_l < self.cfg.landing_settle;
                let down_r = rise_r < self.cfg.landing_settle;
                if down_l || down_r {
                    // 片方が接地したときもう片方がまだ踏切高さにあれば片足着地
                    state.one_footed_landing = (down_l && rise_r > self.cfg.takeoff_rise)
                        || (down_r && rise_l > self.cfg.takeoff_rise);
                    state.phase = JumpPhase::Landing;
                }
            }
            JumpPhase::Landing => {
                let down_l = rise_l < self.cfg.landing_settle;
                let down_r = rise_r < self.cfg.landing_settle;
                if down_l && down_r {
                    let symmetric = (la.y - ra.y).abs() <= self.cfg.symmetry_tolerance;
                    let absorbed = knee < self.cfg.absorb_knee_angle;
                    let quality = if state.one_footed_landing {
                        LandingQuality::OneFooted
                    } else if symmetric && absorbed {
                        LandingQuality::Stable
                    } else {
                        LandingQuality::Unstable
                    };
                    debug!(?quality, height = state.peak_elevation, "jump landed");
                    state.landing = Some(quality);
                    state.phase = JumpPhase::Complete;
                }
            }
            JumpPhase::Complete => {}
        }

        self.report(state, None)
    }

    fn report(&self, state: &JumpState, level_override: Option<Level>) -> TaskUpdate {
        let (message, level, progress) = match state.phase {
            JumpPhase::Idle => ("しゃがんでジャンプの準備！", Level::Info, 0.0),
            JumpPhase::Crouching => ("そのまま両足でジャンプ！", Level::Info, 0.3),
            JumpPhase::Airborne => ("ジャンプ中！", Level::Info, 0.6),
            JumpPhase::Landing => ("着地！", Level::Info, 0.8),
            JumpPhase::Complete => ("上手にジャンプできました！", Level::Success, 1.0),
        };
        TaskUpdate::new(
            message,
            level_override.unwrap_or(level),
            progress,
            self.metrics(state),
            state.phase == JumpPhase::Complete,
        )
    }

    fn metrics(&self, state: &JumpState) -> Metrics {
        let takeoff = match state.takeoff {
            Some(TakeoffQuality::Excellent) => "excellent",
            Some(TakeoffQuality::Asymmetric) => "asymmetric",
            None => "none",
        };
        let landing = match state.landing {
            Some(LandingQuality::Stable) => "stable",
            Some(LandingQuality::Unstable) => "unstable",
            Some(LandingQuality::OneFooted) => "one_footed",
            None => "none",
        };
        let phase = match state.phase {
            JumpPhase::Idle => "idle",
            JumpPhase::Crouching => "crouching",
            JumpPhase::Airborne => "airborne",
            JumpPhase::Landing => "landing",
            JumpPhase::Complete => "complete",
        };

        let mut metrics = Metrics::new();
        metrics.insert("jump_height".into(), state.peak_elevation.into());
        metrics.insert("crouch_depth".into(), state.crouch_depth.into());
        metrics.insert("takeoff_quality".into(), takeoff.into());
        metrics.insert("landing_quality".into(), landing.into());
        metrics.insert("phase".into(), phase.into());
        metrics
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

    /// 深くしゃがんだ姿勢（膝屈曲 ≈ 100°、重心降下 0.14）
    fn crouch_pose() -> Pose {
        pose_with(&[
            (LeftHip, 0.58, 0.66),
            (RightHip, 0.42, 0.66),
            (LeftKnee, 0.64, 0.70),
            (RightKnee, 0.36, 0.70),
            (LeftAnkle, 0.56, 0.90),
            (RightAnkle, 0.44, 0.90),
        ])
    }

    /// 滞空中の姿勢。左右の足首上昇量を指定する
    fn airborne_pose(rise_l: f32, rise_r: f32) -> Pose {
        pose_with(&[
            (LeftHip, 0.56, 0.45),
            (RightHip, 0.44, 0.45),
            (LeftKnee, 0.58, 0.65),
            (RightKnee, 0.42, 0.65),
            (LeftAnkle, 0.56, 0.90 - rise_l),
            (RightAnkle, 0.44, 0.90 - rise_r),
        ])
    }

    /// 膝を伸ばしたまま（衝撃吸収なし）の着地姿勢
    fn stiff_landing_pose() -> Pose {
        pose_with(&[
            (LeftHip, 0.56, 0.52),
            (RightHip, 0.44, 0.52),
            (LeftKnee, 0.56, 0.72),
            (RightKnee, 0.44, 0.72),
            (LeftAnkle, 0.56, 0.895),
            (RightAnkle, 0.44, 0.895),
        ])
    }

    /// 着地姿勢（膝を曲げて吸収、足首は基準近く）
    fn landing_pose() -> Pose {
        pose_with(&[
            (LeftHip, 0.56, 0.58),
            (RightHip, 0.44, 0.58),
            (LeftKnee, 0.60, 0.70),
            (RightKnee, 0.40, 0.70),
            (LeftAnkle, 0.56, 0.895),
            (RightAnkle, 0.44, 0.895),
        ])
    }

    fn run(c: &JumpClassifier, state: &mut JumpState, pose: &Pose, frames: u32) -> TaskUpdate {
        let mut last = c.update(pose, DT, state);
        for _ in 1..frames {
            last = c.update(pose, DT, state);
        }
        last
    }

    #[test]
    fn test_full_clean_jump() {
        let config = Config::default();
        let c = JumpClassifier::from_config(&config);
        let mut state = JumpState::new(baseline());

        run(&c, &mut state, &standing_pose(), 5);
        assert_eq!(state.phase(), JumpPhase::Idle);

        run(&c, &mut state, &crouch_pose(), 5);
        assert_eq!(state.phase(), JumpPhase::Crouching);

        // 両足首が同時に(許容差以内で)上がる
        run(&c, &mut state, &airborne_pose(0.06, 0.055), 3);
        assert_eq!(state.phase(), JumpPhase::Airborne);

        let last = run(&c, &mut state, &landing_pose(), 3);
        assert!(last.done);
        assert_eq!(
            last.metrics.get("takeoff_quality"),
            Some(&MetricValue::Text("excellent".into()))
        );
        assert_eq!(
            last.metrics.get("landing_quality"),
            Some(&MetricValue::Text("stable".into()))
        );
        match last.metrics.get("jump_height") {
            Some(MetricValue::Number(h)) => assert!(*h > 0.0),
            other => panic!("jump_height missing: {:?}", other),
        }
    }

    #[test]
    fn test_asymmetric_takeoff() {
        let config = Config::default();
        let c = JumpClassifier::from_config(&config);
        let mut state = JumpState::new(baseline());

        run(&c, &mut state, &crouch_pose(), 5);
        // 左が先に大きく上がった状態で右が閾値を越える
        run(&c, &mut state, &airborne_pose(0.08, 0.04), 3);
        assert_eq!(state.phase(), JumpPhase::Airborne);

        let last = run(&c, &mut state, &landing_pose(), 3);
        assert_eq!(
            last.metrics.get("takeoff_quality"),
            Some(&MetricValue::Text("asymmetric".into()))
        );
        assert!(last.done);
    }

    #[test]
    fn test_stiff_knee_landing_is_unstable() {
        // 両足同時でも膝が伸びたまま（吸収なし）なら不安定な着地
        let config = Config::default();
        let c = JumpClassifier::from_config(&config);
        let mut state = JumpState::new(baseline());

        run(&c, &mut state, &crouch_pose(), 5);
        run(&c, &mut state, &airborne_pose(0.06, 0.055), 3);

        let last = run(&c, &mut state, &stiff_landing_pose(), 3);
        assert!(last.done);
        assert_eq!(
            last.metrics.get("landing_quality"),
            Some(&MetricValue::Text("unstable".into()))
        );
    }

    #[test]
    fn test_one_footed_landing() {
        let config = Config::default();
        let c = JumpClassifier::from_config(&config);
        let mut state = JumpState::new(baseline());

        run(&c, &mut state, &crouch_pose(), 5);
        run(&c, &mut state, &airborne_pose(0.06, 0.055), 3);

        // 左だけ接地、右はまだ踏切高さ
        run(&c, &mut state, &airborne_pose(0.005, 0.06), 2);
        assert_eq!(state.phase(), JumpPhase::Landing);

        let last = run(&c, &mut state, &landing_pose(), 3);
        assert_eq!(
            last.metrics.get("landing_quality"),
            Some(&MetricValue::Text("one_footed".into()))
        );
    }

    #[test]
    fn test_no_jump_without_takeoff() {
        let config = Config::default();
        let c = JumpClassifier::from_config(&config);
        let mut state = JumpState::new(baseline());
        let last = run(&c, &mut state, &standing_pose(), 60);
        assert!(!last.done);
        assert_eq!(state.phase(), JumpPhase::Idle);
    }

    #[test]
    fn test_missing_ankles_is_warning() {
        let config = Config::default();
        let c = JumpClassifier::from_config(&config);
        let mut state = JumpState::new(baseline());
        let u = c.update(&Pose::default(), DT, &mut state);
        assert_eq!(u.level, Level::Warning);
        assert!(!u.done);
    }
}
