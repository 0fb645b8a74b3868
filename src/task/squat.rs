use tracing::debug;

use super::{Level, Metrics, TaskUpdate};
use crate::config::{Config, SquatConfig};
use crate::measure::{legs, trunk, Side};
use crate::metrics::RomStats;
use crate::pose::Pose;

/// 踵上げを欠点とみなす底屈角の下限（度）
const HEEL_LIFT_ANGLE: f32 = 30.0;
/// 立ち上がり完了とみなす膝伸展角（度）
const RETURN_STRAIGHT: f32 = 160.0;

/// スクワットの到達深度。膝屈曲角で段階づける
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SquatDepth {
    Standing,
    Partial,
    Parallel,
    Deep,
}

impl SquatDepth {
    pub fn name(self) -> &'static str {
        match self {
            SquatDepth::Standing => "standing",
            SquatDepth::Partial => "partial",
            SquatDepth::Parallel => "parallel",
            SquatDepth::Deep => "deep",
        }
    }
}

/// 体幹前傾の区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrunkPosture {
    Upright,
    Good,
    Excessive,
}

/// スクワット課題の分類器
#[derive(Debug, Clone)]
pub struct SquatClassifier {
    cfg: SquatConfig,
    visibility: f32,
}

/// 呼び出し側が保持するスクワット課題の履歴
#[derive(Debug, Clone, Default)]
pub struct SquatState {
    /// 1回の動作中に到達した最大深度
    best_depth: Option<SquatDepth>,
    /// フレームごとの膝屈曲角（左右平均）。可動域統計に使う
    knee_series: Vec<f32>,
    trunk_lean_max: f32,
    /// 観測された最小の膝間/足首間幅比
    valgus_min: Option<f32>,
    heel_lift_seen: bool,
    /// しゃがみに入ったか（立位のままでは完了しない）
    descended: bool,
    done: bool,
}

impl SquatClassifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cfg: config.squat.clone(),
            visibility: config.measure.visibility,
        }
    }

    pub fn update(&self, pose: &Pose, _dt: f32, state: &mut SquatState) -> TaskUpdate {
        let vis = self.visibility;
        let lk = pose.get(Side::Left.knee());
        let rk = pose.get(Side::Right.knee());
        if !lk.is_visible(vis) || !rk.is_visible(vis) {
            let mut u = self.report(state, SquatDepth::Standing);
            u.message = "膝が映っていません".into();
            u.level = Level::Warning;
            return u;
        }

        let knee = (legs::knee_flexion(pose, Side::Left, vis)
            + legs::knee_flexion(pose, Side::Right, vis))
            / 2.0;
        let depth = self.classify_depth(pose, knee);

        state.knee_series.push(knee);
        if depth > SquatDepth::Standing {
            state.descended = true;
            state.best_depth = Some(state.best_depth.map_or(depth, |b| b.max(depth)));

            // フォームの欠点はしゃがんでいる間だけ採点する
            let lean = trunk::trunk_lean(pose, vis);
            state.trunk_lean_max = state.trunk_lean_max.max(lean);
            let valgus = legs::knee_valgus_ratio(pose, vis);
            state.valgus_min = Some(state.valgus_min.map_or(valgus, |v| v.min(valgus)));
            if legs::heel_lift(pose, Side::Left, vis, HEEL_LIFT_ANGLE)
                || legs::heel_lift(pose, Side::Right, vis, HEEL_LIFT_ANGLE)
            {
                state.heel_lift_seen = true;
            }
        }

        // 立ち上がりで1回分の動作が完了
        if !state.done
            && state.descended
            && state.best_depth.unwrap_or(SquatDepth::Standing) >= SquatDepth::Partial
            && knee >= RETURN_STRAIGHT
        {
            debug!(
                depth = state.best_depth.map(SquatDepth::name),
                score = self.form_score(state),
                "squat complete"
            );
            state.done = true;
        }

        self.report(state, depth)
    }

    /// 膝屈曲角から深度を分類し、腰と膝の縦距離でクロスチェックする
    ///
    /// 側方からの遮蔽で膝角度が実際より深く出ることがあるため、
    /// 腰が膝に近づいていなければParallel以上を認めない
    fn classify_depth(&self, pose: &Pose, knee_angle: f32) -> SquatDepth {
        let by_angle = if knee_angle < self.cfg.deep_angle {
            SquatDepth::Deep
        } else if knee_angle < self.cfg.parallel_angle {
            SquatDepth::Parallel
        } else if knee_angle < self.cfg.partial_angle {
            SquatDepth::Partial
        } else {
            SquatDepth::Standing
        };

        if by_angle >= SquatDepth::Parallel {
            let vis = self.visibility;
            let hip = pose.get(Side::Left.hip());
            let knee = pose.get(Side::Left.knee());
            let ankle = pose.get(Side::Left.ankle());
            if hip.is_visible(vis) && knee.is_visible(vis) && ankle.is_visible(vis) {
                let leg = ankle.y - hip.y;
                if leg > 1e-6 && (knee.y - hip.y) / leg > self.cfg.depth_ratio {
                    return SquatDepth::Partial;
                }
            }
        }
        by_angle
    }

    fn trunk_posture(&self, state: &SquatState) -> TrunkPosture {
        if state.trunk_lean_max <= self.cfg.trunk_upright {
            TrunkPosture::Upright
        } else if state.trunk_lean_max <= self.cfg.trunk_good {
            TrunkPosture::Good
        } else {
            TrunkPosture::Excessive
        }
    }

    fn valgus_name(&self, state: &SquatState) -> &'static str {
        match state.valgus_min {
            Some(v) if v < self.cfg.valgus_significant => "significant",
            Some(v) if v < self.cfg.valgus_mild => "mild",
            _ => "none",
        }
    }

    /// フォーム点 0〜2
    ///
    /// 深度で基礎点（Parallel以上=2, Partial=1, 立位のみ=0）をつけ、
    /// 顕著な外反は上限1、欠点2つ以上でさらに1点減点
    fn form_score(&self, state: &SquatState) -> u32 {
        let best = state.best_depth.unwrap_or(SquatDepth::Standing);
        let mut score: u32 = match best {
            SquatDepth::Deep | SquatDepth::Parallel => 2,
            SquatDepth::Partial => 1,
            SquatDepth::Standing => 0,
        };

        let significant_valgus = state
            .valgus_min
            .is_some_and(|v| v < self.cfg.valgus_significant);
        if significant_valgus {
            score = score.min(1);
        }

        let mut issues = 0;
        if self.trunk_posture(state) == TrunkPosture::Excessive {
            issues += 1;
        }
        if state.valgus_min.is_some_and(|v| v < self.cfg.valgus_mild) {
            issues += 1;
        }
        if state.heel_lift_seen {
            issues += 1;
        }
        if issues >= 2 {
            score = score.saturating_sub(1);
        }
        score
    }

    fn report(&self, state: &SquatState, current: SquatDepth) -> TaskUpdate {
        let best = state.best_depth.unwrap_or(SquatDepth::Standing);
        let (message, level, progress) = if state.done {
            ("上手にしゃがめました！", Level::Success, 1.0)
        } else {
            match current {
                SquatDepth::Standing if !state.descended => {
                    ("ゆっくりしゃがんでみよう！", Level::Info, 0.0)
                }
                SquatDepth::Standing => ("もう一度しゃがんでもいいよ", Level::Info, 0.8),
                SquatDepth::Partial => ("もう少し深く！", Level::Info, 0.4),
                SquatDepth::Parallel | SquatDepth::Deep => {
                    ("いい深さ！ゆっくり立ち上がろう", Level::Info, 0.6)
                }
            }
        };

        let trunk = match self.trunk_posture(state) {
            TrunkPosture::Upright => "upright",
            TrunkPosture::Good => "good",
            TrunkPosture::Excessive => "excessive",
        };

        let rom = RomStats::from_series(&state.knee_series);
        let min_knee = if state.knee_series.is_empty() { 180.0 } else { rom.min };

        let mut metrics = Metrics::new();
        metrics.insert("depth".into(), best.name().into());
        metrics.insert("min_knee_angle".into(), min_knee.into());
        metrics.insert("knee_rom_range".into(), rom.range.into());
        metrics.insert("trunk_lean_max".into(), state.trunk_lean_max.into());
        metrics.insert("trunk".into(), trunk.into());
        metrics.insert("valgus".into(), self.valgus_name(state).into());
        metrics.insert("heel_lift".into(), state.heel_lift_seen.into());
        metrics.insert("form_score".into(), self.form_score(state).into());
        TaskUpdate::new(message, level, progress, metrics, state.done)
    }
}
