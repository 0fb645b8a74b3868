use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// 課題判定の閾値設定
///
/// 各閾値は経験的に調整された値。互換性のため既定値を変更せず、
/// 必要な場合のみTOMLで上書きする
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub measure: MeasureConfig,
    #[serde(default)]
    pub raise_hand: RaiseHandConfig,
    #[serde(default)]
    pub one_leg: OneLegConfig,
    #[serde(default)]
    pub gait: GaitConfig,
    #[serde(default)]
    pub jump: JumpConfig,
    #[serde(default)]
    pub tiptoe: TiptoeConfig,
    #[serde(default)]
    pub squat: SquatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MeasureConfig {
    /// ランドマーク採用の可視度閾値
    #[serde(default = "default_visibility")]
    pub visibility: f32,
}

fn default_visibility() -> f32 { 0.5 }

impl Default for MeasureConfig {
    fn default() -> Self {
        Self { visibility: default_visibility() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RaiseHandConfig {
    /// 肩屈曲の達成角度（度）
    #[serde(default = "default_rh_min_flexion")]
    pub min_flexion: f32,
    /// 肘伸展の達成角度（度）
    #[serde(default = "default_rh_min_extension")]
    pub min_extension: f32,
    /// 達成姿勢の必要保持時間（秒）
    #[serde(default = "default_rh_hold_secs")]
    pub hold_secs: f32,
}

fn default_rh_min_flexion() -> f32 { 150.0 }
fn default_rh_min_extension() -> f32 { 170.0 }
fn default_rh_hold_secs() -> f32 { 2.0 }

impl Default for RaiseHandConfig {
    fn default() -> Self {
        Self {
            min_flexion: default_rh_min_flexion(),
            min_extension: default_rh_min_extension(),
            hold_secs: default_rh_hold_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OneLegConfig {
    /// 足首高さ差の閾値（フレーム高さ比、重み2の主信号）
    #[serde(default = "default_ol_ankle_diff")]
    pub ankle_diff: f32,
    /// 膝屈曲角差の閾値（度、重み1）
    #[serde(default = "default_ol_knee_bend_diff")]
    pub knee_bend_diff: f32,
    /// 膝高さ差の閾値（フレーム高さ比、重み1）
    #[serde(default = "default_ol_knee_height_diff")]
    pub knee_height_diff: f32,
    /// 課題完了とみなす片脚立位の累計時間（秒）
    #[serde(default = "default_ol_target_hold_secs")]
    pub target_hold_secs: f32,
}

fn default_ol_ankle_diff() -> f32 { 0.03 }
fn default_ol_knee_bend_diff() -> f32 { 15.0 }
fn default_ol_knee_height_diff() -> f32 { 0.02 }
fn default_ol_target_hold_secs() -> f32 { 5.0 }

impl Default for OneLegConfig {
    fn default() -> Self {
        Self {
            ankle_diff: default_ol_ankle_diff(),
            knee_bend_diff: default_ol_knee_bend_diff(),
            knee_height_diff: default_ol_knee_height_diff(),
            target_hold_secs: default_ol_target_hold_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GaitConfig {
    /// 遊脚判定: 反対足との足首高さ差（フレーム高さ比）
    #[serde(default = "default_gait_lift_threshold")]
    pub lift_threshold: f32,
    /// 遊脚判定: 膝屈曲角がこの値未満で「振り出し」とみなす（度）
    #[serde(default = "default_gait_swing_knee_angle")]
    pub swing_knee_angle: f32,
    /// 接地判定: 足首高さ差がこの値未満に戻ったらステップ完了
    #[serde(default = "default_gait_settle_threshold")]
    pub settle_threshold: f32,
    /// その場足踏みを除外する腰中心の最小水平移動量（フレーム幅比）
    #[serde(default = "default_gait_min_progress")]
    pub min_progress: f32,
    /// 課題完了とみなすステップ数
    #[serde(default = "default_gait_target_steps")]
    pub target_steps: u32,
}

fn default_gait_lift_threshold() -> f32 { 0.03 }
fn default_gait_swing_knee_angle() -> f32 { 160.0 }
fn default_gait_settle_threshold() -> f32 { 0.015 }
fn default_gait_min_progress() -> f32 { 0.15 }
fn default_gait_target_steps() -> u32 { 6 }

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            lift_threshold: default_gait_lift_threshold(),
            swing_knee_angle: default_gait_swing_knee_angle(),
            settle_threshold: default_gait_settle_threshold(),
            min_progress: default_gait_min_progress(),
            target_steps: default_gait_target_steps(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JumpConfig {
    /// しゃがみ判定の膝屈曲角（この値未満で屈曲とみなす、度）
    #[serde(default = "default_jump_crouch_knee_angle")]
    pub crouch_knee_angle: f32,
    /// しゃがみ判定の重心降下量（基準からのフレーム高さ比）
    #[serde(default = "default_jump_crouch_com_drop")]
    pub crouch_com_drop: f32,
    /// 離地判定の足首上昇量（基準からのフレーム高さ比、両足同時）
    #[serde(default = "default_jump_takeoff_rise")]
    pub takeoff_rise: f32,
    /// 両足首上昇量の許容差。これ以内なら両足跳び、超えたら非対称
    #[serde(default = "default_jump_symmetry_tolerance")]
    pub symmetry_tolerance: f32,
    /// 着地判定: 基準との足首高さ差がこの値未満に戻る
    #[serde(default = "default_jump_landing_settle")]
    pub landing_settle: f32,
    /// 着地で衝撃吸収とみなす膝屈曲角（この値未満、度）
    #[serde(default = "default_jump_absorb_knee_angle")]
    pub absorb_knee_angle: f32,
}

fn default_jump_crouch_knee_angle() -> f32 { 120.0 }
fn default_jump_crouch_com_drop() -> f32 { 0.03 }
fn default_jump_takeoff_rise() -> f32 { 0.03 }
fn default_jump_symmetry_tolerance() -> f32 { 0.02 }
fn default_jump_landing_settle() -> f32 { 0.015 }
fn default_jump_absorb_knee_angle() -> f32 { 160.0 }

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            crouch_knee_angle: default_jump_crouch_knee_angle(),
            crouch_com_drop: default_jump_crouch_com_drop(),
            takeoff_rise: default_jump_takeoff_rise(),
            symmetry_tolerance: default_jump_symmetry_tolerance(),
            landing_settle: default_jump_landing_settle(),
            absorb_knee_angle: default_jump_absorb_knee_angle(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TiptoeConfig {
    /// 底屈角がこの値以上で踵上げとみなす（度）
    #[serde(default = "default_tt_plantarflexion")]
    pub plantarflexion: f32,
    /// 踵の基準位置からの最小上昇量（フレーム高さ比）
    #[serde(default = "default_tt_heel_rise")]
    pub heel_rise: f32,
    /// 脚長比ヒューリスティック: 見かけの脚長がこの倍率を超えたら踵上げ
    #[serde(default = "default_tt_leg_ratio")]
    pub leg_ratio: f32,
    /// 必要連続保持時間（秒）
    #[serde(default = "default_tt_hold_secs")]
    pub hold_secs: f32,
    /// フレーム間の足位置ドリフト許容量（これを超えたら保持リセット）
    #[serde(default = "default_tt_max_drift")]
    pub max_drift: f32,
}

fn default_tt_plantarflexion() -> f32 { 30.0 }
fn default_tt_heel_rise() -> f32 { 0.02 }
fn default_tt_leg_ratio() -> f32 { 1.04 }
fn default_tt_hold_secs() -> f32 { 3.0 }
fn default_tt_max_drift() -> f32 { 0.05 }

impl Default for TiptoeConfig {
    fn default() -> Self {
        Self {
            plantarflexion: default_tt_plantarflexion(),
            heel_rise: default_tt_heel_rise(),
            leg_ratio: default_tt_leg_ratio(),
            hold_secs: default_tt_hold_secs(),
            max_drift: default_tt_max_drift(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SquatConfig {
    /// 膝屈曲角がこの値未満でパーシャルスクワット（度）
    #[serde(default = "default_sq_partial_angle")]
    pub partial_angle: f32,
    /// この値未満でパラレル（度）
    #[serde(default = "default_sq_parallel_angle")]
    pub parallel_angle: f32,
    /// この値未満でディープ（度）
    #[serde(default = "default_sq_deep_angle")]
    pub deep_angle: f32,
    /// 深さクロスチェック: 腰が膝にこの比率まで近づいたら角度計算を信用する
    /// (腰y - 膝y) / 脚長。遮蔽による角度誤計算の防御
    #[serde(default = "default_sq_depth_ratio")]
    pub depth_ratio: f32,
    /// 体幹前傾がこの値以下なら直立（度）
    #[serde(default = "default_sq_trunk_upright")]
    pub trunk_upright: f32,
    /// この値以下なら良好、超えたら過剰前傾（度）
    #[serde(default = "default_sq_trunk_good")]
    pub trunk_good: f32,
    /// 膝間/足首間の幅比がこの値未満で軽度の外反
    #[serde(default = "default_sq_valgus_mild")]
    pub valgus_mild: f32,
    /// この値未満で顕著な外反
    #[serde(default = "default_sq_valgus_significant")]
    pub valgus_significant: f32,
}

fn default_sq_partial_angle() -> f32 { 150.0 }
fn default_sq_parallel_angle() -> f32 { 110.0 }
fn default_sq_deep_angle() -> f32 { 80.0 }
fn default_sq_depth_ratio() -> f32 { 0.5 }
fn default_sq_trunk_upright() -> f32 { 15.0 }
fn default_sq_trunk_good() -> f32 { 30.0 }
fn default_sq_valgus_mild() -> f32 { 0.9 }
fn default_sq_valgus_significant() -> f32 { 0.7 }

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            partial_angle: default_sq_partial_angle(),
            parallel_angle: default_sq_parallel_angle(),
            deep_angle: default_sq_deep_angle(),
            depth_ratio: default_sq_depth_ratio(),
            trunk_upright: default_sq_trunk_upright(),
            trunk_good: default_sq_trunk_good(),
            valgus_mild: default_sq_valgus_mild(),
            valgus_significant: default_sq_valgus_significant(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 読み込み失敗時は既定値にフォールバック
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = Config::default();
        assert_eq!(config.one_leg.ankle_diff, 0.03);
        assert_eq!(config.one_leg.knee_bend_diff, 15.0);
        assert_eq!(config.one_leg.knee_height_diff, 0.02);
        assert_eq!(config.tiptoe.plantarflexion, 30.0);
        assert_eq!(config.raise_hand.min_flexion, 150.0);
        assert_eq!(config.raise_hand.min_extension, 170.0);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml = r#"
            [one_leg]
            ankle_diff = 0.05

            [tiptoe]
            hold_secs = 2.0
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.one_leg.ankle_diff, 0.05);
        // 未指定フィールドは既定値のまま
        assert_eq!(config.one_leg.knee_bend_diff, 15.0);
        assert_eq!(config.tiptoe.hold_secs, 2.0);
        assert_eq!(config.tiptoe.plantarflexion, 30.0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.measure.visibility, 0.5);
        assert_eq!(config.gait.target_steps, 6);
    }
}
