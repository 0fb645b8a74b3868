use super::{Side, NEUTRAL_STRAIGHT};
use crate::geometry::angle_between;
use crate::pose::Pose;

/// 直立時の膝→足首→つま先の概算角度。底屈はここからの増分で測る
/// （足首はつま先より上にあるため、立位でもこの角度は90°より開いている）
pub const ANKLE_NEUTRAL_ANGLE: f32 = 120.0;

/// 膝屈曲角（腰→膝→足首）。180°で完全伸展
/// ランドマーク欠損時は180°（まっすぐの中立）を返す
pub fn knee_flexion(pose: &Pose, side: Side, visibility: f32) -> f32 {
    let hip = pose.get(side.hip());
    let knee = pose.get(side.knee());
    let ankle = pose.get(side.ankle());

    if !hip.is_visible(visibility)
        || !knee.is_visible(visibility)
        || !ankle.is_visible(visibility)
    {
        return NEUTRAL_STRAIGHT;
    }
    angle_between(hip, knee, ankle)
}

/// 足関節底屈角（膝→足首→つま先の角度から中立角を引いた増分、度）
///
/// つま先の可視度が不足する場合は踵にフォールバックする
/// どちらも見えなければ0°（底屈なしの中立）
pub fn ankle_plantarflexion(pose: &Pose, side: Side, visibility: f32) -> f32 {
    let knee = pose.get(side.knee());
    let ankle = pose.get(side.ankle());
    if !knee.is_visible(visibility) || !ankle.is_visible(visibility) {
        return 0.0;
    }

    let toe = pose.get(side.foot_index());
    let heel = pose.get(side.heel());
    let foot = if toe.is_visible(visibility) {
        toe
    } else if heel.is_visible(visibility) {
        heel
    } else {
        return 0.0;
    };

    (angle_between(knee, ankle, foot) - ANKLE_NEUTRAL_ANGLE).max(0.0)
}

/// 踵上げの判定: 底屈角が閾値以上
pub fn heel_lift(pose: &Pose, side: Side, visibility: f32, min_plantarflexion: f32) -> bool {
    ankle_plantarflexion(pose, side, visibility) >= min_plantarflexion
}

/// 膝外反の指標: 膝間幅 / 足首間幅
///
/// 1.0付近が中立。1.0を大きく下回るほど膝が内側に入っている
/// 足首間幅がゼロまたはランドマーク欠損時は1.0（中立）を返す
pub fn knee_valgus_ratio(pose: &Pose, visibility: f32) -> f32 {
    let lk = pose.get(Side::Left.knee());
    let rk = pose.get(Side::Right.knee());
    let la = pose.get(Side::Left.ankle());
    let ra = pose.get(Side::Right.ankle());

    if !lk.is_visible(visibility)
        || !rk.is_visible(visibility)
        || !la.is_visible(visibility)
        || !ra.is_visible(visibility)
    {
        return 1.0;
    }

    let knee_width = (lk.x - rk.x).abs();
    let ankle_width = (la.x - ra.x).abs();
    if ankle_width < 1e-6 {
        return 1.0;
    }
    knee_width / ankle_width
}
