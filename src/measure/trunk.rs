use crate::pose::{LandmarkIndex, Pose};
use serde::Serialize;

/// 後方代償が軽度とみなされる後傾角（度）
pub const BACK_LEAN_MILD: f32 = 10.0;
/// 顕著な後方代償の後傾角（度）
pub const BACK_LEAN_SIGNIFICANT: f32 = 20.0;

/// 体幹後傾による代償の区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackCompensation {
    None,
    Mild,
    Significant,
}

/// 体幹の鉛直からの傾き（度）
///
/// 肩中点と腰中点を結ぶ線の傾き。方向は区別しない
/// 腰・肩のランドマークが欠けたら0°（直立の中立）を返す
pub fn trunk_lean(pose: &Pose, visibility: f32) -> f32 {
    let shoulder = pose.midpoint(
        LandmarkIndex::LeftShoulder,
        LandmarkIndex::RightShoulder,
        visibility,
    );
    let hip = pose.midpoint(LandmarkIndex::LeftHip, LandmarkIndex::RightHip, visibility);

    match (shoulder, hip) {
        (Some((sx, sy)), Some((hx, hy))) => {
            let dx = (sx - hx).abs();
            let dy = (sy - hy).abs();
            if dx < 1e-9 && dy < 1e-9 {
                return 0.0;
            }
            dx.atan2(dy).to_degrees()
        }
        _ => 0.0,
    }
}

/// 後方への体幹傾斜（z軸方向）から代償の有無を分類する
///
/// BlazePoseのzは腰基準の相対奥行きで、後傾すると肩のzが腰より大きくなる
/// 2Dソース（z=0）では常にNoneになる
pub fn back_compensation(pose: &Pose, visibility: f32) -> BackCompensation {
    let ls = pose.get(LandmarkIndex::LeftShoulder);
    let rs = pose.get(LandmarkIndex::RightShoulder);
    let lh = pose.get(LandmarkIndex::LeftHip);
    let rh = pose.get(LandmarkIndex::RightHip);

    if !ls.is_visible(visibility)
        || !rs.is_visible(visibility)
        || !lh.is_visible(visibility)
        || !rh.is_visible(visibility)
    {
        return BackCompensation::None;
    }

    let dz = (ls.z + rs.z) / 2.0 - (lh.z + rh.z) / 2.0;
    let dy = ((lh.y + rh.y) / 2.0 - (ls.y + rs.y) / 2.0).abs();

    // 後傾のみを代償とみなす（dz > 0 = 肩が腰より奥）
    if dz <= 0.0 || dy < 1e-9 {
        return BackCompensation::None;
    }

    let backward_lean = dz.atan2(dy).to_degrees();
    if backward_lean >= BACK_LEAN_SIGNIFICANT {
        BackCompensation::Significant
    } else if backward_lean >= BACK_LEAN_MILD {
        BackCompensation::Mild
    } else {
        BackCompensation::None
    }
}
