use super::{Side, NEUTRAL_STRAIGHT};
use crate::geometry::angle_between;
use crate::pose::Pose;

/// 肩屈曲角（腰→肩→肘）
///
/// 腕を下ろした姿勢でほぼ0°、真上に挙げると180°に近づく
/// ランドマーク欠損時は0°（腕を下ろした中立）を返す
pub fn shoulder_flexion(pose: &Pose, side: Side, visibility: f32) -> f32 {
    let hip = pose.get(side.hip());
    let shoulder = pose.get(side.shoulder());
    let elbow = pose.get(side.elbow());

    if !hip.is_visible(visibility)
        || !shoulder.is_visible(visibility)
        || !elbow.is_visible(visibility)
    {
        return 0.0;
    }
    angle_between(hip, shoulder, elbow)
}

/// 肘伸展角（肩→肘→手首）。180°で完全伸展
/// ランドマーク欠損時は180°（まっすぐの中立）を返す
pub fn elbow_extension(pose: &Pose, side: Side, visibility: f32) -> f32 {
    let shoulder = pose.get(side.shoulder());
    let elbow = pose.get(side.elbow());
    let wrist = pose.get(side.wrist());

    if !shoulder.is_visible(visibility)
        || !elbow.is_visible(visibility)
        || !wrist.is_visible(visibility)
    {
        return NEUTRAL_STRAIGHT;
    }
    angle_between(shoulder, elbow, wrist)
}

/// 完全挙上の判定: 肩屈曲と肘伸展が両方とも閾値以上
pub fn full_raise(
    pose: &Pose,
    side: Side,
    visibility: f32,
    min_flexion: f32,
    min_extension: f32,
) -> bool {
    shoulder_flexion(pose, side, visibility) >= min_flexion
        && elbow_extension(pose, side, visibility) >= min_extension
}

/// 両手が頭上にあるか（手首が肩より高い。画像座標なのでyが小さい方が上）
pub fn arms_overhead(pose: &Pose, visibility: f32) -> bool {
    Side::BOTH.iter().all(|&side| {
        let wrist = pose.get(side.wrist());
        let shoulder = pose.get(side.shoulder());
        wrist.is_visible(visibility)
            && shoulder.is_visible(visibility)
            && wrist.y < shoulder.y
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::test_util::{pose_with, standing_pose};
    use crate::pose::LandmarkIndex::*;

    #[test]
    fn test_shoulder_flexion_arm_down() {
        let pose = standing_pose();
        let angle = shoulder_flexion(&pose, Side::Left, 0.5);
        assert!(angle < 30.0, "arm at side should be near 0, got {}", angle);
    }

    #[test]
    fn test_shoulder_flexion_arm_overhead() {
        // 腕を真上に: 肘が肩の真上
        let pose = pose_with(&[
            (LeftHip, 0.56, 0.52),
            (LeftShoulder, 0.56, 0.25),
            (LeftElbow, 0.56, 0.12),
        ]);
        let angle = shoulder_flexion(&pose, Side::Left, 0.5);
        assert!(angle > 160.0, "overhead arm should be near 180, got {}", angle);
    }

    #[test]
    fn test_shoulder_flexion_missing_landmark_neutral() {
        let pose = pose_with(&[(LeftHip, 0.56, 0.52), (LeftShoulder, 0.56, 0.25)]);
        assert_eq!(shoulder_flexion(&pose, Side::Left, 0.5), 0.0);
    }

    #[test]
    fn test_elbow_extension_straight() {
        let pose = standing_pose();
        let angle = elbow_extension(&pose, Side::Right, 0.5);
        assert!(angle > 165.0, "straight arm, got {}", angle);
    }

    #[test]
    fn test_elbow_extension_bent() {
        // 肘を直角に曲げる
        let pose = pose_with(&[
            (LeftShoulder, 0.5, 0.25),
            (LeftElbow, 0.5, 0.40),
            (LeftWrist, 0.65, 0.40),
        ]);
        let angle = elbow_extension(&pose, Side::Left, 0.5);
        assert!((angle - 90.0).abs() < 5.0, "bent elbow, got {}", angle);
    }

    #[test]
    fn test_elbow_extension_missing_landmark_neutral() {
        let pose = pose_with(&[(LeftShoulder, 0.5, 0.25)]);
        assert_eq!(elbow_extension(&pose, Side::Left, 0.5), NEUTRAL_STRAIGHT);
    }

    #[test]
    fn test_full_raise() {
        // 左腕を真上に伸ばした姿勢
        let pose = pose_with(&[
            (LeftHip, 0.56, 0.52),
            (LeftShoulder, 0.56, 0.25),
            (LeftElbow, 0.56, 0.12),
            (LeftWrist, 0.56, 0.01),
        ]);
        assert!(full_raise(&pose, Side::Left, 0.5, 150.0, 170.0));
        assert!(!full_raise(&standing_pose(), Side::Left, 0.5, 150.0, 170.0));
    }

    #[test]
    fn test_arms_overhead() {
        let raised = pose_with(&[
            (LeftShoulder, 0.58, 0.25),
            (RightShoulder, 0.42, 0.25),
            (LeftWrist, 0.58, 0.05),
            (RightWrist, 0.42, 0.05),
        ]);
        assert!(arms_overhead(&raised, 0.5));
        assert!(!arms_overhead(&standing_pose(), 0.5));
    }

    #[test]
    fn test_arms_overhead_one_wrist_hidden() {
        let pose = pose_with(&[
            (LeftShoulder, 0.58, 0.25),
            (RightShoulder, 0.42, 0.25),
            (LeftWrist, 0.58, 0.05),
            // 右手首なし
        ]);
        assert!(!arms_overhead(&pose, 0.5));
    }
}
