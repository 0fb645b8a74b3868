use serde::{Deserialize, Serialize};

/// BlazePose の 33 ランドマークインデックス
/// インデックス→部位の対応は固定で、実行時に変更されない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    pub fn from_index(index: usize) -> Option<Self> {
        use LandmarkIndex::*;
        const TABLE: [LandmarkIndex; LandmarkIndex::COUNT] = [
            Nose, LeftEyeInner, LeftEye, LeftEyeOuter, RightEyeInner, RightEye,
            RightEyeOuter, LeftEar, RightEar, MouthLeft, MouthRight, LeftShoulder,
            RightShoulder, LeftElbow, RightElbow, LeftWrist, RightWrist, LeftPinky,
            RightPinky, LeftIndex, RightIndex, LeftThumb, RightThumb, LeftHip,
            RightHip, LeftKnee, RightKnee, LeftAnkle, RightAnkle, LeftHeel,
            RightHeel, LeftFootIndex, RightFootIndex,
        ];
        TABLE.get(index).copied()
    }
}

/// 単一ランドマーク
///
/// 座標はカメラフレームに正規化された値 (0.0〜1.0)
/// 2Dのみのポーズソースでは z = 0.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    /// 可視度スコア (0.0〜1.0)
    #[serde(default = "default_visibility")]
    pub visibility: f32,
}

fn default_visibility() -> f32 {
    1.0
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, z: 0.0, visibility }
    }

    pub fn new_3d(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// 可視度が閾値以上か
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 0.0,
        }
    }
}

/// 33ランドマークからなる1フレーム分の姿勢
/// パイプラインに渡された後は不変として扱う
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pose {
    #[serde(with = "serde_landmarks")]
    pub landmarks: [Landmark; LandmarkIndex::COUNT],
}

impl Pose {
    pub fn new(landmarks: [Landmark; LandmarkIndex::COUNT]) -> Self {
        Self { landmarks }
    }

    /// インデックスでランドマークを取得
    pub fn get(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks[index as usize]
    }

    /// 左右ペアの中点 (x, y)。どちらかが可視度不足なら None
    pub fn midpoint(
        &self,
        left: LandmarkIndex,
        right: LandmarkIndex,
        threshold: f32,
    ) -> Option<(f32, f32)> {
        let l = self.get(left);
        let r = self.get(right);
        if l.is_visible(threshold) && r.is_visible(threshold) {
            Some(((l.x + r.x) / 2.0, (l.y + r.y) / 2.0))
        } else {
            None
        }
    }

    /// 体幹中心（左右腰の中点）の推定重心位置
    /// 腰が見えない場合は None
    pub fn center_of_mass(&self, threshold: f32) -> Option<(f32, f32)> {
        self.midpoint(LandmarkIndex::LeftHip, LandmarkIndex::RightHip, threshold)
    }

    /// 全ランドマークの平均可視度
    pub fn average_visibility(&self) -> f32 {
        let sum: f32 = self.landmarks.iter().map(|l| l.visibility).sum();
        sum / LandmarkIndex::COUNT as f32
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            landmarks: [Landmark::default(); LandmarkIndex::COUNT],
        }
    }
}

/// serdeは長さ33の配列を直接導出できないため、Vec経由で変換する
mod serde_landmarks {
    use super::{Landmark, LandmarkIndex};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        landmarks: &[Landmark; LandmarkIndex::COUNT],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(landmarks.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[Landmark; LandmarkIndex::COUNT], D::Error> {
        let vec: Vec<Landmark> = Vec::deserialize(deserializer)?;
        let len = vec.len();
        vec.try_into()
            .map_err(|_| D::Error::custom(format!("expected 33 landmarks, got {}", len)))
    }
}
