pub mod arms;
pub mod legs;
pub mod trunk;

use crate::pose::LandmarkIndex;

/// 左右どちらの肢かを表す
/// 両側性の計測を1つの関数で書くためのインデックス選択子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn shoulder(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftShoulder,
            Side::Right => LandmarkIndex::RightShoulder,
        }
    }

    pub fn elbow(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftElbow,
            Side::Right => LandmarkIndex::RightElbow,
        }
    }

    pub fn wrist(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftWrist,
            Side::Right => LandmarkIndex::RightWrist,
        }
    }

    pub fn hip(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftHip,
            Side::Right => LandmarkIndex::RightHip,
        }
    }

    pub fn knee(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftKnee,
            Side::Right => LandmarkIndex::RightKnee,
        }
    }

    pub fn ankle(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftAnkle,
            Side::Right => LandmarkIndex::RightAnkle,
        }
    }

    pub fn heel(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftHeel,
            Side::Right => LandmarkIndex::RightHeel,
        }
    }

    pub fn foot_index(self) -> LandmarkIndex {
        match self {
            Side::Left => LandmarkIndex::LeftFootIndex,
            Side::Right => LandmarkIndex::RightFootIndex,
        }
    }

    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// 関節角の解剖学的中立値（まっすぐ伸びた状態）
/// 必要なランドマークが欠けたとき肘・膝の角度はこの値に退化する
pub const NEUTRAL_STRAIGHT: f32 = 180.0;
