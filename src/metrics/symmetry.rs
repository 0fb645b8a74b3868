use serde::Serialize;

/// 左右差の区分
/// 差率の境界: ≤5 excellent / ≤10 good / ≤20 fair / >20 poor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymmetryLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SymmetryLevel {
    fn from_percentage(pct: f32) -> Self {
        if pct <= 5.0 {
            Self::Excellent
        } else if pct <= 10.0 {
            Self::Good
        } else if pct <= 20.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// 左右対称性の評価結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Symmetry {
    pub difference: f32,
    /// |L-R| / ((L+R)/2) × 100
    pub percentage: f32,
    pub level: SymmetryLevel,
}

impl Symmetry {
    /// 左右2値から対称性を計算する
    ///
    /// 両方0なら差なし（0% / excellent）
    /// 基準値が0なのに値が異なる場合はゼロ除算を避けつつ
    /// 最大の非対称（100% / poor）として扱う
    pub fn from_pair(left: f32, right: f32) -> Self {
        let difference = (left - right).abs();
        let reference = (left + right) / 2.0;

        let percentage = if difference == 0.0 {
            0.0
        } else if reference.abs() < f32::EPSILON {
            100.0
        } else {
            difference / reference.abs() * 100.0
        };

        Self {
            difference,
            percentage,
            level: SymmetryLevel::from_percentage(percentage),
        }
    }
}
