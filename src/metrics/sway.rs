use serde::Serialize;

/// 動揺量の重み（balance_index への寄与）
pub const MAGNITUDE_WEIGHT: f32 = 1.0;
/// 軌跡長の重み
pub const PATH_WEIGHT: f32 = 0.5;
/// 95%信頼楕円面積の重み
pub const AREA_WEIGHT: f32 = 10.0;
/// balance_index がこの値で安定スコア0になる
pub const MAX_BALANCE_INDEX: f32 = 1.0;

/// χ²分布 自由度2・95%点。信頼楕円の面積係数
const CHI2_95_2DOF: f32 = 5.991;

/// 安定性の区分（スコア ≥80/≥60/≥40/それ未満）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwayLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SwayLevel {
    fn from_score(score: f32) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// 重心動揺の解析結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwayAnalysis {
    pub mean_x: f32,
    pub mean_y: f32,
    pub std_x: f32,
    pub std_y: f32,
    /// 平均位置からの偏差のRMS
    pub magnitude: f32,
    /// 累積軌跡長
    pub path_length: f32,
    /// 95%信頼楕円の面積
    pub area: f32,
    /// 動揺量・軌跡長・面積の重み付き和
    pub balance_index: f32,
    /// 0〜100。大きいほど安定
    pub stability_score: f32,
    pub level: SwayLevel,
}

impl SwayAnalysis {
    /// 長さ不一致・空入力のときの最も保守的な結果
    fn worst_case() -> Self {
        Self {
            mean_x: 0.0,
            mean_y: 0.0,
            std_x: 0.0,
            std_y: 0.0,
            magnitude: 0.0,
            path_length: 0.0,
            area: 0.0,
            balance_index: MAX_BALANCE_INDEX,
            stability_score: 0.0,
            level: SwayLevel::Poor,
        }
    }

    /// 左右方向と前後方向の動揺サンプル系列から解析する
    ///
    /// 系列は同一長であること。不一致・空の場合はエラーにせず
    /// worst case（スコア0 / poor）を返す
    pub fn from_series(lateral: &[f32], forward: &[f32]) -> Self {
        if lateral.is_empty() || lateral.len() != forward.len() {
            return Self::worst_case();
        }

        let n = lateral.len() as f32;
        let mean_x = lateral.iter().sum::<f32>() / n;
        let mean_y = forward.iter().sum::<f32>() / n;

        let var_x = lateral.iter().map(|v| (v - mean_x) * (v - mean_x)).sum::<f32>() / n;
        let var_y = forward.iter().map(|v| (v - mean_y) * (v - mean_y)).sum::<f32>() / n;
        let std_x = var_x.sqrt();
        let std_y = var_y.sqrt();

        // 平均位置からの半径方向偏差のRMS
        let magnitude = (lateral
            .iter()
            .zip(forward.iter())
            .map(|(&x, &y)| {
                let dx = x - mean_x;
                let dy = y - mean_y;
                dx * dx + dy * dy
            })
            .sum::<f32>()
            / n)
            .sqrt();

        let path_length = lateral
            .windows(2)
            .zip(forward.windows(2))
            .map(|(xs, ys)| {
                let dx = xs[1] - xs[0];
                let dy = ys[1] - ys[0];
                (dx * dx + dy * dy).sqrt()
            })
            .sum::<f32>();

        let area = std::f32::consts::PI * CHI2_95_2DOF * std_x * std_y;

        let balance_index =
            MAGNITUDE_WEIGHT * magnitude + PATH_WEIGHT * path_length + AREA_WEIGHT * area;

        let stability_score = ((1.0 - balance_index / MAX_BALANCE_INDEX) * 100.0).clamp(0.0, 100.0);

        Self {
            mean_x,
            mean_y,
            std_x,
            std_y,
            magnitude,
            path_length,
            area,
            balance_index,
            stability_score,
            level: SwayLevel::from_score(stability_score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_poor() {
        let a = SwayAnalysis::from_series(&[], &[]);
        assert_eq!(a.stability_score, 0.0);
        assert_eq!(a.level, SwayLevel::Poor);
    }

    #[test]
    fn test_mismatched_lengths_is_poor() {
        let a = SwayAnalysis::from_series(&[0.5, 0.5], &[0.5]);
        assert_eq!(a.stability_score, 0.0);
        assert_eq!(a.level, SwayLevel::Poor);
    }

    #[test]
    fn test_perfectly_still_is_excellent() {
        let lateral = vec![0.5; 60];
        let forward = vec![0.5; 60];
        let a = SwayAnalysis::from_series(&lateral, &forward);
        assert_eq!(a.magnitude, 0.0);
        assert_eq!(a.path_length, 0.0);
        assert!(a.stability_score > 80.0);
        assert_eq!(a.level, SwayLevel::Excellent);
    }

    #[test]
    fn test_large_sway_is_poor() {
        // 左右に±0.1を往復する大振幅動揺
        let lateral: Vec<f32> = (0..60).map(|i| if i % 2 == 0 { 0.4 } else { 0.6 }).collect();
        let forward = vec![0.5; 60];
        let a = SwayAnalysis::from_series(&lateral, &forward);
        assert!(a.stability_score < 40.0, "score {}", a.stability_score);
        assert_eq!(a.level, SwayLevel::Poor);
    }

    #[test]
    fn test_gentle_sway_scores_between() {
        // ゆっくり小さく揺れる: 完全静止より悪く、大振幅より良い
        let lateral: Vec<f32> = (0..90)
            .map(|i| 0.5 + (i as f32 * 0.2).sin() * 0.005)
            .collect();
        let forward = vec![0.5; 90];
        let a = SwayAnalysis::from_series(&lateral, &forward);
        assert!(a.stability_score > 40.0);
        assert!(a.stability_score < 100.0);
    }

    #[test]
    fn test_score_in_range() {
        let lateral: Vec<f32> = (0..30).map(|i| (i as f32 * 0.7).sin()).collect();
        let forward: Vec<f32> = (0..30).map(|i| (i as f32 * 1.3).cos()).collect();
        let a = SwayAnalysis::from_series(&lateral, &forward);
        assert!((0.0..=100.0).contains(&a.stability_score));
    }

    #[test]
    fn test_single_sample() {
        let a = SwayAnalysis::from_series(&[0.5], &[0.5]);
        assert_eq!(a.path_length, 0.0);
        assert_eq!(a.magnitude, 0.0);
        assert_eq!(a.level, SwayLevel::Excellent);
    }
}
