use serde::Serialize;

/// 角度系列の可動域統計
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RomStats {
    pub min: f32,
    pub max: f32,
    pub range: f32,
    pub mean: f32,
    pub std_dev: f32,
}

impl RomStats {
    /// 系列から統計を計算する
    ///
    /// 空系列は全ゼロ。要素1つなら range = 0, std_dev = 0
    /// 標準偏差は母集団標準偏差（nで割る）
    pub fn from_series(series: &[f32]) -> Self {
        if series.is_empty() {
            return Self::default();
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0;
        for &v in series {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let n = series.len() as f32;
        let mean = sum / n;

        let variance = series.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;

        Self {
            min,
            max,
            range: max - min,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}
