/// 移動平均による角度系列の平滑化
///
/// 各位置を中心とする幅windowの窓で平均を取る（端は窓を切り詰める）
/// window <= 1 は恒等変換。平滑化後の分散は元系列を超えない
pub fn smooth_series(series: &[f32], window: usize) -> Vec<f32> {
    if window <= 1 || series.len() <= 1 {
        return series.to_vec();
    }

    let half = window / 2;
    let mut out = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(series.len());
        let sum: f32 = series[start..end].iter().sum();
        out.push(sum / (end - start) as f32);
    }
    out
}
