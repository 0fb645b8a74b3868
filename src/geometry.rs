use nalgebra::Vector3;

use crate::pose::Landmark;

/// ゼロ長ベクトル判定の閾値
const EPS: f32 = 1e-9;

fn to_vector(from: &Landmark, to: &Landmark) -> Vector3<f32> {
    Vector3::new(to.x - from.x, to.y - from.y, to.z - from.z)
}

/// 頂点bにおける∠abcを度で返す
///
/// dot / (|ba||bc|) をacosに渡す前に[-1, 1]へクランプする
/// （浮動小数点誤差でわずかに範囲外になるため）
/// どちらかのベクトルがゼロ長なら0を返す。NaNは返さない
/// zは両点が持っていればそのまま効き、2Dソースではz=0なので自然に2D計算になる
pub fn angle_between(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let ba = to_vector(b, a);
    let bc = to_vector(b, c);

    let mag = ba.norm() * bc.norm();
    if mag < EPS {
        return 0.0;
    }

    let cos = (ba.dot(&bc) / mag).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// 2点間のユークリッド距離
pub fn distance(a: &Landmark, b: &Landmark) -> f32 {
    to_vector(a, b).norm()
}

/// 2点とΔtから速度（正規化座標/秒）を計算
/// Δt = 0 のときは0を返す
pub fn velocity(a: &Landmark, b: &Landmark, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    distance(a, b) / dt
}
