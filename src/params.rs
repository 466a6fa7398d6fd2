//! アルゴリズムパラメータ（α, y, z, c）のチューナ。
//!
//! α は log log x の区分ヒューリスティックで選びます。ここの係数は経験値で、
//! 性能にしか影響しません。結果の正しさはパラメータ選択に依存しない設計です
//! （どの α でも同じ π(x) が返ること、がテストの対象）。

use crate::sieve_math::{in_between, integer_root, integer_sqrt};

/// α = clamp(β · log log x · 補正, 1, x^{1/6})。
///
/// 補正は x の桁数による区分テーブル。小さい x では α を控えめにして
/// テーブル構築コストを抑え、大きい x では篩領域を短くするために増やす。
pub fn alpha_factor(x: u64, beta: f64) -> f64 {
    let xf = x.max(16) as f64;
    let loglogx = xf.ln().ln();
    let digits = xf.log10();
    let tweak = if digits < 10.0 {
        0.7
    } else if digits < 14.0 {
        1.0
    } else if digits < 18.0 {
        1.3
    } else {
        1.6
    };
    let alpha = (beta * loglogx * tweak).max(1.0);
    alpha.min(xf.powf(1.0 / 6.0))
}

/// y = α·x^{1/3} を [x^{1/3}, √x] に収めて返す。
///
/// `alpha_override` は CLI / settings.toml からの明示指定。
pub fn choose_y(x: u64, beta: f64, alpha_override: Option<f64>) -> u64 {
    let x13 = integer_root(x, 3).max(1);
    let sqrt_x = integer_sqrt(x).max(1);
    let alpha = alpha_override
        .filter(|a| a.is_finite() && *a >= 1.0)
        .unwrap_or_else(|| alpha_factor(x, beta));
    let y = (x13 as f64 * alpha) as u64;
    in_between(x13.max(2), y, sqrt_x.max(2))
}

/// LMO 系の y（控えめな α）。
pub fn lmo_y(x: u64, alpha_override: Option<f64>) -> u64 {
    choose_y(x, 1.0, alpha_override)
}

/// easy/hard 分割を使うアルゴリズム用の y 上限: x^{2/5}。
///
/// y ≤ x^{2/5} なら (x/y)^{1/3} ≥ √y が成り立ち、合成数 m の枝
/// （b < π(√y)）に easy 葉が混入しない。π 表で数えた葉と篩で数えた葉が
/// 重複しないための分割条件であって、性能パラメータではない。
fn easy_hard_y_cap(x: u64) -> u64 {
    let r5 = integer_root(x, 5);
    let x25 = r5.saturating_mul(r5);
    x25.max(integer_root(x, 3)).max(2)
}

/// Deléglise–Rivat の y。
pub fn dr_y(x: u64, alpha_override: Option<f64>) -> u64 {
    choose_y(x, 1.3, alpha_override).min(easy_hard_y_cap(x))
}

/// Gourdon 変種の y。
pub fn gourdon_y(x: u64, alpha_override: Option<f64>) -> u64 {
    choose_y(x, 1.5, alpha_override).min(easy_hard_y_cap(x))
}

/// Gourdon 変種の y（128bit 入力）。
///
/// x ≤ 10^21 の範囲では x^{2/5} < 2^32 なので y は必ず u64 に収まる。
/// 64bit 版と同じく x^{2/5} の分割上限を適用する。
pub fn gourdon_y_u128(x: u128, alpha_override: Option<f64>) -> u64 {
    use crate::scalar::integer_cbrt_u128;

    if let Ok(x64) = u64::try_from(x) {
        return gourdon_y(x64, alpha_override);
    }

    let x13 = integer_cbrt_u128(x).max(2);
    let xf = x as f64;
    let loglogx = xf.ln().ln();
    let tweak = 1.6;
    let alpha = alpha_override
        .filter(|a| a.is_finite() && *a >= 1.0)
        .unwrap_or_else(|| (1.5 * loglogx * tweak).max(1.0).min(xf.powf(1.0 / 6.0)));
    let y = (x13 as f64 * alpha) as u128;

    // x^{2/5} 上限（easy/hard 分割条件、64bit 版の easy_hard_y_cap と同じ）
    let x25 = {
        let mut r = xf.powf(0.2) as u128;
        while r.pow(5) > x {
            r -= 1;
        }
        while (r + 1).pow(5) <= x {
            r += 1;
        }
        (r * r).max(x13)
    };
    y.clamp(x13, x25).min(u128::from(u32::MAX) - 1) as u64
}

/// Gourdon 変種の篩上限 z。
///
/// hard leaf の引数 x/n は [1, x/y) に収まるため、z = x/y が篩の上限。
/// （α_z は z/y として一意に決まる。）
///
/// サポート範囲（x ≤ 10^21, y ≥ x^{1/3}）では z は必ず u64 に収まる。
pub fn gourdon_z(x: u128, y: u64) -> u64 {
    let z = x / u128::from(y.max(1));
    z.max(1) as u64
}
