//! 通常葉（ordinary leaves）の寄与 S1。Gourdon 変種では Φ₀ と呼ばれる項。
//!
//! S1(x, y, c) = Σ_{m ≤ y, μ(m) ≠ 0, lpf(m) > primes[c]} μ(m) · φ(x/m, c)
//!
//! φ は PhiTiny の閉形式なので、m を 1..=y で走査するだけの単純和。
//! m = 1 は μ = 1・lpf = ∞ の扱いで常に含まれる（φ(x, c) 本体の項）。

use crate::phi_tiny::PhiTiny;
use crate::scalar::{Accum, CountInt};

/// S1 / Φ₀。`mu` と `lpf` は generators.rs の配列（長さ y+1）。
pub fn ordinary_leaves<T: CountInt>(
    x: T,
    y: u64,
    c: u64,
    primes: &[u32],
    mu: &[i8],
    lpf: &[u32],
) -> T::Acc {
    let tiny = PhiTiny::get();
    let prime_c = primes[c as usize];
    let mut sum = T::Acc::default();

    for m in 1..=y {
        let mu_m = mu[m as usize];
        if mu_m == 0 || lpf[m as usize] <= prime_c {
            continue;
        }
        let phi = tiny.phi_u128(x.to_u128() / u128::from(m), c);
        // φ(x/m, c) ≤ x/m ≤ x。u128 で評価して符号付きで畳む
        let term = T::Acc::from_i128(phi as i128);
        if mu_m > 0 {
            sum += term;
        } else {
            sum -= term;
        }
    }
    sum
}
