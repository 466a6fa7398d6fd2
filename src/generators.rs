//! π(x) エンジンが共有する数論テーブルの生成。
//!
//! - `primes_array`: 先頭に番兵 0 を置いた 1 始まりの素数配列（32bit）。
//!   `primes[k]` が k 番目の素数で、`pi(primes[k]) = k` が成り立ちます。
//! - `make_moebius`: メビウス関数 μ[0..=y]（{-1, 0, +1}、8bit）。
//! - `make_least_prime_factor`: 最小素因数 lpf[0..=y]（32bit）。
//!
//! いずれも π(x) 1 回の呼び出しの中で一度だけ生成され、以後は全ワーカーから
//! 読み取り専用で共有されます。

use std::sync::atomic::AtomicBool;

use crate::engine_types::PrimeResult;
use crate::primes::generate_primes;

/// `[2, y]` の素数を 32bit 配列にする。index 0 は番兵 0。
///
/// 32bit に収まらない素数が現れる場合（y >= 2^32）はドメインエラー。
pub fn primes_array(y: u64, stop_flag: &AtomicBool) -> PrimeResult<Vec<u32>> {
    if y >= u64::from(u32::MAX) {
        return Err(format!("y = {y} exceeds the 32-bit prime array limit").into());
    }
    let raw = generate_primes(y, stop_flag)?;
    let mut primes = Vec::with_capacity(raw.len() + 1);
    primes.push(0u32);
    primes.extend(raw.into_iter().map(|p| p as u32));
    Ok(primes)
}

/// メビウス関数 μ[0..=y]。μ[0] は使用しない（0 を入れておく）。
pub fn make_moebius(y: u64) -> Vec<i8> {
    let size = (y + 1) as usize;
    let mut mu = vec![1i8; size];
    mu[0] = 0;

    // 素数 p ごとに: p の倍数は符号反転、p^2 の倍数は 0
    let mut is_composite = vec![false; size];
    for n in 2..=y {
        if !is_composite[n as usize] {
            let p = n;
            let mut j = p;
            while j <= y {
                if j > p {
                    is_composite[j as usize] = true;
                }
                mu[j as usize] = -mu[j as usize];
                j += p;
            }
            if let Some(p2) = p.checked_mul(p) {
                let mut j = p2;
                while j <= y {
                    mu[j as usize] = 0;
                    j += p2;
                }
            }
        }
    }
    mu
}

/// 最小素因数 lpf[0..=y]。
///
/// - lpf[n] = n を割り切る最小の素数
/// - lpf[1] = u32::MAX（「どの素数より大きい」番兵。special leaf 判定
///   `lpf[m] > primes[b]` が m = 1 で常に真になるようにする）
/// - lpf[0] = 0（未使用）
pub fn make_least_prime_factor(y: u64) -> Vec<u32> {
    let size = (y + 1) as usize;
    let mut lpf = vec![0u32; size];
    if y >= 1 {
        lpf[1] = u32::MAX;
    }

    for n in 2..=y {
        if lpf[n as usize] == 0 {
            // n は素数
            let mut j = n;
            while j <= y {
                if lpf[j as usize] == 0 {
                    lpf[j as usize] = n as u32;
                }
                j += n;
            }
        }
    }
    lpf
}
