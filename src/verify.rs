use crate::engine_types::PrimeResult;

/// 64bit 整数に対する決定的 Miller-Rabin 素数判定。
///
/// この関数は `--verify` モードでの nth prime 結果の素数性チェックに使われます。
/// 計算コストが支配的になることはほぼないため、
/// 可読性と安全性（既知の基数セットによる決定的判定）を優先しています。
///
/// 参考: https://miller-rabin.appspot.com/ （64bit 用の既知の基数セット）
pub fn is_probable_prime(n: u64) -> bool {
    // 小さいケース
    if n < 2 {
        return false;
    }
    if n == 2 || n == 3 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    // n-1 = d * 2^s を求める
    let mut d = n - 1;
    let mut s = 0u32;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    // 64bit 決定的テスト用の基数
    const BASES: [u64; 7] = [2, 325, 9375, 28178, 450775, 9780504, 1795265022];

    for &a in &BASES {
        if a % n == 0 {
            continue;
        }
        if !miller_rabin_round(n, d, s, a) {
            return false;
        }
    }
    true
}

fn miller_rabin_round(n: u64, d: u64, s: u32, a: u64) -> bool {
    let mut x = mod_pow(a % n, d, n);
    if x == 1 || x == n - 1 {
        return true;
    }

    for _ in 1..s {
        x = mod_mul(x, x, n);
        if x == n - 1 {
            return true;
        }
    }
    false
}

fn mod_mul(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn mod_pow(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut res = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            res = mod_mul(res, base, m);
        }
        base = mod_mul(base, base, m);
        exp >>= 1;
    }
    res
}

/// π(x) の結果を別アルゴリズムで再計算して突き合わせる深い検証。
///
/// 一致すれば Ok、食い違えばエラー（どちらが正しいかはここでは判定しない）。
pub fn cross_check_pi(x: u64, result: u64, threads: usize) -> PrimeResult<()> {
    use crate::prime_pi_engine::{pi_with_algorithm, Algorithm};
    use std::sync::atomic::AtomicBool;

    let stop = AtomicBool::new(false);
    let other = pi_with_algorithm(x, threads, Algorithm::DelegliseRivat, &stop, false, None)?;
    if other != result {
        return Err(format!(
            "verification failed: gourdon pi({x}) = {result} but deleglise-rivat pi({x}) = {other}"
        )
        .into());
    }
    Ok(())
}
