//! n 番目の素数。
//!
//! 逆 Riemann R 関数で p_n の近似値 g を出し、正確な π(g) を計算してから
//! 残りの距離を分割篩で歩いて合わせる、という挟み撃ち構成。
//! 近似の誤差は π(x) 側が必ず吸収するため、R の精度は結果に影響しない。

use std::sync::atomic::AtomicBool;

use crate::engine_types::PrimeResult;
use crate::primes::{generate_primes, sieve_segment};
use crate::riemann_r::riemann_r_inverse_u64;
use crate::sieve_math::{integer_sqrt, simple_sieve};

/// これ以下の n は篩で直接数えたほうが速い。
const DIRECT_LIMIT: u64 = 100_000;

/// 歩行時のセグメント幅。
const WALK_SEGMENT: u64 = 1 << 21;

/// n 番目の素数（nth_prime(1) = 2）。
pub fn nth_prime(n: u64, threads: usize) -> PrimeResult<u64> {
    if n == 0 {
        return Err("n must be >= 1 for nth_prime".into());
    }

    if n <= DIRECT_LIMIT {
        return nth_prime_direct(n);
    }

    // p_n < n(ln n + ln ln n) (n >= 6) なので u64 に収まるかを先に確認する
    let guess = riemann_r_inverse_u64(n);
    if guess >= u64::MAX / 2 {
        return Err(format!("nth_prime({n}) exceeds the 64-bit range").into());
    }

    let count = crate::prime_pi_engine::pi_with_threads(guess, threads)?;
    log::debug!("nth_prime: n = {n}, guess = {guess}, pi(guess) = {count}");

    if count < n {
        walk_forward(guess, count, n)
    } else {
        walk_backward(guess, count, n)
    }
}

fn nth_prime_direct(n: u64) -> PrimeResult<u64> {
    // p_n の上界: n(ln n + ln ln n) (n >= 6)
    let nf = n as f64;
    let bound = if n < 6 {
        16
    } else {
        (nf * (nf.ln() + nf.ln().ln())) as u64 + 2
    };
    let stop = AtomicBool::new(false);
    let primes = generate_primes(bound, &stop)?;
    primes
        .get((n - 1) as usize)
        .copied()
        .ok_or_else(|| format!("prime upper bound {bound} too small for n = {n}").into())
}

/// π(g) = count < n: g より上を篩って残り n − count 個目を取る。
fn walk_forward(g: u64, count: u64, n: u64) -> PrimeResult<u64> {
    let mut running = count;
    let mut low = g + 1;
    loop {
        let high = low.saturating_add(WALK_SEGMENT - 1);
        let base = simple_sieve(integer_sqrt(high) + 1)?;
        for p in sieve_segment(low.max(7), high, &base) {
            running += 1;
            if running == n {
                return Ok(p);
            }
        }
        if high == u64::MAX {
            return Err(format!("nth_prime({n}) exceeds the 64-bit range").into());
        }
        low = high + 1;
    }
}

/// π(g) = count >= n: g 以下の素数を降順に歩いて count を n まで戻す。
fn walk_backward(g: u64, count: u64, n: u64) -> PrimeResult<u64> {
    let mut running = count;
    let mut high = g;
    loop {
        let low = high.saturating_sub(WALK_SEGMENT - 1).max(2);
        let base = simple_sieve(integer_sqrt(high) + 1)?;
        let mut segment = Vec::new();
        for small in [2u64, 3, 5] {
            if low <= small && small <= high {
                segment.push(small);
            }
        }
        if high >= 7 {
            segment.extend(sieve_segment(low.max(7), high, &base));
        }
        // segment は昇順。最大の素数 p は π(p) = running を満たす
        for &p in segment.iter().rev() {
            if running == n {
                return Ok(p);
            }
            running -= 1;
        }
        if low == 2 {
            return Err(format!("nth_prime walk failed for n = {n}").into());
        }
        high = low - 1;
    }
}
