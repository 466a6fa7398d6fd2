//! P2 項: y < p ≤ q かつ p·q ≤ x となる素数ペアの個数。
//!
//! P2(x, y) = Σ_{i=π(y)+1}^{π(√x)} ( π(x/primes[i]) − (i − 1) )
//!
//! π 表を √x まで持たずに済ませるため、(y, x/y] の領域をセグメント篩で
//! 昇順に走査し、π(x/p) を「π(y) + 領域内の走行素数カウント」で合成します。
//! p 自身は各セグメント [low, high) に対応する小区間 (x/high, x/low] を
//! その場で篩って列挙します（セグメントごとに互いに素な区間になる）。
//!
//! 展開すると P2 = Σ_seg ( local + running·k_seg ) + k·π(y)·0 の形になり、
//! インデックス和 Σ(i−1) は k(k−1)/2 として閉形式で引けます
//! （running は直前セグメントまでの領域内素数数、k は p の総数）。
//!
//! ウェーブは LoadBalancerP2 が配り、結合はセグメント順で行うため
//! スレッド数に依らず同じ値になります。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::engine_types::PrimeResult;
use crate::load_balancer::LoadBalancerP2;
use crate::primes::sieve_segment;
use crate::scalar::{integer_sqrt_u128, Accum, CountInt};
use crate::sieve_math::simple_sieve;
use crate::status::Status;

struct SegmentResult {
    /// セグメント内の素数の個数（走行カウント更新用）
    seg_primes: u64,
    /// Σ_p（このセグメント内で x/p 以下の素数の個数）
    local_sum: u64,
    /// このセグメントに x/p が落ちる p の個数
    p_count: u64,
}

/// `[low, high)` の素数を昇順で返す（2, 3, 5 も含む完全版）。
fn primes_in(low: u64, high_exclusive: u64, base: &[u64]) -> Vec<u64> {
    if low >= high_exclusive {
        return Vec::new();
    }
    let mut out = Vec::new();
    for small in [2u64, 3, 5] {
        if low <= small && small < high_exclusive {
            out.push(small);
        }
    }
    if high_exclusive > 7 {
        out.extend(sieve_segment(low.max(7), high_exclusive - 1, base));
    }
    out
}

fn p2_segment<T: CountInt>(
    x: T,
    y: u64,
    sqrt_x: u64,
    low: u64,
    high: u64,
    base: &[u64],
) -> SegmentResult {
    // q 側: セグメント内の素数（昇順）
    let qs = primes_in(low, high, base);
    let seg_primes = qs.len() as u64;

    // p 側: x/p ∈ [low, high) ⟺ p ∈ (x/high, x/low]
    let p_min = x.div_u64(high).to_u64_exact().max(y);
    let p_max = x.div_u64(low).to_u64_exact().min(sqrt_x);
    if p_min >= p_max {
        return SegmentResult {
            seg_primes,
            local_sum: 0,
            p_count: 0,
        };
    }

    let ps = primes_in(p_min + 1, p_max + 1, base);
    let mut local_sum = 0u64;
    let mut p_count = 0u64;
    for &p in &ps {
        let t = x.div_u64(p).to_u64_exact();
        debug_assert!(low <= t && t < high);
        // セグメント内で t 以下の素数の個数（qs は昇順なので 2 分探索）
        let cnt = qs.partition_point(|&q| q <= t) as u64;
        local_sum += cnt;
        p_count += 1;
    }

    SegmentResult {
        seg_primes,
        local_sum,
        p_count,
    }
}

/// P2(x, y)。
///
/// インデックス項 Σ(i−1) は π(y) が相殺されて k(k−1)/2 の閉形式に畳まれるため、
/// π 表も π(y) も引数に要らない。
pub fn p2<T: CountInt>(
    x: T,
    y: u64,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
) -> PrimeResult<T::Acc> {
    let sqrt_x = integer_sqrt_u128(x.to_u128()) as u64;
    if y >= sqrt_x {
        return Ok(T::Acc::default());
    }

    let limit = x.div_u64(y).to_u64_exact();
    let base = simple_sieve(integer_sqrt_u128(u128::from(limit)) as u64 + 1)?;

    let mut balancer = LoadBalancerP2::new(limit, threads);
    let mut status = Status::new("P2", status_enabled);

    let mut sum = T::Acc::default();
    let mut running = 0u64; // (y, low) の領域内素数数
    let mut k_total = 0u64;
    let mut low = y + 1;

    while low <= limit {
        if stop_flag.load(Ordering::SeqCst) {
            return Err("P2 stopped before completion".into());
        }

        let segment_size = balancer.segment_size();
        let segments = threads as u64 * balancer.segments_per_thread();
        let wave_start = Instant::now();

        let mut bounds: Vec<(u64, u64)> = Vec::new();
        let mut lo = low;
        for _ in 0..segments {
            if lo > limit {
                break;
            }
            let hi = lo.saturating_add(segment_size).min(limit + 1);
            bounds.push((lo, hi));
            lo = hi;
        }

        let results: Vec<SegmentResult> = bounds
            .par_iter()
            .map(|&(lo, hi)| p2_segment(x, y, sqrt_x, lo, hi, &base))
            .collect();

        // セグメント順の決定的な結合
        for r in &results {
            sum += T::Acc::from_u64(r.local_sum) + T::Acc::from_u64(running).mul_i64(r.p_count as i64);
            running += r.seg_primes;
            k_total += r.p_count;
        }

        low = lo;
        balancer.update(low, wave_start.elapsed().as_secs_f64());
        status.wave_done(low.min(limit) - y, limit - y);
    }

    // Σ(i−1) の閉形式分を引く
    let correction = (k_total as i128 * (k_total as i128 - 1)) / 2;
    Ok(T::Acc::from_i128(sum.to_i128() - correction))
}
