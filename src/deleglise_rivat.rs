//! Deléglise–Rivat 法。
//!
//! π(x) = π(y) − 1 + Φ(x, π(y)) − P2(x, y) の Φ を
//! S1（通常葉）+ S2_trivial + S2_easy + S2_hard に分割します。
//!
//! 葉 n = primes[b]·m（m ∈ (y/p, y], μ(m) ≠ 0, lpf(m) > p）を t = x/n で分類:
//! - trivial: t < p        → φ = 1。π 表だけの閉形式
//! - easy:    p ≤ t < p²   → φ = π(t) − b + 2。π 表引きの歩行
//! - hard:    t ≥ p²       → 篩 + カウンタツリー（LMO と同じ形）
//!
//! hard 側の b は p ≤ x^{1/4} に自然に限られるため、篩の倍数消去が
//! LMO より大幅に軽くなるのがこの方法の要点。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::bit_sieve::BitSieve;
use crate::counters::Counters;
use crate::engine_types::PrimeResult;
use crate::factor_table::FactorTable;
use crate::generators::{make_least_prime_factor, make_moebius, primes_array};
use crate::lmo::{cross_off, div3, init_next_multiples, pi_bsearch};
use crate::load_balancer::LoadBalancerS2;
use crate::p2::p2;
use crate::params::dr_y;
use crate::phi_tiny::get_c;
use crate::pi_table::PiTable;
use crate::s1::ordinary_leaves;
use crate::scalar::{Accum, CountInt};
use crate::sieve_math::{in_between, integer_root, integer_sqrt, simple_sieve};
use crate::status::Status;

/// trivial leaves（φ = 1）の閉形式和。
///
/// S2_trivial = Σ_{b > c, √(x/y) < p_b ≤ y} [ π(y) − π(max(p_b, x/p_b²)) ]
///
/// Gourdon 変種はこの同じ閉形式を Σ 項として使う。
pub fn s2_trivial<T: CountInt>(x: T, y: u64, c: u64, primes: &[u32], pi: &PiTable) -> T::Acc {
    let pi_y = pi.pi(y);
    let sqrt_xy = crate::scalar::integer_sqrt_u128(x.to_u128() / u128::from(y)) as u64;
    let b_start = pi_bsearch(primes, sqrt_xy).max(c) + 1;

    let mut sum = T::Acc::default();
    for b in b_start..=pi_y {
        let prime = u64::from(primes[b as usize]);
        let x_pp = x.div2_to_u64(prime, prime);
        let threshold = x_pp.max(prime).min(y);
        sum += T::Acc::from_u64(pi_y - pi.pi(threshold));
    }
    sum
}

/// easy leaves（p ≤ t < p²）の π 表引き和。
///
/// 各 b について q = primes[l] を降順に歩き、φ(t, b−1) = π(t) − b + 2 を足す。
fn s2_easy(x: u64, y: u64, c: u64, primes: &[u32], pi: &PiTable, threads: usize) -> i64 {
    let x13 = integer_root(x, 3);
    let b_max = pi_bsearch(primes, x13.min(y));
    let b_min = c;
    if b_max <= b_min {
        return 0;
    }

    let chunk = ((b_max - b_min) / (threads.max(1) as u64 * 8)).max(64);
    let ranges: Vec<(u64, u64)> = {
        let mut v = Vec::new();
        let mut b = b_min + 1;
        while b <= b_max {
            let end = (b + chunk - 1).min(b_max);
            v.push((b, end));
            b = end + 1;
        }
        v
    };

    ranges
        .par_iter()
        .map(|&(b_lo, b_hi)| {
            let mut sum = 0i64;
            for b in b_lo..=b_hi {
                let prime = u64::from(primes[b as usize]);
                let x_pp = div3(x, prime, prime); // x / p²
                let x_ppp = (u128::from(x)
                    / (u128::from(prime) * u128::from(prime) * u128::from(prime)))
                    as u64; // x / p³
                let q_max = x_pp.min(y);
                let q_min = x_ppp.max(prime).max(y / prime);
                if q_min >= q_max {
                    continue;
                }
                let l_max = pi.pi(q_max);
                let l_min = pi.pi(q_min);
                for l in (l_min + 1)..=l_max {
                    let q = u64::from(primes[l as usize]);
                    let t = div3(x, prime, q);
                    sum += pi.pi(t) as i64 - b as i64 + 2;
                }
            }
            sum
        })
        .sum()
}

struct HardResult {
    s2: i64,
    phi: Vec<i64>,
    mu_sum: Vec<i64>,
}

/// hard leaves 1 スレッド分。LMO の S2_thread と同じ骨格で、
/// 枝 1 の μ・lpf 判定を FactorTable に、枝 2 の q 上限に x/p³（hard 条件）を加える。
#[allow(clippy::too_many_arguments)]
fn s2_hard_thread(
    x: u64,
    y: u64,
    c: u64,
    pi_sqrty: u64,
    pi_y: u64,
    segment_size: u64,
    segments_per_thread: u64,
    thread_num: u64,
    low: u64,
    limit: u64,
    pi: &PiTable,
    primes: &[u32],
    factor: &FactorTable,
) -> HardResult {
    let mut low = low + segment_size * segments_per_thread * thread_num;
    let limit = (low + segment_size * segments_per_thread).min(limit);
    if low >= limit {
        return HardResult {
            s2: 0,
            phi: Vec::new(),
            mu_sum: Vec::new(),
        };
    }
    let size = pi.pi(integer_sqrt(x / low).min(y)) + 1;
    if c >= size - 1 {
        return HardResult {
            s2: 0,
            phi: Vec::new(),
            mu_sum: Vec::new(),
        };
    }

    let mut s2 = 0i64;
    let mut sieve = BitSieve::new(segment_size as usize);
    let mut counters = Counters::new(segment_size as usize);
    let mut next = init_next_multiples(primes, size, low);
    let mut phi = vec![0i64; size as usize];
    let mut mu_sum = vec![0i64; size as usize];

    while low < limit {
        let high = (low + segment_size).min(limit);

        sieve.reset(low);
        let mut b = 2u64;
        while b <= c {
            let prime = u64::from(primes[b as usize]);
            let mut k = next[b as usize];
            while k < high {
                sieve.unset((k - low) as usize);
                k += prime * 2;
            }
            next[b as usize] = k;
            b += 1;
        }

        counters.init(&sieve);

        'next_segment: {
            // c < b < π(√y): m は合成数を含む（すべて hard）
            while b < pi_sqrty.min(size) {
                let prime = u64::from(primes[b as usize]);
                let min_m = div3(x, prime, high).max(y / prime);
                let max_m = div3(x, prime, low).min(y);

                if prime >= max_m {
                    break 'next_segment;
                }

                let idx_min = factor.to_index_floor(min_m.max(1));
                let idx_max = factor.to_index_floor(max_m);
                for idx in ((idx_min + 1)..=idx_max).rev() {
                    if factor.is_leaf(idx, prime) {
                        let m = factor.to_number(idx);
                        let n = prime * m;
                        let count = counters.query(&sieve, (x / n - low) as usize) as i64;
                        let phi_xn = phi[b as usize] + count;
                        s2 -= factor.mu(idx) * phi_xn;
                        mu_sum[b as usize] -= factor.mu(idx);
                    }
                }

                phi[b as usize] += counters.query(&sieve, (high - 1 - low) as usize) as i64;
                cross_off(prime, low, high, &mut next[b as usize], &mut sieve, &mut counters);
                b += 1;
            }

            // π(√y) <= b: m = primes[l]。hard 条件 t ≥ p² ⟺ q ≤ x/p³
            while b < pi_y.min(size) {
                let prime = u64::from(primes[b as usize]);
                let x_ppp = (u128::from(x)
                    / (u128::from(prime) * u128::from(prime) * u128::from(prime)))
                    as u64;
                let l_start = pi.pi(div3(x, prime, low).min(y).min(x_ppp));
                let min_m = div3(x, prime, high).max(y / prime).clamp(prime, y);
                let min_l = pi.pi(min_m);

                if prime >= u64::from(primes[l_start as usize]) {
                    break 'next_segment;
                }

                for l in ((min_l + 1)..=l_start).rev() {
                    let q = u64::from(primes[l as usize]);
                    let n = prime * q;
                    let count = counters.query(&sieve, (x / n - low) as usize) as i64;
                    let phi_xn = phi[b as usize] + count;
                    s2 += phi_xn;
                    mu_sum[b as usize] += 1;
                }

                phi[b as usize] += counters.query(&sieve, (high - 1 - low) as usize) as i64;
                cross_off(prime, low, high, &mut next[b as usize], &mut sieve, &mut counters);
                b += 1;
            }
        }

        low = high;
    }

    HardResult { s2, phi, mu_sum }
}

/// hard leaves の寄与（並列ウェーブ + スレッド順結合）。
#[allow(clippy::too_many_arguments)]
fn s2_hard(
    x: u64,
    y: u64,
    c: u64,
    pi_y: u64,
    primes: &[u32],
    pi: &PiTable,
    factor: &FactorTable,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
) -> PrimeResult<i64> {
    let limit = x / y + 1;
    let pi_sqrty = pi_bsearch(primes, integer_sqrt(y));
    let mut balancer = LoadBalancerS2::new(limit, threads);
    let mut status = Status::new("S2_hard", status_enabled);

    let mut s2_total = 0i64;
    let mut phi_total = vec![0i64; (pi_y + 1) as usize];
    let mut low = 1u64;

    while low < limit {
        if stop_flag.load(Ordering::SeqCst) {
            return Err("S2_hard stopped before completion".into());
        }

        let segment_size = balancer.segment_size();
        let segments = (limit - low).div_ceil(segment_size);
        let wave_threads = in_between(1, threads as u64, segments) as usize;
        let segments_per_thread = in_between(
            1,
            balancer.segments_per_thread(),
            segments.div_ceil(wave_threads as u64),
        );
        let wave_start = Instant::now();

        let results: Vec<HardResult> = (0..wave_threads as u64)
            .into_par_iter()
            .map(|t| {
                s2_hard_thread(
                    x, y, c, pi_sqrty, pi_y, segment_size, segments_per_thread, t, low, limit,
                    pi, primes, factor,
                )
            })
            .collect();

        low += segments_per_thread * wave_threads as u64 * segment_size;

        for r in &results {
            s2_total += r.s2;
            for j in 1..r.phi.len() {
                s2_total += phi_total[j] * r.mu_sum[j];
                phi_total[j] += r.phi[j];
            }
        }

        balancer.update(low, wave_start.elapsed().as_secs_f64());
        status.wave_done(low.min(limit), limit);
    }

    Ok(s2_total)
}

/// Deléglise–Rivat 法の π(x)。
pub fn pi_deleglise_rivat(x: u64, threads: usize) -> PrimeResult<u64> {
    let stop = AtomicBool::new(false);
    pi_deleglise_rivat_ctl(x, threads, &stop, false, None)
}

/// 停止フラグ・ステータス表示・α 指定付きの本体。
pub fn pi_deleglise_rivat_ctl(
    x: u64,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
    alpha_override: Option<f64>,
) -> PrimeResult<u64> {
    if x < 100 {
        return Ok(simple_sieve(x)?.len() as u64);
    }
    if x < 100_000_000 {
        // FactorTable の c ≥ 4 前提が崩れる小さい x は LMO 第 3 段で十分
        return crate::lmo::pi_lmo3(x);
    }

    let y = dr_y(x, alpha_override).max(2);
    let primes = primes_array(y, stop_flag)?;
    let pi_y = primes.len() as u64 - 1;
    let c = get_c(y).min(pi_y);
    log::debug!("pi_deleglise_rivat: x = {x}, y = {y}, c = {c}, threads = {threads}");

    let mu = make_moebius(y);
    let lpf = make_least_prime_factor(y);
    let factor = FactorTable::new(y)?;
    let pi = PiTable::new(integer_sqrt(x).max(y).max(8), threads);

    let s1 = ordinary_leaves::<u64>(x, y, c, &primes, &mu, &lpf);
    let trivial = s2_trivial::<u64>(x, y, c, &primes, &pi);
    let easy = s2_easy(x, y, c, &primes, &pi, threads);
    let hard = s2_hard(
        x, y, c, pi_y, &primes, &pi, &factor, threads, stop_flag, status_enabled,
    )?;
    let p2 = p2::<u64>(x, y, threads, stop_flag, status_enabled)?;

    let phi = s1 + trivial + easy + hard;
    let sum = phi + pi_y as i64 - 1 - p2;
    Ok(sum as u64)
}
