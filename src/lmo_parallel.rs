//! LMO 法の並列実装。
//!
//! S2 をウェーブ（全スレッドへの parallel-for 1 回）単位で進めます。
//! special leaf は篩領域の先頭に集中するため、小さいセグメントサイズ・
//! 少ない segments_per_thread から始め、ウェーブごとに LoadBalancerS2 が
//! 粒度を引き上げます。
//!
//! 各スレッドは自分の区間しか篩わないため、φ(x/n, b−1) の「自分の区間より
//! 前の寄与」が欠けています。ウェーブ終了後、スレッド番号順に
//!
//!   S2 += phi_total[b] · mu_sum[i][b];  phi_total[b] += phi[i][b]
//!
//! と走査して欠損分を復元します。この結合順は固定なので、スレッド数や
//! スケジューリングに依らず同じ S2 が得られます。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::bit_sieve::BitSieve;
use crate::counters::Counters;
use crate::engine_types::PrimeResult;
use crate::generators::{make_least_prime_factor, make_moebius, primes_array};
use crate::lmo::{cross_off, div3, init_next_multiples, pi_bsearch};
use crate::load_balancer::LoadBalancerS2;
use crate::p2::p2;
use crate::params::lmo_y;
use crate::phi_tiny::MAX_A;
use crate::pi_table::PiTable;
use crate::s1::ordinary_leaves;
use crate::sieve_math::{in_between, integer_sqrt, simple_sieve};
use crate::status::Status;

struct ThreadResult {
    s2: i64,
    phi: Vec<i64>,
    mu_sum: Vec<i64>,
}

/// 1 スレッド分: [low + S·spt·t, low + S·spt·(t+1)) のセグメント列を処理する。
///
/// [1, 担当区間) の寄与は呼び出し元の結合ループが後から復元する。
#[allow(clippy::too_many_arguments)]
fn s2_thread(
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
    lpf: &[u32],
    mu: &[i8],
) -> ThreadResult {
    let mut low = low + segment_size * segments_per_thread * thread_num;
    let limit = (low + segment_size * segments_per_thread).min(limit);
    if low >= limit {
        return ThreadResult {
            s2: 0,
            phi: Vec::new(),
            mu_sum: Vec::new(),
        };
    }
    let size = pi.pi(integer_sqrt(x / low).min(y)) + 1;
    let mut s2 = 0i64;

    if c >= size - 1 {
        return ThreadResult {
            s2: 0,
            phi: Vec::new(),
            mu_sum: Vec::new(),
        };
    }

    let mut sieve = BitSieve::new(segment_size as usize);
    let mut counters = Counters::new(segment_size as usize);
    let mut next = init_next_multiples(primes, size, low);
    let mut phi = vec![0i64; size as usize];
    let mut mu_sum = vec![0i64; size as usize];

    while low < limit {
        let high = (low + segment_size).min(limit);

        sieve.reset(low);

        // b <= c の φ(y, b) ノードは S2 に寄与しないので、まとめて篩うだけ
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
            // c < b < π(√y): 葉 n = primes[b]·m, μ[m] ≠ 0, primes[b] < lpf[m],
            // low <= x/n < high
            while b < pi_sqrty.min(size) {
                let prime = u64::from(primes[b as usize]);
                let min_m = div3(x, prime, high).max(y / prime);
                let max_m = div3(x, prime, low).min(y);

                if prime >= max_m {
                    break 'next_segment;
                }

                for m in ((min_m + 1)..=max_m).rev() {
                    let mu_m = mu[m as usize];
                    if mu_m != 0 && prime < u64::from(lpf[m as usize]) {
                        let n = prime * m;
                        let count = counters.query(&sieve, (x / n - low) as usize) as i64;
                        let phi_xn = phi[b as usize] + count;
                        s2 -= i64::from(mu_m) * phi_xn;
                        mu_sum[b as usize] -= i64::from(mu_m);
                    }
                }

                phi[b as usize] += counters.query(&sieve, (high - 1 - low) as usize) as i64;
                cross_off(prime, low, high, &mut next[b as usize], &mut sieve, &mut counters);
                b += 1;
            }

            // π(√y) <= b < π(y): 葉 n = primes[b]·primes[l], low <= x/n < high
            while b < pi_y.min(size) {
                let prime = u64::from(primes[b as usize]);
                let l_start = pi.pi(div3(x, prime, low).min(y));
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

    ThreadResult { s2, phi, mu_sum }
}

/// special leaves の寄与 S2（並列・決定的）。
#[allow(clippy::too_many_arguments)]
fn s2(
    x: u64,
    y: u64,
    pi_y: u64,
    c: u64,
    primes: &[u32],
    lpf: &[u32],
    mu: &[i8],
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
) -> PrimeResult<i64> {
    let limit = x / y + 1;
    let pi_sqrty = pi_bsearch(primes, integer_sqrt(y));
    let pi = PiTable::new(y.max(8), threads);
    let mut balancer = LoadBalancerS2::new(limit, threads);
    let mut status = Status::new("S2", status_enabled);

    let mut s2_total = 0i64;
    let mut phi_total = vec![0i64; primes.len()];
    let mut low = 1u64;

    while low < limit {
        if stop_flag.load(Ordering::SeqCst) {
            return Err("S2 stopped before completion".into());
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

        let results: Vec<ThreadResult> = (0..wave_threads as u64)
            .into_par_iter()
            .map(|t| {
                s2_thread(
                    x, y, c, pi_sqrty, pi_y, segment_size, segments_per_thread, t, low, limit,
                    &pi, primes, lpf, mu,
                )
            })
            .collect();

        low += segments_per_thread * wave_threads as u64 * segment_size;

        // 全スレッド終了後、欠けている [1, 担当区間) 分の寄与を
        // スレッド番号順に復元する（phi_total は前スレッドまでの累計）
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

/// LMO 並列版 π(x)。
pub fn pi_lmo_parallel(x: u64, threads: usize) -> PrimeResult<u64> {
    let stop = AtomicBool::new(false);
    pi_lmo_parallel_ctl(x, threads, &stop, false, None)
}

/// 停止フラグ・ステータス表示・α 指定付きの本体。
pub fn pi_lmo_parallel_ctl(
    x: u64,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
    alpha_override: Option<f64>,
) -> PrimeResult<u64> {
    if x < 100 {
        return Ok(simple_sieve(x)?.len() as u64);
    }

    let y = lmo_y(x, alpha_override).max(2);
    let mu = make_moebius(y);
    let lpf = make_least_prime_factor(y);
    let primes = primes_array(y, stop_flag)?;

    let pi_y = primes.len() as u64 - 1;
    let c = MAX_A.min(pi_y);
    log::debug!("pi_lmo_parallel: x = {x}, y = {y}, c = {c}, threads = {threads}");

    let s1 = ordinary_leaves::<u64>(x, y, c, &primes, &mu, &lpf);
    let s2 = s2(
        x, y, pi_y, c, &primes, &lpf, &mu, threads, stop_flag, status_enabled,
    )?;
    let p2 = p2::<u64>(x, y, threads, stop_flag, status_enabled)?;

    let phi = s1 + s2;
    let sum = phi + pi_y as i64 - 1 - p2;
    Ok(sum as u64)
}
