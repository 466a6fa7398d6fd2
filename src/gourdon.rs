//! Gourdon 変種（既定のアルゴリズム）。
//!
//! π(x) = π(y) − 1 − P2(x, y) + Φ₀ + Σ + A + B + C + D
//!
//! special leaf n = primes[b]·m（t = x/n）を次の 7 つの符号付き加算項に分割します:
//!
//! - Φ₀: 通常葉（m ≤ y, PhiTiny 閉形式）
//! - Σ : trivial 葉（φ = 1）の π 表閉形式
//! - A : clustered easy 葉（p ≤ t < p², q ≤ √(x/p)）。π 表引きの歩行
//! - C : sparse easy 葉（同じく easy で q > √(x/p)）
//! - B : hard 葉のうち m が素数のもの。篩 + カウンタツリー
//! - D : hard 葉のうち m が合成数のもの。μ[m]・lpf[m] 判定付きの篩
//! - P2: 素数ペア項
//!
//! B と D は 1 本の分割篩パス（[1, z), z = x/y）を共有し、A と C は
//! LoadBalancerAC のウェーブで b 区間を配ります。すべての項はスカラ型
//! （u64 / u128）でパラメータ化され、128bit でも同じコードが走ります。

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::bit_sieve::BitSieve;
use crate::counters::Counters;
use crate::deleglise_rivat::s2_trivial;
use crate::engine_types::PrimeResult;
use crate::generators::{make_least_prime_factor, make_moebius, primes_array};
use crate::lmo::{cross_off, init_next_multiples, pi_bsearch};
use crate::load_balancer::{LoadBalancerAC, LoadBalancerS2};
use crate::p2::p2;
use crate::params::{gourdon_y_u128, gourdon_z};
use crate::phi_tiny::get_c;
use crate::pi_table::PiTable;
use crate::s1::ordinary_leaves;
use crate::scalar::{integer_cbrt_u128, integer_sqrt_u128, Accum, CountInt};
use crate::sieve_math::{in_between, integer_sqrt, simple_sieve};
use crate::status::Status;

/// A 項と C 項（easy 葉の π 表引き）。
///
/// 各 b について q = primes[l] を降順に歩き、φ(t, b−1) = π(t) − b + 2 を
/// q ≤ √(x/p)（clustered → A）か否（sparse → C）かで振り分ける。
/// b の区間は LoadBalancerAC がウェーブ単位で配る。
fn a_c_terms<T: CountInt>(
    x: T,
    y: u64,
    c: u64,
    primes: &[u32],
    pi: &PiTable,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
) -> PrimeResult<(T::Acc, T::Acc)> {
    let x13 = integer_cbrt_u128(x.to_u128()) as u64;
    let b_max = pi_bsearch(primes, x13.min(y));
    let b_min = c;
    if b_max <= b_min {
        return Ok((T::Acc::default(), T::Acc::default()));
    }

    let mut balancer = LoadBalancerAC::new(b_max - b_min, threads);
    let mut status = Status::new("AC", status_enabled);
    let mut a_total = T::Acc::default();
    let mut c_total = T::Acc::default();
    let mut b_next = b_min + 1;

    while b_next <= b_max {
        if stop_flag.load(Ordering::SeqCst) {
            return Err("AC stopped before completion".into());
        }
        let chunk = balancer.chunk();
        let wave_start = Instant::now();

        // 1 ウェーブ = threads 個の連続チャンク
        let mut ranges: Vec<(u64, u64)> = Vec::new();
        for _ in 0..threads.max(1) {
            if b_next > b_max {
                break;
            }
            let end = (b_next + chunk - 1).min(b_max);
            ranges.push((b_next, end));
            b_next = end + 1;
        }

        let partials: Vec<(T::Acc, T::Acc)> = ranges
            .par_iter()
            .map(|&(b_lo, b_hi)| {
                let mut a_sum = T::Acc::default();
                let mut c_sum = T::Acc::default();
                for b in b_lo..=b_hi {
                    let prime = u64::from(primes[b as usize]);
                    let x_pp = x.div2_to_u64(prime, prime);
                    let x_ppp = x.div_u64(prime).div2_to_u64(prime, prime);
                    let q_max = x_pp.min(y);
                    let q_min = x_ppp.max(prime).max(y / prime);
                    if q_min >= q_max {
                        continue;
                    }
                    // q ≤ √(x/p) ⟺ t ≥ q（clustered）
                    let q_split = integer_sqrt_u128(x.to_u128() / u128::from(prime)) as u64;
                    let l_max = pi.pi(q_max);
                    let l_min = pi.pi(q_min);
                    for l in (l_min + 1)..=l_max {
                        let q = u64::from(primes[l as usize]);
                        let t = x.div2_to_u64(prime, q);
                        let term =
                            T::Acc::from_i64(pi.pi(t) as i64 - b as i64 + 2);
                        if q <= q_split {
                            a_sum += term;
                        } else {
                            c_sum += term;
                        }
                    }
                }
                (a_sum, c_sum)
            })
            .collect();

        for (a, c_part) in partials {
            a_total += a;
            c_total += c_part;
        }

        balancer.update(wave_start.elapsed().as_secs_f64());
        status.wave_done(b_next - b_min - 1, b_max - b_min);
    }

    Ok((a_total, c_total))
}

struct BdResult<A> {
    b_term: A,
    d_term: A,
    phi: Vec<i64>,
    mu_sum: Vec<i64>,
}

/// B・D 項 1 スレッド分。
///
/// 枝の構造は LMO の S2_thread と同じだが、
/// - 合成数 m の枝（D）は全葉が hard
/// - 素数 q の枝（B）は hard 条件 t ≥ p² ⟺ q ≤ x/p³ で打ち切る
/// 点が異なる。easy 側は A・C が π 表で処理済み。
#[allow(clippy::too_many_arguments)]
fn b_d_thread<T: CountInt>(
    x: T,
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
    mu: &[i8],
    lpf: &[u32],
) -> BdResult<T::Acc> {
    let empty = || BdResult {
        b_term: T::Acc::default(),
        d_term: T::Acc::default(),
        phi: Vec::new(),
        mu_sum: Vec::new(),
    };

    let mut low = low + segment_size * segments_per_thread * thread_num;
    let limit = (low + segment_size * segments_per_thread).min(limit);
    if low >= limit {
        return empty();
    }
    let size = pi
        .pi((integer_sqrt_u128(x.to_u128() / u128::from(low)) as u64).min(y))
        + 1;
    if c >= size - 1 {
        return empty();
    }

    let mut b_term = T::Acc::default();
    let mut d_term = T::Acc::default();
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
            // D: c < b < π(√y)、m は μ[m] ≠ 0 かつ primes[b] < lpf[m]
            while b < pi_sqrty.min(size) {
                let prime = u64::from(primes[b as usize]);
                let min_m = x.div2_to_u64(prime, high).max(y / prime);
                // x/(p·low) は low = 1 付近で u64 を超え得るため、y で切ってから落とす
                let max_m = (x.to_u128() / (u128::from(prime) * u128::from(low)))
                    .min(u128::from(y)) as u64;

                if prime >= max_m {
                    break 'next_segment;
                }

                for m in ((min_m + 1)..=max_m).rev() {
                    let mu_m = mu[m as usize];
                    if mu_m != 0 && prime < u64::from(lpf[m as usize]) {
                        let t = x.div2_to_u64(prime, m);
                        let count = counters.query(&sieve, (t - low) as usize) as i64;
                        let phi_xn = phi[b as usize] + count;
                        d_term -= T::Acc::from_i64(i64::from(mu_m) * phi_xn);
                        mu_sum[b as usize] -= i64::from(mu_m);
                    }
                }

                phi[b as usize] += counters.query(&sieve, (high - 1 - low) as usize) as i64;
                cross_off(prime, low, high, &mut next[b as usize], &mut sieve, &mut counters);
                b += 1;
            }

            // B: π(√y) <= b、m = primes[l]、hard 条件 q ≤ x/p³
            while b < pi_y.min(size) {
                let prime = u64::from(primes[b as usize]);
                let x_ppp = x.div_u64(prime).div2_to_u64(prime, prime);
                let q_cap = (x.to_u128() / (u128::from(prime) * u128::from(low)))
                    .min(u128::from(y)) as u64;
                let l_start = pi.pi(q_cap.min(x_ppp));
                let min_m = x
                    .div2_to_u64(prime, high)
                    .max(y / prime)
                    .clamp(prime, y);
                let min_l = pi.pi(min_m);

                if prime >= u64::from(primes[l_start as usize]) {
                    break 'next_segment;
                }

                for l in ((min_l + 1)..=l_start).rev() {
                    let q = u64::from(primes[l as usize]);
                    let t = x.div2_to_u64(prime, q);
                    let count = counters.query(&sieve, (t - low) as usize) as i64;
                    let phi_xn = phi[b as usize] + count;
                    b_term += T::Acc::from_i64(phi_xn);
                    mu_sum[b as usize] += 1;
                }

                phi[b as usize] += counters.query(&sieve, (high - 1 - low) as usize) as i64;
                cross_off(prime, low, high, &mut next[b as usize], &mut sieve, &mut counters);
                b += 1;
            }
        }

        low = high;
    }

    BdResult {
        b_term,
        d_term,
        phi,
        mu_sum,
    }
}

/// B・D 項（hard 葉、並列ウェーブ + スレッド順結合）。
///
/// 復元ループでは b が枝 1（合成数 m）由来なら D へ、枝 2（素数 q）由来なら
/// B へ加算する。b と枝は一対一なので振り分けは pi_sqrty との比較だけでよい。
#[allow(clippy::too_many_arguments)]
fn b_d_terms<T: CountInt>(
    x: T,
    y: u64,
    z: u64,
    c: u64,
    pi_y: u64,
    primes: &[u32],
    mu: &[i8],
    lpf: &[u32],
    pi: &PiTable,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
) -> PrimeResult<(T::Acc, T::Acc)> {
    let limit = z + 1;
    let pi_sqrty = pi_bsearch(primes, integer_sqrt(y));
    let mut balancer = LoadBalancerS2::new(limit, threads);
    let mut status = Status::new("BD", status_enabled);

    let mut b_total = T::Acc::default();
    let mut d_total = T::Acc::default();
    let mut phi_total = vec![0i64; (pi_y + 1) as usize];
    let mut low = 1u64;

    while low < limit {
        if stop_flag.load(Ordering::SeqCst) {
            return Err("BD stopped before completion".into());
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

        let results: Vec<BdResult<T::Acc>> = (0..wave_threads as u64)
            .into_par_iter()
            .map(|t| {
                b_d_thread::<T>(
                    x, y, c, pi_sqrty, pi_y, segment_size, segments_per_thread, t, low, limit,
                    pi, primes, mu, lpf,
                )
            })
            .collect();

        low += segments_per_thread * wave_threads as u64 * segment_size;

        for r in &results {
            b_total += r.b_term;
            d_total += r.d_term;
            for j in 1..r.phi.len() {
                let replay = T::Acc::from_i64(phi_total[j]).mul_i64(r.mu_sum[j]);
                if (j as u64) < pi_sqrty {
                    d_total += replay;
                } else {
                    b_total += replay;
                }
                phi_total[j] += r.phi[j];
            }
        }

        balancer.update(low, wave_start.elapsed().as_secs_f64());
        status.wave_done(low.min(limit), limit);
    }

    Ok((b_total, d_total))
}

/// Gourdon 変種の π(x)（スカラ型パラメータ化の本体）。
pub fn pi_gourdon_t<T: CountInt>(
    x: T,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
    alpha_override: Option<f64>,
) -> PrimeResult<T> {
    let x128 = x.to_u128();
    if x128 > T::MAX_X {
        return Err(format!("x = {x128} exceeds the supported range (max {})", T::MAX_X).into());
    }
    if x128 < 100_000_000 {
        // 小さい x は LMO 第 3 段に委譲（パラメータ前提が簡潔になる）
        let small = crate::lmo::pi_lmo3(x128 as u64)?;
        return Ok(T::from_u64(small));
    }

    let y = gourdon_y_u128(x128, alpha_override).max(2);
    let z = gourdon_z(x128, y);
    let primes = primes_array(y, stop_flag)?;
    let pi_y = primes.len() as u64 - 1;
    let c = get_c(y).min(pi_y);
    log::debug!("pi_gourdon: x = {x128}, y = {y}, z = {z}, c = {c}, threads = {threads}");

    let mu = make_moebius(y);
    let lpf = make_least_prime_factor(y);
    let sqrt_x = integer_sqrt_u128(x128) as u64;
    let pi = PiTable::new(sqrt_x.max(z).max(y).max(8), threads);

    let phi0 = ordinary_leaves::<T>(x, y, c, &primes, &mu, &lpf);
    let sigma = s2_trivial::<T>(x, y, c, &primes, &pi);
    let (a, c_term) = a_c_terms::<T>(x, y, c, &primes, &pi, threads, stop_flag, status_enabled)?;
    let (b, d) = b_d_terms::<T>(
        x, y, z, c, pi_y, &primes, &mu, &lpf, &pi, threads, stop_flag, status_enabled,
    )?;
    let p2 = p2::<T>(x, y, threads, stop_flag, status_enabled)?;

    let mut sum = phi0;
    sum += sigma;
    sum += a;
    sum += b;
    sum += c_term;
    sum += d;
    sum += T::Acc::from_u64(pi_y);
    sum -= T::Acc::from_i64(1);
    sum -= p2;

    let total = sum.to_i128();
    debug_assert!(total >= 0);
    Ok(T::from_u128(total.max(0) as u128))
}

/// Gourdon 変種の π(x)（64bit 入力）。
pub fn pi_gourdon(x: u64, threads: usize) -> PrimeResult<u64> {
    let stop = AtomicBool::new(false);
    pi_gourdon_ctl(x, threads, &stop, false, None)
}

/// 停止フラグ・ステータス表示・α 指定付きの本体（64bit）。
pub fn pi_gourdon_ctl(
    x: u64,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
    alpha_override: Option<f64>,
) -> PrimeResult<u64> {
    if x < 100 {
        return Ok(simple_sieve(x)?.len() as u64);
    }
    pi_gourdon_t::<u64>(x, threads, stop_flag, status_enabled, alpha_override)
}

/// Gourdon 変種の π(x)（128bit 入力）。
pub fn pi_gourdon_u128(
    x: u128,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
    alpha_override: Option<f64>,
) -> PrimeResult<u128> {
    if x < 100 {
        return Ok(simple_sieve(x as u64)?.len() as u128);
    }
    pi_gourdon_t::<u128>(x, threads, stop_flag, status_enabled, alpha_override)
}
