//! Lagarias–Miller–Odlyzko 法の逐次実装 5 段階。
//!
//! π(x) = S1 + S2 + π(y) − 1 − P2(x, y) を共通の骨格とし、
//! S2（special leaves の寄与）の評価だけを段階的に最適化します:
//!
//! - pi_lmo1: φ を再帰＋π 表ショートカットでそのまま評価（篩なし）
//! - pi_lmo2: 分割ビット篩。rank はビット区間の popcount で都度数える
//! - pi_lmo3: カウンタツリーで rank を O(√S) に
//! - pi_lmo4: next[] 事前倍数ホイールで奇数倍のみを消す
//! - pi_lmo5: FactorTable で μ・lpf 判定を 16bit 1 回の表引きに
//!
//! 相互検証用の参照実装でもあるため、どの段階も同じ値を返すことが
//! テストの対象になります。

use std::sync::atomic::AtomicBool;

use crate::bit_sieve::BitSieve;
use crate::counters::Counters;
use crate::engine_types::PrimeResult;
use crate::factor_table::FactorTable;
use crate::generators::{make_least_prime_factor, make_moebius, primes_array};
use crate::p2::p2;
use crate::phi::phi_with_tables;
use crate::phi_tiny::MAX_A;
use crate::pi_table::PiTable;
use crate::params::lmo_y;
use crate::s1::ordinary_leaves;
use crate::sieve_math::{integer_sqrt, simple_sieve};

/// 素数配列（index 0 番兵）に対する π(n) の 2 分探索。
pub(crate) fn pi_bsearch(primes: &[u32], n: u64) -> u64 {
    primes[1..].partition_point(|&p| u64::from(p) <= n) as u64
}

/// x / (a·b)。a·b は u64 を超え得るため u128 で割る。
#[inline]
pub(crate) fn div3(x: u64, a: u64, b: u64) -> u64 {
    (u128::from(x) / (u128::from(a) * u128::from(b))) as u64
}

/// 各素数について low 以上で最初の「奇数の」倍数を求める。
pub(crate) fn init_next_multiples(primes: &[u32], size: u64, low: u64) -> Vec<u64> {
    let mut next = Vec::with_capacity(size as usize);
    next.push(0);
    for b in 1..size {
        let prime = u64::from(primes[b as usize]);
        let mut next_multiple = low.div_ceil(prime) * prime;
        next_multiple += prime * (!next_multiple & 1);
        next.push(next_multiple);
    }
    next
}

/// prime の奇数倍を [next_multiple, high) から消し、カウンタも更新する。
pub(crate) fn cross_off(
    prime: u64,
    low: u64,
    high: u64,
    next_multiple: &mut u64,
    sieve: &mut BitSieve,
    counters: &mut Counters,
) {
    let mut k = *next_multiple;
    while k < high {
        let i = (k - low) as usize;
        if sieve.test(i) {
            sieve.unset(i);
            counters.unset(i);
        }
        k += prime * 2;
    }
    *next_multiple = k;
}

/// LMO 系で共有する数論テーブル一式。
struct LmoTables {
    y: u64,
    c: u64,
    pi_y: u64,
    pi_sqrty: u64,
    primes: Vec<u32>,
    mu: Vec<i8>,
    lpf: Vec<u32>,
    pi: PiTable,
}

fn lmo_tables(x: u64, alpha_override: Option<f64>) -> PrimeResult<LmoTables> {
    let stop = AtomicBool::new(false);
    let y = lmo_y(x, alpha_override).max(2);
    let primes = primes_array(y, &stop)?;
    let pi_y = primes.len() as u64 - 1;
    let c = MAX_A.min(pi_y);
    let pi_sqrty = pi_bsearch(&primes, integer_sqrt(y));
    let mu = make_moebius(y);
    let lpf = make_least_prime_factor(y);
    let pi = PiTable::new(y.max(8), 1);
    Ok(LmoTables {
        y,
        c,
        pi_y,
        pi_sqrty,
        primes,
        mu,
        lpf,
        pi,
    })
}

/// S1 + S2 + π(y) − 1 − P2 の共通組み立て。
fn assemble(x: u64, t: &LmoTables, s2: i64) -> PrimeResult<u64> {
    let stop = AtomicBool::new(false);
    let s1 = ordinary_leaves::<u64>(x, t.y, t.c, &t.primes, &t.mu, &t.lpf);
    let p2 = p2::<u64>(x, t.y, 1, &stop, false)?;
    let phi = s1 + s2;
    let sum = phi + t.pi_y as i64 - 1 - p2;
    Ok(sum as u64)
}

/// 小さすぎる x は篩を立てるまでもないので直接数える。
fn pi_direct(x: u64) -> PrimeResult<u64> {
    Ok(simple_sieve(x)?.len() as u64)
}

/// LMO 第 1 段: S2 の φ(x/n, b−1) を再帰評価でそのまま求める。
///
/// 篩もカウンタも使わない素朴な形で、他段の検証基準になる。
pub fn pi_lmo1(x: u64) -> PrimeResult<u64> {
    if x < 100 {
        return pi_direct(x);
    }
    let t = lmo_tables(x, None)?;
    let stop = AtomicBool::new(false);

    // 再帰 φ 用に √x までの素数と π 表を別に持つ
    let sqrt_x = integer_sqrt(x);
    let phi_primes = primes_array(sqrt_x + 1, &stop)?;
    let phi_pi = PiTable::new(sqrt_x.max(8), 1);

    let mut s2 = 0i64;
    for b in (t.c + 1)..t.pi_y {
        let prime = u64::from(t.primes[b as usize]);
        let min_m = t.y / prime;
        let max_m = t.y;
        for m in (min_m + 1)..=max_m {
            let mu_m = t.mu[m as usize];
            if mu_m != 0 && prime < u64::from(t.lpf[m as usize]) {
                let n = prime * m;
                if n > x {
                    continue;
                }
                let phi_xn = phi_with_tables(x / n, b - 1, &phi_primes, &phi_pi) as i64;
                s2 -= i64::from(mu_m) * phi_xn;
            }
        }
    }
    assemble(x, &t, s2)
}

/// S2 を分割篩で評価する（第 2〜5 段の共通骨格）。
///
/// `variant` で rank の取り方と倍数消去・μ判定の方式を切り替える。
/// ループ構造・枝の順序（セグメント昇順 → b 昇順 → m/l 降順）は全段共通で、
/// 打ち切り（このセグメントに b 以降の葉がない）もすべて同じ。
#[derive(Clone, Copy, PartialEq)]
enum SieveVariant {
    /// rank をビット区間 popcount で都度数える
    Recount,
    /// カウンタツリー
    Counters,
    /// カウンタツリー + 奇数倍ホイール
    Wheel,
    /// カウンタツリー + 奇数倍ホイール + FactorTable
    Factor,
}

fn s2_sieve(x: u64, t: &LmoTables, variant: SieveVariant) -> PrimeResult<i64> {
    let limit = x / t.y + 1;
    let segment_size = integer_sqrt(limit).next_power_of_two().max(64);
    let factor = if variant == SieveVariant::Factor {
        Some(FactorTable::new(t.y)?)
    } else {
        None
    };

    let mut s2 = 0i64;
    let mut phi = vec![0i64; (t.pi_y + 1) as usize];
    let mut next = init_next_multiples(&t.primes, t.pi_y + 1, 1);
    let mut sieve = BitSieve::new(segment_size as usize);
    let mut counters = Counters::new(segment_size as usize);

    let mut low = 1u64;
    while low < limit {
        let high = (low + segment_size).min(limit);
        let size = t.pi.pi(integer_sqrt(x / low).min(t.y)) + 1;

        sieve.reset(low);

        // b <= c の素数はまとめて篩うだけで S2 に寄与しない
        // （b = 1 の素数 2 は reset の偶数パターンで処理済み）
        for b in 2..=t.c.min(size - 1) {
            let prime = u64::from(t.primes[b as usize]);
            match variant {
                SieveVariant::Recount | SieveVariant::Counters => {
                    let mut k = low.div_ceil(prime) * prime;
                    while k < high {
                        sieve.unset((k - low) as usize);
                        k += prime;
                    }
                }
                SieveVariant::Wheel | SieveVariant::Factor => {
                    let mut k = next[b as usize];
                    while k < high {
                        sieve.unset((k - low) as usize);
                        k += prime * 2;
                    }
                    next[b as usize] = k;
                }
            }
        }

        if variant != SieveVariant::Recount {
            counters.init(&sieve);
        }

        let rank = |sieve: &BitSieve, counters: &Counters, i: usize| -> i64 {
            match variant {
                SieveVariant::Recount => sieve.count(0, i) as i64,
                _ => counters.query(sieve, i) as i64,
            }
        };

        // 以降の b に葉がないと判明した時点でセグメントを打ち切る
        // （このセグメントで葉が尽きた b は、low が進んだ後のセグメントでも
        // 葉を持たないため、phi[b] の更新も不要になる）
        'next_segment: {
            let mut b = t.c + 1;

            // c < b < π(√y): 葉 n = primes[b]·m（m は μ・lpf 条件を満たす任意の数）
            while b < t.pi_sqrty.min(size) {
                let prime = u64::from(t.primes[b as usize]);
                let min_m = div3(x, prime, high).max(t.y / prime);
                let max_m = div3(x, prime, low).min(t.y);

                if prime >= max_m {
                    break 'next_segment;
                }

                match &factor {
                    None => {
                        for m in ((min_m + 1)..=max_m).rev() {
                            let mu_m = t.mu[m as usize];
                            if mu_m != 0 && prime < u64::from(t.lpf[m as usize]) {
                                let n = prime * m;
                                let i = (x / n - low) as usize;
                                let phi_xn = phi[b as usize] + rank(&sieve, &counters, i);
                                s2 -= i64::from(mu_m) * phi_xn;
                            }
                        }
                    }
                    Some(ft) => {
                        // FactorTable は 210 と互いに素な m だけを保持する。
                        // b > c = 7 なので lpf(m) > primes[b] ≥ 19 の葉は必ず表内にある
                        let idx_min = ft.to_index_floor(min_m.max(1));
                        let idx_max = ft.to_index_floor(max_m);
                        for idx in ((idx_min + 1)..=idx_max).rev() {
                            if ft.is_leaf(idx, prime) {
                                let m = ft.to_number(idx);
                                let n = prime * m;
                                let i = (x / n - low) as usize;
                                let phi_xn = phi[b as usize] + rank(&sieve, &counters, i);
                                s2 -= ft.mu(idx) * phi_xn;
                            }
                        }
                    }
                }

                phi[b as usize] += rank(&sieve, &counters, (high - 1 - low) as usize);
                cross_off_variant(variant, prime, low, high, b, &mut next, &mut sieve, &mut counters);
                b += 1;
            }

            // π(√y) <= b < π(y): m は素数 primes[l] に限られる
            while b < t.pi_y.min(size) {
                let prime = u64::from(t.primes[b as usize]);
                let l_start = t.pi.pi(div3(x, prime, low).min(t.y));
                let min_m = div3(x, prime, high).max(t.y / prime).clamp(prime, t.y);
                let min_l = t.pi.pi(min_m);

                if prime >= u64::from(t.primes[l_start as usize]) {
                    break 'next_segment;
                }

                for l in ((min_l + 1)..=l_start).rev() {
                    let q = u64::from(t.primes[l as usize]);
                    let n = prime * q;
                    let i = (x / n - low) as usize;
                    let phi_xn = phi[b as usize] + rank(&sieve, &counters, i);
                    s2 += phi_xn;
                }

                phi[b as usize] += rank(&sieve, &counters, (high - 1 - low) as usize);
                cross_off_variant(variant, prime, low, high, b, &mut next, &mut sieve, &mut counters);
                b += 1;
            }
        }

        low = high;
    }

    Ok(s2)
}

#[allow(clippy::too_many_arguments)]
fn cross_off_variant(
    variant: SieveVariant,
    prime: u64,
    low: u64,
    high: u64,
    b: u64,
    next: &mut [u64],
    sieve: &mut BitSieve,
    counters: &mut Counters,
) {
    match variant {
        SieveVariant::Recount => {
            let mut k = low.div_ceil(prime) * prime;
            while k < high {
                sieve.unset((k - low) as usize);
                k += prime;
            }
        }
        SieveVariant::Counters => {
            let mut k = low.div_ceil(prime) * prime;
            while k < high {
                let i = (k - low) as usize;
                if sieve.test(i) {
                    sieve.unset(i);
                    counters.unset(i);
                }
                k += prime;
            }
        }
        SieveVariant::Wheel | SieveVariant::Factor => {
            cross_off(prime, low, high, &mut next[b as usize], sieve, counters);
        }
    }
}

/// LMO 第 2 段: 分割ビット篩 + rank 都度 popcount。
pub fn pi_lmo2(x: u64) -> PrimeResult<u64> {
    if x < 100 {
        return pi_direct(x);
    }
    let t = lmo_tables(x, None)?;
    let s2 = s2_sieve(x, &t, SieveVariant::Recount)?;
    assemble(x, &t, s2)
}

/// LMO 第 3 段: カウンタツリーで rank を O(√S) に。
pub fn pi_lmo3(x: u64) -> PrimeResult<u64> {
    if x < 100 {
        return pi_direct(x);
    }
    let t = lmo_tables(x, None)?;
    let s2 = s2_sieve(x, &t, SieveVariant::Counters)?;
    assemble(x, &t, s2)
}

/// LMO 第 4 段: 奇数倍ホイール（next[] 事前倍数）。
pub fn pi_lmo4(x: u64) -> PrimeResult<u64> {
    if x < 100 {
        return pi_direct(x);
    }
    let t = lmo_tables(x, None)?;
    let s2 = s2_sieve(x, &t, SieveVariant::Wheel)?;
    assemble(x, &t, s2)
}

/// LMO 第 5 段: FactorTable（μ・lpf を 16bit 表 1 本に圧縮）。
pub fn pi_lmo5(x: u64) -> PrimeResult<u64> {
    if x < 100_000_000 {
        // FactorTable は c = 7（lpf > 19 の葉だけが表に載る）前提。
        // 小さい x は前段と同じ経路で十分
        return pi_lmo3(x);
    }
    let t = lmo_tables(x, None)?;
    let s2 = s2_sieve(x, &t, SieveVariant::Factor)?;
    assemble(x, &t, s2)
}
