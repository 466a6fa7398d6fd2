//! 部分篩関数 φ(x, a) の汎用評価。
//!
//! φ(x, a) = [1, x] のうち最初の a 個の素数のどれでも割り切れない整数の個数。
//! 再帰 φ(x, a) = φ(x, a−1) − φ(x/p_a, a−1) を次の打ち切りで畳みます:
//!
//! - a ≤ 7                     → PhiTiny の閉形式
//! - x < primes[a+1]           → 1（生き残りは 1 のみ）
//! - π(√x) ≤ a（π 表の範囲内）  → 1 + max(0, π(x) − a)
//!
//! Legendre / Meissel / Lehmer の各古典アルゴリズムと公開 API の phi() が
//! このモジュールを共有します。

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;

use rayon::prelude::*;

use crate::engine_types::PrimeResult;
use crate::generators::primes_array;
use crate::phi_tiny::{is_tiny, phi_tiny, MAX_A};
use crate::pi_table::PiTable;
use crate::sieve_math::integer_sqrt;

/// 再帰評価の共有コンテキスト。primes と π 表は読み取り専用、キャッシュはワーカー専有。
struct PhiCache<'a> {
    primes: &'a [u32],
    pi: &'a PiTable,
    cache: HashMap<(u64, u64), u64>,
}

/// キャッシュに載せる x の上限。大きい x は再訪しないのでキャッシュ効果がない。
const CACHE_X_LIMIT: u64 = 1 << 20;

impl<'a> PhiCache<'a> {
    fn new(primes: &'a [u32], pi: &'a PiTable) -> Self {
        PhiCache {
            primes,
            pi,
            cache: HashMap::new(),
        }
    }

    fn phi(&mut self, x: u64, a: u64) -> u64 {
        if x == 0 {
            return 0;
        }
        if is_tiny(a) {
            return phi_tiny(x, a);
        }
        if u64::from(self.primes[a as usize]) >= x {
            return 1;
        }
        let sqrt_x = integer_sqrt(x);
        if x <= self.pi.max_x() && self.pi.pi(sqrt_x) <= a {
            let pi_x = self.pi.pi(x);
            return 1 + pi_x.saturating_sub(a);
        }
        if x < CACHE_X_LIMIT {
            if let Some(&v) = self.cache.get(&(x, a)) {
                return v;
            }
        }

        let mut sum = phi_tiny(x, MAX_A) as i64;
        for b in (MAX_A + 1)..=a {
            let prime = u64::from(self.primes[b as usize]);
            let xp = x / prime;
            if xp < prime {
                // 残りの項は全て φ(x/p, b−1) = 1
                sum -= (a - b + 1) as i64;
                break;
            }
            sum -= self.phi(xp, b - 1) as i64;
        }

        let result = sum as u64;
        if x < CACHE_X_LIMIT {
            self.cache.insert((x, a), result);
        }
        result
    }
}

/// φ(x, a) を再帰＋π 表ショートカットで評価する（内部用）。
///
/// 契約: `primes` は index a までを含み、`pi` は √x をカバーしていること。
pub fn phi_with_tables(x: u64, a: u64, primes: &[u32], pi: &PiTable) -> u64 {
    if x == 0 {
        return 0;
    }
    if a == 0 {
        return x;
    }
    if is_tiny(a) {
        return phi_tiny(x, a);
    }

    let mut cache = PhiCache::new(primes, pi);
    cache.phi(x, a)
}

/// φ(x, a) の並列版。最初の再帰段 φ(x/p_b, b−1) をワーカーに分配する。
///
/// 各ワーカーは自分専用のキャッシュを持ち、部分和は整数加算なので
/// スレッド数に依らず同じ値になります。
pub fn phi_parallel(x: u64, a: u64, primes: &[u32], pi: &PiTable, threads: usize) -> u64 {
    if x == 0 {
        return 0;
    }
    if a == 0 {
        return x;
    }
    if is_tiny(a) {
        return phi_tiny(x, a);
    }
    if u64::from(primes[a as usize]) >= x {
        return 1;
    }
    if threads <= 1 || a < 64 {
        return phi_with_tables(x, a, primes, pi);
    }

    let mut sum = phi_tiny(x, MAX_A) as i64;
    // 早期畳み込み境界: x/p_b < p_b となる最初の b 以降は各項 1
    let mut b_end = a;
    for b in (MAX_A + 1)..=a {
        let prime = u64::from(primes[b as usize]);
        if x / prime < prime {
            b_end = b - 1;
            sum -= (a - b + 1) as i64;
            break;
        }
    }

    let partial: i64 = ((MAX_A + 1)..=b_end)
        .into_par_iter()
        .map(|b| {
            let mut cache = PhiCache::new(primes, pi);
            let prime = u64::from(primes[b as usize]);
            cache.phi(x / prime, b - 1) as i64
        })
        .sum();

    (sum - partial) as u64
}

/// 公開 API の φ(x, a, threads)。
///
/// - a ≥ π(√x) の場合は恒等式 φ(x, a) = 1 + max(0, π(x) − a) に落とします
///   （π(x) はエンジン本体で計算）。
/// - それ以外はテーブルを構築して再帰評価します。
pub fn phi(x: u64, a: u64, threads: usize) -> PrimeResult<u64> {
    if a == 0 {
        return Ok(x);
    }
    if x == 0 {
        return Ok(0);
    }
    if is_tiny(a) {
        return Ok(phi_tiny(x, a));
    }

    let stop = AtomicBool::new(false);
    let sqrt_x = integer_sqrt(x);
    let pi = PiTable::new(sqrt_x.max(8), threads);
    let pi_sqrt_x = pi.pi(sqrt_x);

    if a >= pi_sqrt_x {
        let pi_x = crate::prime_pi_engine::pi_with_threads(x, threads)?;
        return Ok(1 + pi_x.saturating_sub(a));
    }

    let primes = primes_array(sqrt_x + 1, &stop)?;
    Ok(phi_parallel(x, a, &primes, &pi, threads))
}
