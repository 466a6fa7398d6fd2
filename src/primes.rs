//! 素数ジェネレータ（エンジン各部の「外部コラボレータ」に相当）。
//!
//! - mod 30 ホイール上の分割エラトステネスの篩で、昇順の素数列を生成します。
//! - π(x) エンジン本体はここで得た素数列・素数カウントだけを利用し、
//!   篩のビット配列そのものには依存しません。

use std::sync::atomic::{AtomicBool, Ordering};

use bitvec::prelude::*;
use rayon::prelude::*;

use crate::engine_types::PrimeResult;
use crate::sieve_math::{integer_sqrt, simple_sieve};

/// mod 30 ホイールの候補パターン (30で割った余り)
pub const MOD30_PATTERN: [u64; 8] = [1, 7, 11, 13, 17, 19, 23, 29];

/// mod 30 での余りからインデックスへのマッピング
/// 候補でない数は 255 を返す
pub const MOD30_TO_INDEX: [u8; 30] = [
    255, 0, 255, 255, 255, 255, 255, 1,   // 0-7
    255, 255, 255, 2, 255, 3, 255, 255,   // 8-15
    255, 4, 255, 5, 255, 255, 255, 6,     // 16-23
    255, 255, 255, 255, 255, 7            // 24-29
];

/// 数値 n からビット配列インデックスへの変換。
/// low: セグメントの開始位置（調整済みの候補値）
/// 戻り値: Some(index) または None（mod 30 の候補でない場合）
fn n_to_index(n: u64, low: u64) -> Option<usize> {
    if n < low {
        return None;
    }
    let n_idx = MOD30_TO_INDEX[(n % 30) as usize];
    let low_idx = MOD30_TO_INDEX[(low % 30) as usize];
    if n_idx == 255 || low_idx == 255 {
        return None;
    }
    let low_in_period = (low / 30) * 8 + low_idx as u64;
    let n_in_period = (n / 30) * 8 + n_idx as u64;
    Some((n_in_period - low_in_period) as usize)
}

/// インデックスから数値 n への変換。low は調整済みの候補値であること。
fn index_to_n(idx: usize, low: u64) -> u64 {
    let low_idx = MOD30_TO_INDEX[(low % 30) as usize];
    debug_assert!(low_idx != 255, "low must be a candidate");
    let low_in_period = (low / 30) * 8 + low_idx as u64;
    let target_in_period = low_in_period + idx as u64;
    let period = target_in_period / 8;
    let offset = (target_in_period % 8) as usize;
    period * 30 + MOD30_PATTERN[offset]
}

/// low を次の mod 30 候補値に調整する。
fn adjust_low(low: u64) -> u64 {
    let rem = low % 30;
    if MOD30_TO_INDEX[rem as usize] != 255 {
        return low;
    }
    for offset in 1..30 {
        let new_rem = ((rem + offset) % 30) as usize;
        if MOD30_TO_INDEX[new_rem] != 255 {
            return low + offset;
        }
    }
    low
}

/// 1 セグメント `[low_inclusive, high_inclusive]` を篩い、素数を昇順で返す。
///
/// 契約: `low_inclusive >= 7`（2, 3, 5 は呼び出し側が別扱いする）。
/// `base` は √high 以上までの素数列（`simple_sieve` の出力）。
pub fn sieve_segment(low_inclusive: u64, high_inclusive: u64, base: &[u64]) -> Vec<u64> {
    if low_inclusive > high_inclusive {
        return Vec::new();
    }
    debug_assert!(low_inclusive >= 7);

    let low = adjust_low(low_inclusive);
    if low > high_inclusive {
        return Vec::new();
    }
    let high = high_inclusive;

    let range = high - low + 1;
    let len = ((range / 30) * 8 + 8) as usize;
    let mut is_prime = bitvec![1; len];

    for &p in base {
        if p < 7 {
            // ホイールで既に除外されている
            continue;
        }
        if p * p > high {
            break;
        }

        let mut start = if low % p == 0 { low } else { low + (p - (low % p)) };
        if start < p * p {
            start = p * p;
        }

        let mut n = start;
        while n <= high {
            if let Some(idx) = n_to_index(n, low) {
                if idx < len {
                    is_prime.set(idx, false);
                }
            }
            n += p;
            while n <= high && MOD30_TO_INDEX[(n % 30) as usize] == 255 {
                n += p;
            }
        }
    }

    let mut primes = Vec::new();
    for (i, bit) in is_prime.iter().by_vals().enumerate() {
        if bit {
            let n = index_to_n(i, low);
            if n <= high {
                primes.push(n);
            }
        }
    }
    primes
}

/// `[2, limit]` の素数を昇順で列挙する。
///
/// - 小さい limit は `simple_sieve` で直接処理します。
/// - 大きい limit はセグメントをスレッド数単位のグループで並列に篩い、
///   `low` でソートして順序を保証してから結合します（決定性の担保）。
/// - `stop_flag` はグループ境界でのみ確認します。停止要求時はエラーを返します。
pub fn generate_primes(limit: u64, stop_flag: &AtomicBool) -> PrimeResult<Vec<u64>> {
    const DIRECT_LIMIT: u64 = 1 << 20;
    if limit < DIRECT_LIMIT {
        return simple_sieve(limit);
    }

    let root = integer_sqrt(limit) + 1;
    let base = simple_sieve(root)?;

    let mut primes: Vec<u64> = vec![2, 3, 5];
    let segment_size: u64 = 1 << 22;
    let group_size = rayon::current_num_threads().max(1);

    let mut seg_start = 7u64;
    while seg_start <= limit {
        if stop_flag.load(Ordering::SeqCst) {
            return Err("prime generation stopped before completion".into());
        }

        let mut group_bounds: Vec<(u64, u64)> = Vec::with_capacity(group_size);
        for _ in 0..group_size {
            if seg_start > limit {
                break;
            }
            let seg_end = seg_start.saturating_add(segment_size - 1).min(limit);
            group_bounds.push((seg_start, seg_end));
            seg_start = seg_end.saturating_add(1);
        }
        if group_bounds.is_empty() {
            break;
        }

        let mut results: Vec<(u64, Vec<u64>)> = group_bounds
            .par_iter()
            .map(|&(low, high)| (low, sieve_segment(low, high, &base)))
            .collect();

        // セグメント開始値でソートして順序を保証
        results.sort_by_key(|r| r.0);
        for (_, mut seg) in results {
            primes.append(&mut seg);
        }
    }

    Ok(primes)
}
