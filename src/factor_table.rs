//! 2·3·5·7 = 210 と互いに素な n だけを詰めた最小素因数・メビウス符号テーブル。
//!
//! 210 ごとに 48 個の候補剰余しか存在しないため、稠密インデックスで
//! 162/210 をスキップできます。1 エントリは 16bit:
//!
//! - 0        → μ(n) = 0（平方因子あり）
//! - 0xFFFF   → n は素数（μ = −1, lpf = n 自身）
//! - その他    → bit15 = μ の符号（1 なら μ = +1）、bit0..14 = lpf(n)
//!
//! 合成数で平方因子のない n ≤ y は lpf(n) ≤ √y なので、y < 2^30 の範囲で
//! lpf は 15bit に必ず収まります（コンストラクタで検査します）。
//! μ と lpf を別配列で持つ場合に比べメモリが半分になり、ホットループの
//! キャッシュ密度が倍になります。

use crate::engine_types::PrimeResult;
use crate::sieve_math::{integer_sqrt, simple_sieve};

const WHEEL_210: u64 = 210;
const COPRIMES_PER_PERIOD: usize = 48;

const PRIME_SENTINEL: u16 = 0xFFFF;
const MU_POSITIVE: u16 = 0x8000;
const LPF_MASK: u16 = 0x7FFF;

pub struct FactorTable {
    entries: Vec<u16>,
    /// 周期内の候補剰余（昇順、48 個）
    coprimes: [u16; COPRIMES_PER_PERIOD],
    /// 剰余 r → 「r 以下の候補剰余の個数 − 1」（floor インデックス。r=0 は −1）
    floor_index: [i8; WHEEL_210 as usize],
}

impl FactorTable {
    /// `[1, y]` の 210 と互いに素な n を対象とするテーブルを構築する。
    pub fn new(y: u64) -> PrimeResult<FactorTable> {
        if y >= 1 << 30 {
            return Err(format!("FactorTable limit {y} exceeds the 16-bit lpf range").into());
        }

        let mut coprimes = [0u16; COPRIMES_PER_PERIOD];
        let mut floor_index = [-1i8; WHEEL_210 as usize];
        let mut k = 0usize;
        for r in 0..WHEEL_210 {
            if r % 2 != 0 && r % 3 != 0 && r % 5 != 0 && r % 7 != 0 {
                coprimes[k] = r as u16;
                k += 1;
            }
            floor_index[r as usize] = k as i8 - 1;
        }
        debug_assert_eq!(k, COPRIMES_PER_PERIOD);

        let mut table = FactorTable {
            entries: Vec::new(),
            coprimes,
            floor_index,
        };
        let size = if y == 0 { 0 } else { table.to_index_floor(y) + 1 };
        table.entries = vec![PRIME_SENTINEL; size];
        if size > 0 {
            table.fill(y);
        }
        // n = 1: 素因数なし、μ = +1、lpf は「どの素数より大きい」扱い。
        // lpf の読み出しは index 0 を特別扱いするので下位ビットは使われない
        if !table.entries.is_empty() {
            table.entries[0] = MU_POSITIVE | 1;
        }
        Ok(table)
    }

    /// チャンク単位の篩でエントリを埋める。
    ///
    /// 各 n について √y 以下の素因数を拾い、残り（rem > 1）があれば
    /// それは √y より大きい素数がちょうど 1 つ残った状態。
    fn fill(&mut self, y: u64) {
        let sqrt_y = integer_sqrt(y);
        let base = simple_sieve(sqrt_y).unwrap_or_default();
        const CHUNK: u64 = 1 << 20;

        let mut low = 1u64;
        while low <= y {
            let high = (low + CHUNK - 1).min(y);
            let len = (high - low + 1) as usize;
            let mut rem: Vec<u64> = (low..=high).collect();
            let mut cnt = vec![0u8; len];
            let mut square = vec![false; len];
            let mut lpf = vec![0u32; len];

            for &p in &base {
                let mut m = low.div_ceil(p) * p;
                while m <= high {
                    let i = (m - low) as usize;
                    cnt[i] += 1;
                    if lpf[i] == 0 {
                        lpf[i] = p as u32;
                    }
                    let mut r = rem[i] / p;
                    if r % p == 0 {
                        square[i] = true;
                        while r % p == 0 {
                            r /= p;
                        }
                    }
                    rem[i] = r;
                    m += p;
                }
            }

            for n in low..=high {
                if n % 2 == 0 || n % 3 == 0 || n % 5 == 0 || n % 7 == 0 {
                    continue;
                }
                if n == 1 {
                    continue;
                }
                let i = (n - low) as usize;
                let idx = self.to_index_floor(n);
                if square[i] {
                    self.entries[idx] = 0;
                    continue;
                }
                let mut distinct = u64::from(cnt[i]);
                if rem[i] > 1 {
                    distinct += 1;
                }
                if cnt[i] == 0 {
                    // √y 以下の素因数なし → n は素数
                    self.entries[idx] = PRIME_SENTINEL;
                } else {
                    let sign_bit = if distinct % 2 == 0 { MU_POSITIVE } else { 0 };
                    self.entries[idx] = sign_bit | (lpf[i] as u16 & LPF_MASK);
                }
            }
            low = high + 1;
        }
    }

    /// n（1 以上）以下で 210 と互いに素な最大の数の稠密インデックス。
    ///
    /// 互いに素な n に対しては n 自身のインデックスになるため、
    /// 区間 (min_m, max_m] の走査は (to_index_floor(min_m), to_index_floor(max_m)]
    /// のインデックス走査に一致します。
    #[inline]
    pub fn to_index_floor(&self, n: u64) -> usize {
        debug_assert!(n >= 1);
        let q = (n / WHEEL_210) as usize;
        let r = (n % WHEEL_210) as usize;
        (q * COPRIMES_PER_PERIOD).wrapping_add(self.floor_index[r] as usize)
    }

    /// 稠密インデックス → 対応する整数 n。
    #[inline]
    pub fn to_number(&self, index: usize) -> u64 {
        (index / COPRIMES_PER_PERIOD) as u64 * WHEEL_210
            + u64::from(self.coprimes[index % COPRIMES_PER_PERIOD])
    }

    /// μ(n) ∈ {−1, 0, +1}。
    #[inline]
    pub fn mu(&self, index: usize) -> i64 {
        let e = self.entries[index];
        if e == 0 {
            0
        } else if e == PRIME_SENTINEL || e & MU_POSITIVE == 0 {
            -1
        } else {
            1
        }
    }

    /// lpf(n)。素数なら n 自身、n = 1 なら u64::MAX 相当の番兵。
    #[inline]
    pub fn lpf(&self, index: usize) -> u64 {
        let e = self.entries[index];
        if index == 0 {
            return u64::MAX;
        }
        if e == PRIME_SENTINEL {
            self.to_number(index)
        } else {
            u64::from(e & LPF_MASK)
        }
    }

    /// special leaf 判定: μ(n) ≠ 0 かつ lpf(n) > prime_b。
    #[inline]
    pub fn is_leaf(&self, index: usize, prime_b: u64) -> bool {
        let e = self.entries[index];
        e != 0 && self.lpf(index) > prime_b
    }
}
