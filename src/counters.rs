//! ビット篩に対する rank 用のカウンタツリー。
//!
//! セグメントを幅 ≈ √S の等幅ブロックに分割し、ブロックごとの 1 ビット数を持ちます。
//! `query(i)` は「セグメント先頭からビット i までの生存数（rank）」を
//! 先行ブロックのカウンタ和 + 末端ブロックの popcount で返します。
//! `unset` 1 回につきカウンタの減算は 1 箇所だけです。
//!
//! 不変条件: 任意の unset 列の後で `query(i) == sieve.count(0, i)`。

use crate::bit_sieve::BitSieve;

pub struct Counters {
    counts: Vec<u32>,
    /// ブロック幅 = 1 << shift（2 のべき。ブロック境界計算は純シフト）
    shift: u32,
}

impl Counters {
    /// セグメント長 `segment_size`（2 のべき）に対するカウンタツリー。
    /// ブロック幅は √S に最も近い 2 のべき（下限 64）。
    pub fn new(segment_size: usize) -> Self {
        debug_assert!(segment_size.is_power_of_two());
        let log2 = segment_size.trailing_zeros();
        let shift = (log2 / 2).max(6);
        let blocks = segment_size >> shift;
        Counters {
            counts: vec![0u32; blocks.max(1)],
            shift,
        }
    }

    /// 現在の篩の状態からブロックカウンタを作り直す。セグメントごとに 1 回呼ぶ。
    pub fn init(&mut self, sieve: &BitSieve) {
        let width = 1usize << self.shift;
        let size = sieve.size();
        for (b, slot) in self.counts.iter_mut().enumerate() {
            let start = b << self.shift;
            if start >= size {
                *slot = 0;
                continue;
            }
            let stop = (start + width - 1).min(size - 1);
            *slot = sieve.count(start, stop) as u32;
        }
    }

    /// ビット i を消した直後に呼ぶ。該当ブロックのカウンタを 1 減らす。
    #[inline]
    pub fn unset(&mut self, i: usize) {
        self.counts[i >> self.shift] -= 1;
    }

    /// rank: `sieve.count(0, i)` に等しい値を O(√S) で返す。
    pub fn query(&self, sieve: &BitSieve, i: usize) -> u64 {
        let block = i >> self.shift;
        let mut rank: u64 = 0;
        for b in 0..block {
            rank += u64::from(self.counts[b]);
        }
        rank + sieve.count(block << self.shift, i)
    }
}
