//! ウェーブ型ロードバランサ。
//!
//! 重い項（S2 hard / Gourdon B・D、A・C、P2）ごとに 1 つずつ置き、
//! 「1 ウェーブ = 全ワーカーへの parallel-for 1 回」の粒度を動的に調整します。
//!
//! 方針（ウェーブ所要時間が目標帯に入るまで幾何的に成長、縮小はしない）:
//! - special leaf は篩領域の先頭に集中するため、小さいセグメントから始める
//! - ウェーブが速すぎたらセグメントサイズを 2 倍（√limit まで）、
//!   その後は segments_per_thread を 2 倍
//! - セグメントサイズは常に 2 のべき（セグメント演算は純シフト）
//! - メモリ上限（memory.rs）を超えては成長しない
//!
//! 成長判定はウェーブ境界でのみ行うため、どのスレッド数でも同じ分割列になり、
//! 合算順序と合わせて結果の決定性が保たれます。

use crate::memory;
use crate::sieve_math::{ilog, integer_sqrt};

/// 成長を止めるウェーブ所要時間のしきい値（秒）。
/// この帯を超えたウェーブ以降は粒度を固定する。
const TARGET_WAVE_SECS: f64 = 5.0;

/// 最小セグメントサイズ（ビット数）。
const MIN_SEGMENT_SIZE: u64 = 1 << 6;

struct WaveBalancer {
    segment_size: u64,
    segments_per_thread: u64,
    sqrt_limit: u64,
    max_segment_size: u64,
    grow_from_start: bool,
}

impl WaveBalancer {
    fn new(limit: u64, threads: usize, grow_from_start: bool) -> Self {
        let sqrt_limit = integer_sqrt(limit).max(MIN_SEGMENT_SIZE);
        let logx = ilog(limit);
        let initial = (sqrt_limit / (logx * threads.max(1) as u64))
            .next_power_of_two()
            .clamp(MIN_SEGMENT_SIZE, sqrt_limit.next_power_of_two());
        let max_segment_size = memory::max_segment_size(50.0, threads);
        WaveBalancer {
            segment_size: initial.min(max_segment_size),
            segments_per_thread: 1,
            sqrt_limit,
            max_segment_size,
            grow_from_start,
        }
    }

    fn update(&mut self, low: u64, wave_seconds: f64) {
        if wave_seconds >= TARGET_WAVE_SECS {
            return;
        }
        if !self.grow_from_start && low <= self.sqrt_limit {
            return;
        }
        if self.segment_size < self.sqrt_limit && self.segment_size < self.max_segment_size {
            self.segment_size <<= 1;
        } else {
            self.segments_per_thread *= 2;
        }
    }
}

/// S2 hard（LMO / Deléglise–Rivat / Gourdon B・D）のウェーブ粒度。
pub struct LoadBalancerS2 {
    inner: WaveBalancer,
}

impl LoadBalancerS2 {
    /// `limit` は篩の上限（x/y）。初期セグメントは
    /// next_pow2(√limit / (log x · threads))。
    pub fn new(limit: u64, threads: usize) -> Self {
        LoadBalancerS2 {
            inner: WaveBalancer::new(limit, threads, false),
        }
    }

    pub fn segment_size(&self) -> u64 {
        self.inner.segment_size
    }

    pub fn segments_per_thread(&self) -> u64 {
        self.inner.segments_per_thread
    }

    /// ウェーブ完了ごとに呼ぶ。`low` は次ウェーブの開始位置。
    pub fn update(&mut self, low: u64, wave_seconds: f64) {
        self.inner.update(low, wave_seconds);
    }
}

/// A・C 項（easy leaf の π 表引きループ）のウェーブ粒度。
///
/// こちらのワークユニットは篩セグメントではなく素数インデックス b の区間。
/// チャンク幅を同じ成長則で広げる。
pub struct LoadBalancerAC {
    chunk: u64,
    max_chunk: u64,
}

impl LoadBalancerAC {
    pub fn new(b_range: u64, threads: usize) -> Self {
        let max_chunk = (b_range / threads.max(1) as u64).max(1);
        let cap = max_chunk.next_power_of_two().max(64);
        let chunk = (b_range / (threads.max(1) as u64 * 64))
            .next_power_of_two()
            .clamp(64, cap);
        LoadBalancerAC { chunk, max_chunk }
    }

    pub fn chunk(&self) -> u64 {
        self.chunk
    }

    pub fn update(&mut self, wave_seconds: f64) {
        if wave_seconds < TARGET_WAVE_SECS && self.chunk < self.max_chunk {
            self.chunk *= 2;
        }
    }
}

/// P2 項の篩セグメント粒度。
///
/// P2 は 1 位置あたりの仕事が軽いので、最初から大きめのセグメントを使い、
/// 速いウェーブが続く限り成長させる。
pub struct LoadBalancerP2 {
    inner: WaveBalancer,
}

impl LoadBalancerP2 {
    pub fn new(limit: u64, threads: usize) -> Self {
        let mut inner = WaveBalancer::new(limit, threads, true);
        inner.segment_size = (inner.segment_size << 6)
            .next_power_of_two()
            .min(inner.max_segment_size);
        LoadBalancerP2 { inner }
    }

    pub fn segment_size(&self) -> u64 {
        self.inner.segment_size
    }

    pub fn segments_per_thread(&self) -> u64 {
        self.inner.segments_per_thread
    }

    pub fn update(&mut self, low: u64, wave_seconds: f64) {
        self.inner.update(low, wave_seconds);
    }
}
