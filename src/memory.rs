use sysinfo::System;

/// システムの物理メモリ総量を取得（バイト単位）
pub fn get_total_memory() -> u64 {
    let mut sys = System::new_all();
    sys.refresh_memory();
    sys.total_memory()
}

/// セグメントあたりのメモリ使用量を推定（バイト単位）
/// segment_size: セグメントに含まれる数値の範囲（ビット篩 1 ビット = 1 値）
pub fn estimate_segment_memory(segment_size: u64) -> u64 {
    // ビット篩 + カウンタツリー (u32 × ブロック数) + next[] ホイール。
    // Vec のオーバーヘッド等を考慮して 1.2 倍
    let bytes = (segment_size / 8).max(1) + integer_sqrt_approx(segment_size) * 4;
    (bytes as f64 * 1.2) as u64
}

fn integer_sqrt_approx(n: u64) -> u64 {
    (n as f64).sqrt() as u64 + 1
}

/// メモリ制限に基づいてセグメントサイズの上限を計算
/// memory_usage_percent: システムメモリの何%まで使用するか (10.0 ~ 90.0)
/// num_threads: 並列スレッド数
/// returns: 1 スレッドが確保してよいセグメントサイズ上限（2 のべきに丸め済み）
pub fn max_segment_size(memory_usage_percent: f64, num_threads: usize) -> u64 {
    let total_memory = get_total_memory();
    let percent = memory_usage_percent.clamp(10.0, 90.0);
    let allowed_memory = (total_memory as f64 * percent / 100.0) as u64;

    // 安全係数 (他のプロセスやシステムのために余裕を持たせる)
    let safety_factor = 2.0;
    let per_thread_memory = allowed_memory / (num_threads as u64).max(1);
    let safe_memory = (per_thread_memory as f64 / safety_factor) as u64;

    // estimate_segment_memory(size) ≈ size * 1.2 / 8 = safe_memory
    let segment_size = (safe_memory as f64 * 8.0 / 1.2) as u64;

    let min_size = 1u64 << 16;
    let max_size = 1u64 << 34;
    let clamped = segment_size.clamp(min_size, max_size);
    // 2 のべきへ切り下げ（セグメント演算は純シフトで行うため）
    1u64 << (63 - clamped.leading_zeros() as u64)
}

/// メモリ使用量の情報を表示用に取得
pub fn get_memory_info(segment_size: u64, num_threads: usize) -> MemoryInfo {
    let total_memory = get_total_memory();
    let segment_memory = estimate_segment_memory(segment_size);
    let estimated_total = segment_memory * num_threads as u64;
    let usage_percent = (estimated_total as f64 / total_memory as f64) * 100.0;

    MemoryInfo {
        total_memory,
        segment_memory,
        estimated_total,
        usage_percent,
    }
}

#[derive(Debug, Clone)]
pub struct MemoryInfo {
    pub total_memory: u64,
    pub segment_memory: u64,
    pub estimated_total: u64,
    pub usage_percent: f64,
}

impl MemoryInfo {
    pub fn format(&self) -> String {
        format!(
            "メモリ: システム {:.1}GB, セグメント {:.1}MB, 推定使用量 {:.1}MB ({:.1}%)",
            self.total_memory as f64 / (1024.0 * 1024.0 * 1024.0),
            self.segment_memory as f64 / (1024.0 * 1024.0),
            self.estimated_total as f64 / (1024.0 * 1024.0),
            self.usage_percent
        )
    }
}
