//! ウェーブ境界でのステータス表示。
//!
//! 進捗・ETA 契約（engine_types.rs）:
//! - `Progress::processed` / `total` は篩の low の進みをそのまま使う（単調増加）
//! - 表示はウェーブの合間にのみ行う。ワーカー実行中には一切出力しない
//! - 無効時（デフォルト）は完全に無音

use std::time::Instant;

use crate::engine_types::{compute_eta, format_eta, Progress};

pub struct Status {
    enabled: bool,
    label: &'static str,
    start: Instant,
    last_print: f64,
}

impl Status {
    pub fn new(label: &'static str, enabled: bool) -> Self {
        Status {
            enabled,
            label,
            start: Instant::now(),
            last_print: 0.0,
        }
    }

    /// ウェーブ完了ごとに呼ぶ。0.5 秒以上間隔を空けて進捗行をログする。
    pub fn wave_done(&mut self, processed: u64, total: u64) {
        if !self.enabled {
            return;
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        if elapsed - self.last_print < 0.5 && processed < total {
            return;
        }
        self.last_print = elapsed;

        let progress = Progress {
            processed: processed.min(total),
            total,
            eta_secs: compute_eta(processed.min(total), total, elapsed),
        };
        let percent = if total == 0 {
            100.0
        } else {
            progress.processed as f64 / total as f64 * 100.0
        };
        log::info!(
            "{}: {:.1}% (ETA: {})",
            self.label,
            percent,
            format_eta(progress.eta_secs)
        );
    }
}
