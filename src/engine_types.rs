use std::error::Error;

// エンジン層（π(x) 各アルゴリズム・nth prime・検証）で共有するエラー型と進捗情報の定義。
//
// - このモジュールの型は CLI 層（`main.rs`）・ステータス表示（`status.rs`）との
//   「進捗・ETA 契約」の一部です。
// - 特に `Progress` のフィールド意味はステータス行の表示に直結するため、互換性を壊さないようにしてください。

/// エンジン共通の結果型。
///
/// - すべての長時間実行タスク（π(x) 計算、nth prime 探索、検証処理など）はこの型を返します。
/// - エラーは `Send + Sync` な Box でラップされ、ワーカースレッドから安全に伝播できる想定です。
/// - ドメインエラー（負の入力・ビット幅超過）も停止要求（stop flag）もこの型で報告されます。
pub type PrimeResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// 長時間計算の進捗情報。
///
/// ステータス表示とは次の「契約」を満たす必要があります:
/// - `processed` と `total` は単調に増加する（逆戻りしない）こと
/// - `processed <= total` を維持すること（ETA 計算で使用）
/// - `eta_secs` は「残り時間の概算」であり、`None` の場合は「まだ計算できない」ことを意味すること
///
/// ウェーブ境界（load_balancer 参照）でのみ更新されます。ウェーブ内のワーカーは
/// この構造体に触れません。
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    /// これまでに処理した値の個数（篩なら low の進み）。
    pub processed: u64,
    /// 全体として処理する予定の値の個数。
    pub total: u64,
    /// 推定残り時間（秒）。まだ計算できない場合は None。
    pub eta_secs: Option<u64>,
}

/// 現在の進捗と経過時間から ETA（残り時間の秒数）を推定するユーティリティ。
///
/// - `processed` / `total` は 0 以上で、`processed <= total` を想定しています。
/// - 進捗 0% の間は `None` を返し、ある程度進んでから ETA を表示する前提です。
pub fn compute_eta(processed: u64, total: u64, elapsed_secs: f64) -> Option<u64> {
    if total == 0 {
        return None;
    }
    let progress = processed.min(total) as f64 / total as f64;
    if progress > 0.0 {
        let total_time = elapsed_secs / progress;
        Some(((total_time - elapsed_secs).max(0.0)).round() as u64)
    } else {
        None
    }
}

/// ETA（残り時間の秒数）を人間が読みやすい文字列にフォーマットするヘルパー。
///
/// - `None` の場合は「Calculating...」として表示されます（まだ統計が安定していない状態）。
/// - 数十秒〜数分〜数時間といったオーダーに応じて単位を切り替えます。
///
/// 例:
/// - `None`  → `"Calculating..."`
/// - `Some(45)` → `"45 sec"`
/// - `Some(125)` → `"2 min 5 sec"`
/// - `Some(3670)` → `"1 h 1 min"`
pub fn format_eta(eta_secs: Option<u64>) -> String {
    match eta_secs {
        None => "Calculating...".to_string(),
        Some(secs) => {
            if secs < 60 {
                format!("{secs} sec")
            } else if secs < 3600 {
                let minutes = secs / 60;
                let seconds = secs % 60;
                if seconds == 0 {
                    format!("{minutes} min")
                } else {
                    format!("{minutes} min {seconds} sec")
                }
            } else {
                let hours = secs / 3600;
                let minutes = (secs % 3600) / 60;
                if minutes == 0 {
                    format!("{hours} h")
                } else {
                    format!("{hours} h {minutes} min")
                }
            }
        }
    }
}
