use std::sync::atomic::AtomicBool;

use crate::engine_types::PrimeResult;

/// エンジンのメタ情報。
///
/// 以前は外部の C++ ライブラリへのバインディングで π(x) を計算していたが、
/// 現在は本クレート内の組み合わせ法エンジンを使う。
pub const ENGINE_MODE: &str = "pi(x) Gourdon variant (automatic 64/128-bit dispatch)";

/// semver 形式のバージョン文字列。
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// π(x) 計算のアルゴリズム選択。
///
/// CLI から来る「どの分解で計算するか」のタグで、実行時ディスパッチではなく
/// ここで一度だけ分岐する。既定は Gourdon 変種。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Legendre,
    Meissel,
    Lehmer,
    Lmo,
    DelegliseRivat,
    Gourdon,
}

/// Prime counting function π(x) のエンジン入口。
///
/// - 入力: `x`（x 以下の素数の個数を求める）
/// - 戻り値: `PrimeResult<u64>`（成功時は π(x)）
///
/// この関数自体は進捗を報告しない一発計算。長時間計算時のステータス表示は
/// `pi_ctl` に stop flag とステータス有効フラグを渡して行う。
pub fn compute_prime_pi(x: u64) -> PrimeResult<u64> {
    pi(x)
}

/// π(x)。スレッド数は rayon の既定（論理コア数）。
pub fn pi(x: u64) -> PrimeResult<u64> {
    pi_with_threads(x, rayon::current_num_threads())
}

/// π(x)。スレッド数指定付き。
///
/// x が i64 範囲（64bit アキュムレータの安全域）を超える場合は
/// 自動的に 128bit 経路へ回す。
pub fn pi_with_threads(x: u64, threads: usize) -> PrimeResult<u64> {
    let stop = AtomicBool::new(false);
    pi_ctl(x, threads, &stop, false, None)
}

/// π(x) の制御付き本体。
pub fn pi_ctl(
    x: u64,
    threads: usize,
    stop_flag: &AtomicBool,
    status_enabled: bool,
    alpha_override: Option<f64>,
) -> PrimeResult<u64> {
    let threads = normalize_threads(threads);
    if x > i64::MAX as u64 {
        let result =
            crate::gourdon::pi_gourdon_u128(u128::from(x), threads, stop_flag, status_enabled, alpha_override)?;
        return Ok(result as u64);
    }
    crate::gourdon::pi_gourdon_ctl(x, threads, stop_flag, status_enabled, alpha_override)
}

/// π(x) の 128bit 入口。x ≤ 10^21 をサポートする。
pub fn pi_u128(x: u128, threads: usize) -> PrimeResult<u128> {
    let threads = normalize_threads(threads);
    let stop = AtomicBool::new(false);
    if x <= i64::MAX as u128 {
        return Ok(u128::from(pi_ctl(x as u64, threads, &stop, false, None)?));
    }
    crate::gourdon::pi_gourdon_u128(x, threads, &stop, false, None)
}

/// アルゴリズム指定付き π(x)（CLI・相互検証用）。
pub fn pi_with_algorithm(
    x: u64,
    threads: usize,
    algorithm: Algorithm,
    stop_flag: &AtomicBool,
    status_enabled: bool,
    alpha_override: Option<f64>,
) -> PrimeResult<u64> {
    let threads = normalize_threads(threads);
    match algorithm {
        Algorithm::Legendre => crate::legendre::pi_legendre(x, threads),
        Algorithm::Meissel => crate::meissel::pi_meissel(x, threads),
        Algorithm::Lehmer => crate::lehmer::pi_lehmer(x, threads),
        Algorithm::Lmo => {
            crate::lmo_parallel::pi_lmo_parallel_ctl(x, threads, stop_flag, status_enabled, alpha_override)
        }
        Algorithm::DelegliseRivat => crate::deleglise_rivat::pi_deleglise_rivat_ctl(
            x,
            threads,
            stop_flag,
            status_enabled,
            alpha_override,
        ),
        Algorithm::Gourdon => {
            pi_ctl(x, threads, stop_flag, status_enabled, alpha_override)
        }
    }
}

/// n 番目の素数。
pub fn nth_prime(n: u64, threads: usize) -> PrimeResult<u64> {
    crate::nth_prime::nth_prime(n, normalize_threads(threads))
}

/// 部分篩関数 φ(x, a)。
pub fn phi(x: u64, a: u64, threads: usize) -> PrimeResult<u64> {
    crate::phi::phi(x, a, normalize_threads(threads))
}

/// 区間 [min, max] に含まれる素数の個数を π で計算するヘルパー。
///
/// - min > max の場合はエラーを返す。
/// - 計算自体は `pi` を 2 回呼ぶだけの薄いラッパー。
pub fn prime_count_in_range(min: u64, max: u64) -> PrimeResult<u64> {
    if min > max {
        return Err("min must be <= max".into());
    }

    let pi_max = pi(max)?;
    let pi_before_min = if min > 0 { pi(min - 1)? } else { 0 };

    Ok(pi_max.saturating_sub(pi_before_min))
}

fn normalize_threads(threads: usize) -> usize {
    if threads == 0 {
        rayon::current_num_threads()
    } else {
        threads
    }
}
