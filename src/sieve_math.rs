use crate::engine_types::PrimeResult;

/// `n` 以下の最大の整数平方根を 2 分探索で求める。
pub fn integer_sqrt(n: u64) -> u64 {
    let mut low = 0u64;
    let mut high = n;
    while low <= high {
        let mid = (low + high) >> 1;
        match mid.checked_mul(mid) {
            Some(val) if val == n => return mid,
            Some(val) if val < n => low = mid + 1,
            _ => high = mid - 1,
        }
    }
    high
}

/// `n` 以下の最大の整数 k 乗根（k >= 2）。
///
/// 浮動小数点で初期値を出し、オーバーフロー安全な整数乗算で境界を補正する。
pub fn integer_root(n: u64, k: u32) -> u64 {
    debug_assert!(k >= 2);
    if n == 0 {
        return 0;
    }
    let mut r = (n as f64).powf(1.0 / k as f64) as u64;
    // 浮動小数点の丸め分だけ上下に補正
    while r > 0 && checked_ipow(r, k).map_or(true, |p| p > n) {
        r -= 1;
    }
    while checked_ipow(r + 1, k).is_some_and(|p| p <= n) {
        r += 1;
    }
    r
}

/// `base^exp`（オーバーフロー時は None）。
pub fn checked_ipow(base: u64, exp: u32) -> Option<u64> {
    base.checked_pow(exp)
}

/// 自然対数の床（最低 1）。セグメントサイズの初期値計算に使う。
pub fn ilog(x: u64) -> u64 {
    ((x.max(2) as f64).ln() as u64).max(1)
}

/// `x` を `[lo, hi]` に収める。`lo <= hi` を仮定する。
pub fn in_between(lo: u64, x: u64, hi: u64) -> u64 {
    x.clamp(lo, hi)
}

/// 仕事量 `dist` に対して意味のあるスレッド数を返す。
///
/// - 1 スレッドあたり `thread_threshold` 以上の仕事が割り当たるように間引く。
/// - 戻り値は必ず 1 以上。
pub fn ideal_num_threads(dist: u64, threads: usize, thread_threshold: u64) -> usize {
    let max_threads = (dist / thread_threshold.max(1)).max(1);
    (threads as u64).min(max_threads).max(1) as usize
}

/// 単純なエラトステネスの篩で `[2, limit]` の素数を列挙する。
pub fn simple_sieve(limit: u64) -> PrimeResult<Vec<u64>> {
    if limit < 2 {
        return Ok(Vec::new());
    }

    let size = (limit + 1) as usize;
    let mut is_prime = vec![true; size];
    is_prime[0] = false;
    if limit >= 1 {
        is_prime[1] = false;
    }

    let lim_sqrt = integer_sqrt(limit);
    for i in 2..=lim_sqrt as usize {
        if is_prime[i] {
            let mut j = i * i;
            while j <= limit as usize {
                is_prime[j] = false;
                j += i;
            }
        }
    }

    let mut primes = Vec::new();
    for (i, &flag) in is_prime.iter().enumerate().take(limit as usize + 1).skip(2) {
        if flag {
            primes.push(i as u64);
        }
    }
    Ok(primes)
}
