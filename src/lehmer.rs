//! Lehmer の公式による π(x)。
//!
//! a = π(x^{1/4}), b = π(√x), c = π(x^{1/3}) として
//!
//! π(x) = φ(x, a) + (b + a − 2)(b − a + 1)/2
//!        − Σ_{a < i ≤ b} π(x/p_i)
//!        − Σ_{a < i ≤ c} Σ_{i ≤ j ≤ π(√(x/p_i))} ( π(x/(p_i·p_j)) − (j − 1) )
//!
//! π 表を x/p_{a+1}（< x^{3/4}）までメモリに持つ素朴な形なので、
//! 参照実装としてだけ使う（本命経路からは呼ばれない）。

use std::sync::atomic::AtomicBool;

use crate::engine_types::PrimeResult;
use crate::generators::primes_array;
use crate::lmo::pi_bsearch;
use crate::phi::phi_parallel;
use crate::pi_table::PiTable;
use crate::sieve_math::{integer_root, integer_sqrt, simple_sieve};

pub fn pi_lehmer(x: u64, threads: usize) -> PrimeResult<u64> {
    if x < 100 {
        return Ok(simple_sieve(x)?.len() as u64);
    }

    let stop = AtomicBool::new(false);
    let x14 = integer_root(x, 4).max(1);
    let x13 = integer_root(x, 3).max(1);
    let sqrt_x = integer_sqrt(x);

    let primes = primes_array(sqrt_x, &stop)?;
    let a = pi_bsearch(&primes, x14);
    let b = primes.len() as u64 - 1;
    let c = pi_bsearch(&primes, x13);

    // π 表は最大引数 x / p_{a+1} をカバーする
    let max_arg = x / u64::from(primes[(a + 1) as usize]);
    let pi = PiTable::new(max_arg.max(sqrt_x).max(8), threads);

    let mut sum = phi_parallel(x, a, &primes, &pi, threads) as i64
        + ((b + a - 2) * (b - a + 1) / 2) as i64;

    for i in (a + 1)..=b {
        let p = u64::from(primes[i as usize]);
        sum -= pi.pi(x / p) as i64;
    }

    for i in (a + 1)..=c {
        let p = u64::from(primes[i as usize]);
        let w = x / p;
        let b_i = pi_bsearch(&primes, integer_sqrt(w));
        for j in i..=b_i {
            let q = u64::from(primes[j as usize]);
            sum -= pi.pi(w / q) as i64 - (j as i64 - 1);
        }
    }

    Ok(sum as u64)
}
