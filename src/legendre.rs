//! Legendre の公式による π(x)。
//!
//! π(x) = φ(x, a) + a − 1,  a = π(√x)
//!
//! 最も素朴な組み合わせ法。他アルゴリズムの相互検証の基準として残している。

use std::sync::atomic::AtomicBool;

use crate::engine_types::PrimeResult;
use crate::generators::primes_array;
use crate::phi::phi_parallel;
use crate::pi_table::PiTable;
use crate::sieve_math::integer_sqrt;

pub fn pi_legendre(x: u64, threads: usize) -> PrimeResult<u64> {
    if x < 2 {
        return Ok(0);
    }

    let stop = AtomicBool::new(false);
    let sqrt_x = integer_sqrt(x);
    let primes = primes_array(sqrt_x, &stop)?;
    let a = primes.len() as u64 - 1;
    let pi = PiTable::new(sqrt_x.max(8), threads);

    let phi = phi_parallel(x, a, &primes, &pi, threads);
    Ok(phi + a - 1)
}
