//! Meissel の公式による π(x)。
//!
//! π(x) = φ(x, a) + a − 1 − P2(x, x^{1/3}),  a = π(x^{1/3})
//!
//! Legendre から P2 項を分離して a を下げた古典形。

use std::sync::atomic::AtomicBool;

use crate::engine_types::PrimeResult;
use crate::generators::primes_array;
use crate::p2::p2;
use crate::phi::phi_parallel;
use crate::pi_table::PiTable;
use crate::sieve_math::{integer_root, integer_sqrt};

pub fn pi_meissel(x: u64, threads: usize) -> PrimeResult<u64> {
    if x < 2 {
        return Ok(0);
    }

    let stop = AtomicBool::new(false);
    let x13 = integer_root(x, 3).max(1);
    let sqrt_x = integer_sqrt(x);
    let primes = primes_array(x13, &stop)?;
    let a = primes.len() as u64 - 1;
    let pi = PiTable::new(sqrt_x.max(8), threads);

    let phi = phi_parallel(x, a, &primes, &pi, threads) as i64;
    let p2 = p2::<u64>(x, x13, threads, &stop, false)?;

    let sum = phi + a as i64 - 1 - p2;
    Ok(sum as u64)
}
