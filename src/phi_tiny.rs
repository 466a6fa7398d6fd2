//! 小さい a に対する部分篩関数 φ(x, a) の閉形式評価。
//!
//! 最初の a 個の素数のホイール周期 Π_a を使い、
//! φ(x, a) = (x / Π_a)·φ(Π_a, a) + table[a][x mod Π_a]
//! を O(1) で返します。テーブルはプロセス全体で 1 度だけ構築される読み取り専用です。

use std::sync::OnceLock;

/// φ(x, a) を閉形式で扱える a の上限。
pub const MAX_A: u64 = 7;

/// 最初の 8 素数（1 始まり、index 0 は番兵）。get_c と周期計算に使う。
const SMALL_PRIMES: [u64; 9] = [0, 2, 3, 5, 7, 11, 13, 17, 19];

/// 各 a のホイール周期 Π_a = 2·3·…·p_a。
const PERIODS: [u64; 8] = [1, 2, 6, 30, 210, 2310, 30030, 510510];

/// φ(Π_a, a) = (2−1)(3−1)…(p_a−1)。
const TOTIENTS: [u64; 8] = [1, 1, 2, 8, 48, 480, 5760, 92160];

pub struct PhiTiny {
    /// tables[a][r] = #{1 ≤ k ≤ r : k は最初の a 素数と互いに素}
    tables: Vec<Vec<u32>>,
}

static PHI_TINY: OnceLock<PhiTiny> = OnceLock::new();

impl PhiTiny {
    pub fn get() -> &'static PhiTiny {
        PHI_TINY.get_or_init(PhiTiny::build)
    }

    fn build() -> PhiTiny {
        let mut tables = Vec::with_capacity((MAX_A + 1) as usize);
        for a in 0..=MAX_A as usize {
            let period = PERIODS[a] as usize;
            let mut table = vec![0u32; period];
            let mut running = 0u32;
            for r in 0..period {
                if r > 0 {
                    let mut coprime = true;
                    for &p in &SMALL_PRIMES[1..=a] {
                        if (r as u64) % p == 0 {
                            coprime = false;
                            break;
                        }
                    }
                    if coprime {
                        running += 1;
                    }
                }
                table[r] = running;
            }
            tables.push(table);
        }
        PhiTiny { tables }
    }

    /// φ(x, a)。契約: a <= MAX_A。
    #[inline]
    pub fn phi(&self, x: u64, a: u64) -> u64 {
        debug_assert!(a <= MAX_A);
        let a = a as usize;
        let period = PERIODS[a];
        (x / period) * TOTIENTS[a] + u64::from(self.tables[a][(x % period) as usize])
    }

    /// 128bit 引数版。周期演算だけ u128 で行い、テーブルは共有する。
    #[inline]
    pub fn phi_u128(&self, x: u128, a: u64) -> u128 {
        debug_assert!(a <= MAX_A);
        let a = a as usize;
        let period = u128::from(PERIODS[a]);
        (x / period) * u128::from(TOTIENTS[a])
            + u128::from(self.tables[a][(x % period) as usize])
    }
}

/// a がホイール閉形式で処理できる範囲かどうか。
#[inline]
pub fn is_tiny(a: u64) -> bool {
    a <= MAX_A
}

/// φ(x, a) for a <= MAX_A。
#[inline]
pub fn phi_tiny(x: u64, a: u64) -> u64 {
    PhiTiny::get().phi(x, a)
}

/// primes[a+1]^2 <= y を満たす最大の a（ただし a <= MAX_A）。
///
/// φ(y, b) の b <= c 部分を閉形式に落とすためのしきい値で、
/// 各アルゴリズムの「小さい素数はまとめて篩う」境界として使われます。
pub fn get_c(y: u64) -> u64 {
    let mut c = 0u64;
    for a in 1..=MAX_A {
        let p = SMALL_PRIMES[(a + 1) as usize];
        if p * p <= y {
            c = a;
        } else {
            break;
        }
    }
    c
}
