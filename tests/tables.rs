use sosu_kazoe::bit_sieve::BitSieve;
use sosu_kazoe::counters::Counters;
use sosu_kazoe::factor_table::FactorTable;
use sosu_kazoe::pi_table::PiTable;
use sosu_kazoe::primes::MOD30_PATTERN;
use sosu_kazoe::riemann_r::riemann_r;
use sosu_kazoe::sieve_math::simple_sieve;

/// 線形篩による π テーブル（テスト専用）。
fn pi_linear(limit: u64) -> Vec<u64> {
    let mut is_prime = vec![true; (limit + 1) as usize];
    is_prime[0] = false;
    if limit >= 1 {
        is_prime[1] = false;
    }
    let mut p = 2u64;
    while p * p <= limit {
        if is_prime[p as usize] {
            let mut m = p * p;
            while m <= limit {
                is_prime[m as usize] = false;
                m += p;
            }
        }
        p += 1;
    }
    let mut pi = vec![0u64; (limit + 1) as usize];
    let mut count = 0u64;
    for n in 0..=limit {
        if is_prime[n as usize] {
            count += 1;
        }
        pi[n as usize] = count;
    }
    pi
}

/// PiTable.pi(n) が線形篩の π と 10^6 まで一致することを確認する。
#[test]
fn pi_table_matches_linear_sieve_up_to_1e6() {
    let limit = 1_000_000u64;
    let reference = pi_linear(limit);
    let table = PiTable::new(limit, 2);

    // コンパイル時キャッシュ境界（128·240 = 30720）前後は全点、それ以外は刻んで
    for n in 0..=40_000u64 {
        assert_eq!(table.pi(n), reference[n as usize], "pi({n})");
    }
    let mut n = 40_001u64;
    while n <= limit {
        assert_eq!(table.pi(n), reference[n as usize], "pi({n})");
        n += 997; // 適当な素数刻み
    }
    assert_eq!(table.pi(limit), reference[limit as usize]);
}

/// FactorTable の μ・lpf・インデックス往復を素朴な計算と突き合わせる。
#[test]
fn factor_table_matches_naive_mu_and_lpf() {
    fn naive_mu_lpf(n: u64) -> (i64, u64) {
        if n == 1 {
            return (1, u64::MAX);
        }
        let mut m = n;
        let mut distinct = 0;
        let mut lpf = 0u64;
        let mut square = false;
        let mut d = 2u64;
        while d * d <= m {
            if m % d == 0 {
                if lpf == 0 {
                    lpf = d;
                }
                distinct += 1;
                let mut k = 0;
                while m % d == 0 {
                    m /= d;
                    k += 1;
                }
                if k > 1 {
                    square = true;
                }
            }
            d += 1;
        }
        if m > 1 {
            if lpf == 0 {
                lpf = m;
            }
            distinct += 1;
        }
        let mu = if square {
            0
        } else if distinct % 2 == 0 {
            1
        } else {
            -1
        };
        (mu, lpf)
    }

    let y = 100_000u64;
    let table = FactorTable::new(y).expect("FactorTable failed");

    for n in 1..=y {
        if n % 2 == 0 || n % 3 == 0 || n % 5 == 0 || n % 7 == 0 {
            continue;
        }
        let idx = table.to_index_floor(n);
        assert_eq!(table.to_number(idx), n, "index round trip for {n}");

        let (mu, lpf) = naive_mu_lpf(n);
        assert_eq!(table.mu(idx), mu, "mu({n})");
        if mu != 0 {
            assert_eq!(table.lpf(idx), lpf, "lpf({n})");
        }
    }
}

/// ビット篩: reset 後の初期パターンと count の境界動作。
#[test]
fn bit_sieve_reset_and_count() {
    let mut sieve = BitSieve::new(256);

    sieve.reset(0);
    assert!(!sieve.test(0)); // 0
    assert!(!sieve.test(1)); // 1
    assert!(sieve.test(2)); // 2 は素数扱いで残す
    assert!(sieve.test(3));
    assert!(!sieve.test(4));

    sieve.reset(101); // low 奇数 → 偶数オフセットが奇数値
    assert!(sieve.test(0)); // 101
    assert!(!sieve.test(1)); // 102

    for stop in [0usize, 5, 63, 64, 65, 127, 128, 255] {
        let naive: u64 = (0..=stop).map(|i| sieve.test(i) as u64).sum();
        assert_eq!(sieve.count(0, stop), naive, "count(0, {stop})");
    }
}

/// カウンタツリー不変条件: 任意の unset 列の後で query(i) = count(0, i)。
#[test]
fn counters_rank_matches_popcount_after_updates() {
    let segment_size = 1 << 12;
    let mut sieve = BitSieve::new(segment_size);
    let mut counters = Counters::new(segment_size);

    sieve.reset(1);
    counters.init(&sieve);

    // 決定的な擬似乱数列（LCG）で unset 位置を選ぶ
    let mut state = 12345u64;
    for _ in 0..2_000 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let i = (state >> 33) as usize % segment_size;
        if sieve.test(i) {
            sieve.unset(i);
            counters.unset(i);
        }
    }

    for i in (0..segment_size).step_by(97) {
        assert_eq!(
            counters.query(&sieve, i),
            sieve.count(0, i),
            "rank({i}) after updates"
        );
    }
}

/// スモークテスト: p ≥ 7 の素数は mod 30 で {1,7,11,13,17,19,23,29} に入り、
/// p + 1 は p = 2 のときに限り素数になる。
#[test]
fn prime_residues_mod_30() {
    let primes = simple_sieve(100_000).expect("simple_sieve failed");
    let is_prime: Vec<bool> = {
        let mut v = vec![false; 100_002];
        for &p in &primes {
            v[p as usize] = true;
        }
        v
    };

    for &p in &primes {
        if p >= 7 {
            assert!(
                MOD30_PATTERN.contains(&(p % 30)),
                "prime {p} has residue {} mod 30",
                p % 30
            );
        }
        let next_is_prime = is_prime[(p + 1) as usize];
        assert_eq!(next_is_prime, p == 2, "p + 1 primality for p = {p}");
    }
}

/// Riemann R が π(10^k) を近似することを確認する。
///
/// 相対誤差は x が大きいほど縮む（10^6 以降で 0.1% 未満）。
#[test]
fn riemann_r_approximates_pi() {
    // (x, π(x), 許容相対誤差)
    let references: &[(u64, u64, f64)] = &[
        (100, 25, 0.05),
        (10_000, 1_229, 0.005),
        (1_000_000, 78_498, 0.001),
        (100_000_000, 5_761_455, 0.001),
        (10_000_000_000, 455_052_511, 0.001),
        (1_000_000_000_000, 37_607_912_018, 0.001),
    ];

    for &(x, pi_x, tolerance) in references {
        let r = riemann_r(x as f64);
        let err = (r - pi_x as f64).abs() / pi_x as f64;
        assert!(err < tolerance, "RiemannR({x}) = {r}, pi = {pi_x}, err = {err}");
    }
}
