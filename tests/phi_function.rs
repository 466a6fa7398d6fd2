use sosu_kazoe::phi_tiny::{get_c, phi_tiny};
use sosu_kazoe::prime_pi_engine::phi;

const SMALL_PRIMES: [u64; 10] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29];

/// φ(x, a) の素朴な定義（テスト専用）: [1, x] のうち最初の a 個の
/// 素数のどれでも割り切れない個数。
fn phi_naive(x: u64, a: usize) -> u64 {
    (1..=x)
        .filter(|&n| SMALL_PRIMES[..a].iter().all(|&p| n % p != 0))
        .count() as u64
}

/// 小さい (x, a) で φ が素朴な数え上げと一致することを確認する。
#[test]
fn phi_matches_naive_count() {
    for &x in &[0u64, 1, 10, 100, 1_000, 12_345] {
        for a in 0..=9usize {
            let expected = phi_naive(x, a);
            let got = phi(x, a as u64, 1).expect("phi failed");
            assert_eq!(got, expected, "phi({x}, {a}) should be {expected}");
        }
    }
}

/// PhiTiny の閉形式が素朴な数え上げと一致することを確認する。
#[test]
fn phi_tiny_matches_naive_count() {
    for a in 0..=7u64 {
        for x in [0u64, 1, 2, 29, 30, 209, 210, 2_309, 2_310, 5_000, 510_510] {
            assert_eq!(
                phi_tiny(x, a),
                phi_naive(x, a as usize),
                "phi_tiny({x}, {a})"
            );
        }
    }
}

/// get_c: primes[a+1]^2 <= y を満たす最大の a（<= 7）。
#[test]
fn get_c_boundaries() {
    assert_eq!(get_c(0), 0);
    assert_eq!(get_c(8), 0);
    assert_eq!(get_c(9), 1); // 3^2 = 9
    assert_eq!(get_c(24), 1);
    assert_eq!(get_c(25), 2); // 5^2 = 25
    assert_eq!(get_c(121), 4); // 11^2 = 121
    assert_eq!(get_c(361), 7); // 19^2 = 361
    assert_eq!(get_c(1_000_000_000), 7);
}

/// φ(10^9, 7): ホイール閉形式だけから独立に計算できる参照値との一致。
///
/// φ(x, 7) = (x / 510510)·92160 + #{r ≤ x mod 510510 : gcd(r, 510510) = 1}
#[test]
fn phi_1e9_a7_matches_wheel_arithmetic() {
    fn gcd(mut a: u64, mut b: u64) -> u64 {
        while b != 0 {
            let t = a % b;
            a = b;
            b = t;
        }
        a
    }

    let x: u64 = 1_000_000_000;
    let period: u64 = 510_510; // 2·3·5·7·11·13·17
    let totient: u64 = 92_160;
    let rem = x % period;
    let tail = (1..=rem).filter(|&r| gcd(r, period) == 1).count() as u64;
    let expected = (x / period) * totient + tail;

    let got = phi(x, 7, 2).expect("phi failed");
    assert_eq!(got, expected, "phi(10^9, 7) should be {expected}");
}

/// 恒等式 φ(x, a) = φ(x, a−1) − φ(x/p_a, a−1) のスポットチェック。
#[test]
fn phi_recurrence_holds() {
    for &x in &[1_000u64, 50_000, 999_999] {
        for a in 1..=9u64 {
            let p = SMALL_PRIMES[(a - 1) as usize];
            let lhs = phi(x, a, 1).expect("phi failed");
            let rhs = phi(x, a - 1, 1).expect("phi failed")
                - phi(x / p, a - 1, 1).expect("phi failed");
            assert_eq!(lhs, rhs, "recurrence fails for x = {x}, a = {a}");
        }
    }
}

/// a ≥ π(√x) の経路: φ(x, a) = 1 + max(0, π(x) − a)。
#[test]
fn phi_large_a_shortcut() {
    // π(10^4) = 1229, π(100) = 25
    assert_eq!(phi(10_000, 25, 1).expect("phi failed"), 1 + 1_229 - 25);
    // a ≥ π(x) なら生き残りは 1 だけ
    assert_eq!(phi(10_000, 1_229, 1).expect("phi failed"), 1);
}
