use sosu_kazoe::prime_pi_engine::{nth_prime, pi_with_threads};
use sosu_kazoe::verify::is_probable_prime;

/// 既知の n 番目の素数と一致することを確認する。
#[test]
fn nth_prime_matches_known_values() {
    let cases: &[(u64, u64)] = &[
        (1, 2),
        (2, 3),
        (3, 5),
        (4, 7),
        (10, 29),
        (100, 541),
        (1_000, 7_919),
        (10_000, 104_729),
        (1_000_000, 15_485_863),
    ];

    for &(n, expected) in cases {
        let p = nth_prime(n, 2).expect("nth_prime failed");
        assert_eq!(p, expected, "nth_prime({n}) should be {expected}, got {p}");
    }
}

/// n = 0 はドメインエラー。
#[test]
fn nth_prime_rejects_zero() {
    assert!(nth_prime(0, 1).is_err());
}

/// 逆 Riemann R の種の誤差が π(x) 側で補正される経路（π(guess) との歩行）を
/// 大きめの n で確認する。
#[test]
fn nth_prime_walk_path_matches_reference() {
    // p_{2·10^6} = 32452843（DIRECT_LIMIT を超えて walk 経路に入る）
    let p = nth_prime(2_000_000, 2).expect("nth_prime failed");
    assert_eq!(p, 32_452_843);
}

/// 往復: pi(nth_prime(n)) = n、および nth_prime が素数を返すこと。
#[test]
fn nth_prime_round_trips_with_pi() {
    for n in [1u64, 5, 25, 168, 100_000, 1_000_000] {
        let p = nth_prime(n, 2).expect("nth_prime failed");
        assert!(is_probable_prime(p), "nth_prime({n}) = {p} is not prime");
        let back = pi_with_threads(p, 2).expect("pi failed");
        assert_eq!(back, n, "pi(nth_prime({n})) should be {n}");
    }
}

/// 単調性: nth_prime(n) は厳密に増加する（最初の 1000 個で確認）。
#[test]
fn nth_prime_is_strictly_increasing() {
    let mut prev = 0u64;
    for n in 1..=1_000u64 {
        let p = nth_prime(n, 1).expect("nth_prime failed");
        assert!(p > prev, "nth_prime({n}) = {p} should exceed {prev}");
        prev = p;
    }
}
