use std::sync::atomic::AtomicBool;

use sosu_kazoe::prime_pi_engine::{pi_with_algorithm, Algorithm};

const ALGORITHMS: &[(Algorithm, &str)] = &[
    (Algorithm::Legendre, "legendre"),
    (Algorithm::Meissel, "meissel"),
    (Algorithm::Lehmer, "lehmer"),
    (Algorithm::Lmo, "lmo"),
    (Algorithm::DelegliseRivat, "deleglise-rivat"),
    (Algorithm::Gourdon, "gourdon"),
];

/// 実装している全アルゴリズムが同じ π(x) を返すことを確認する。
#[test]
fn all_algorithms_agree_with_reference_table() {
    let cases: &[(u64, u64)] = &[
        (0, 0),
        (1, 0),
        (2, 1),
        (10, 4),
        (1_000, 168),
        (100_000, 9_592),
        (10_000_000, 664_579),
    ];

    let stop = AtomicBool::new(false);
    for &(x, expected) in cases {
        for &(algo, name) in ALGORITHMS {
            let pi = pi_with_algorithm(x, 2, algo, &stop, false, None)
                .unwrap_or_else(|e| panic!("{name} failed for x = {x}: {e}"));
            assert_eq!(pi, expected, "{name}: pi({x}) should be {expected}, got {pi}");
        }
    }
}

/// 10 のべき以外の点でもアルゴリズム同士が一致することを確認する。
#[test]
fn all_algorithms_agree_at_odd_points() {
    let points: &[u64] = &[12_345, 99_991, 1_234_567, 33_550_336];

    let stop = AtomicBool::new(false);
    for &x in points {
        let reference = pi_with_algorithm(x, 2, Algorithm::Legendre, &stop, false, None)
            .expect("legendre failed");
        for &(algo, name) in &ALGORITHMS[1..] {
            let pi = pi_with_algorithm(x, 2, algo, &stop, false, None)
                .unwrap_or_else(|e| panic!("{name} failed for x = {x}: {e}"));
            assert_eq!(pi, reference, "{name}: pi({x}) disagrees with legendre");
        }
    }
}

/// LMO の逐次 5 段階が互いに同じ値を返すことを確認する。
#[test]
fn lmo_serial_variants_agree() {
    use sosu_kazoe::lmo::{pi_lmo1, pi_lmo2, pi_lmo3, pi_lmo4, pi_lmo5};

    let points: &[u64] = &[5, 99, 100, 101, 10_000, 1_000_003, 50_000_017];
    for &x in points {
        let v1 = pi_lmo1(x).expect("pi_lmo1 failed");
        let v2 = pi_lmo2(x).expect("pi_lmo2 failed");
        let v3 = pi_lmo3(x).expect("pi_lmo3 failed");
        let v4 = pi_lmo4(x).expect("pi_lmo4 failed");
        let v5 = pi_lmo5(x).expect("pi_lmo5 failed");
        assert_eq!(v1, v2, "pi_lmo2({x}) disagrees");
        assert_eq!(v1, v3, "pi_lmo3({x}) disagrees");
        assert_eq!(v1, v4, "pi_lmo4({x}) disagrees");
        assert_eq!(v1, v5, "pi_lmo5({x}) disagrees");
    }
}

/// FactorTable 経路（pi_lmo5 / Deléglise–Rivat 本経路）が
/// 1 億以上の x でも参照値と一致することを確認する。
#[test]
fn factor_table_paths_match_at_1e8() {
    use sosu_kazoe::deleglise_rivat::pi_deleglise_rivat;
    use sosu_kazoe::lmo::pi_lmo5;

    let x = 100_000_000u64;
    let expected = 5_761_455u64;
    assert_eq!(pi_lmo5(x).expect("pi_lmo5 failed"), expected);
    assert_eq!(
        pi_deleglise_rivat(x, 2).expect("pi_deleglise_rivat failed"),
        expected
    );
}
