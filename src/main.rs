use std::sync::atomic::AtomicBool;

use sosu_kazoe::config::load_or_create_config;
use sosu_kazoe::engine_types::PrimeResult;
use sosu_kazoe::prime_pi_engine::{self, Algorithm};
use sosu_kazoe::verify::{cross_check_pi, is_probable_prime};

fn main() {
    env_logger::init();
    std::process::exit(run());
}

enum Mode {
    Pi,
    NthPrime,
    Phi(u64),
}

/// CLI 本体。成功時 0、引数・ドメインエラー時 1 を返す。
///
/// 対応例:
///   sosu-kazoe 10^14
///   sosu-kazoe --nth-prime 1000000
///   sosu-kazoe --lmo --threads 4 --status 10^12
///   sosu-kazoe --phi 7 10^9
fn run() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return 1;
    }

    let mut x_str: Option<String> = None;
    let mut threads: Option<usize> = None;
    let mut alpha: Option<f64> = None;
    let mut algorithm = Algorithm::Gourdon;
    let mut mode = Mode::Pi;
    let mut status = false;
    let mut verify = false;

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return 0;
            }
            "--version" | "-v" => {
                println!("sosu-kazoe {}", prime_pi_engine::version());
                return 0;
            }
            "--threads" | "-t" => {
                let Some(v) = iter.next() else {
                    eprintln!("--threads requires a value");
                    return 1;
                };
                match v.parse::<usize>() {
                    Ok(n) if n >= 1 => threads = Some(n),
                    _ => {
                        eprintln!("Invalid thread count: {v}");
                        return 1;
                    }
                }
            }
            "--alpha" | "-a" => {
                let Some(v) = iter.next() else {
                    eprintln!("--alpha requires a value");
                    return 1;
                };
                match v.parse::<f64>() {
                    Ok(a) if a.is_finite() && a >= 1.0 => alpha = Some(a),
                    _ => {
                        eprintln!("Invalid alpha (must be >= 1): {v}");
                        return 1;
                    }
                }
            }
            "--legendre" => algorithm = Algorithm::Legendre,
            "--meissel" => algorithm = Algorithm::Meissel,
            "--lehmer" => algorithm = Algorithm::Lehmer,
            "--lmo" => algorithm = Algorithm::Lmo,
            "--deleglise-rivat" | "-d" => algorithm = Algorithm::DelegliseRivat,
            "--gourdon" | "-g" => algorithm = Algorithm::Gourdon,
            "--nth-prime" | "-n" => mode = Mode::NthPrime,
            "--phi" => {
                let Some(v) = iter.next() else {
                    eprintln!("--phi requires the argument a");
                    return 1;
                };
                match v.parse::<u64>() {
                    Ok(a) => mode = Mode::Phi(a),
                    Err(e) => {
                        eprintln!("Invalid a for --phi: {v} ({e})");
                        return 1;
                    }
                }
            }
            "--status" | "-s" => status = true,
            "--verify" => verify = true,
            other => {
                if other.starts_with('-') {
                    eprintln!("Unknown option: {other}");
                    return 1;
                }
                if x_str.is_some() {
                    eprintln!("Multiple numbers given: {other}");
                    return 1;
                }
                x_str = Some(other.to_string());
            }
        }
    }

    let Some(x_str) = x_str else {
        eprintln!("Missing number argument");
        print_usage();
        return 1;
    };
    let x = match parse_number(&x_str) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("Invalid number {x_str}: {e}");
            return 1;
        }
    };

    // settings.toml の既定値を読み、CLI 指定があれば上書きする。
    // 設定ファイルが壊れている場合は既定値で続行する（計算は止めない）
    let cfg = load_or_create_config().unwrap_or_else(|e| {
        log::warn!("Failed to load settings.toml: {e}");
        Default::default()
    });
    let threads = threads
        .or_else(|| {
            std::env::var("SOSU_KAZOE_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
        })
        .unwrap_or(cfg.threads);
    let alpha = alpha.or_else(|| cfg.alpha_override());
    let status = status || cfg.status;

    match execute(x, threads, alpha, algorithm, mode, status, verify) {
        Ok(result) => {
            println!("{result}");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn execute(
    x: u64,
    threads: usize,
    alpha: Option<f64>,
    algorithm: Algorithm,
    mode: Mode,
    status: bool,
    verify: bool,
) -> PrimeResult<u64> {
    let stop = AtomicBool::new(false);
    match mode {
        Mode::Pi => {
            let result = prime_pi_engine::pi_with_algorithm(x, threads, algorithm, &stop, status, alpha)?;
            if verify {
                cross_check_pi(x, result, threads)?;
                log::info!("verification passed: pi({x}) = {result}");
            }
            Ok(result)
        }
        Mode::NthPrime => {
            let p = prime_pi_engine::nth_prime(x, threads)?;
            if verify {
                if !is_probable_prime(p) {
                    return Err(format!("verification failed: {p} is not prime").into());
                }
                let back = prime_pi_engine::pi_with_threads(p, threads)?;
                if back != x {
                    return Err(format!(
                        "verification failed: pi(nth_prime({x})) = {back}"
                    )
                    .into());
                }
                log::info!("verification passed: nth_prime({x}) = {p}");
            }
            Ok(p)
        }
        Mode::Phi(a) => prime_pi_engine::phi(x, a, threads),
    }
}

/// 10 進数または `10^k` 形式を u64 として読む。
fn parse_number(s: &str) -> PrimeResult<u64> {
    if let Some(exp) = s.strip_prefix("10^") {
        let k: u32 = exp
            .parse()
            .map_err(|e| format!("invalid exponent ({e})"))?;
        return 10u64
            .checked_pow(k)
            .ok_or_else(|| format!("10^{k} exceeds the 64-bit range").into());
    }
    s.parse::<u64>().map_err(|e| e.to_string().into())
}

fn print_usage() {
    eprintln!("Usage: sosu-kazoe [OPTIONS] <x>");
    eprintln!();
    eprintln!("Count the primes <= x (decimal or 10^k shorthand).");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -g, --gourdon           Gourdon variant (default)");
    eprintln!("  -d, --deleglise-rivat   Deleglise-Rivat variant");
    eprintln!("      --lmo               parallel Lagarias-Miller-Odlyzko");
    eprintln!("      --legendre          Legendre's formula");
    eprintln!("      --meissel           Meissel's formula");
    eprintln!("      --lehmer            Lehmer's formula");
    eprintln!("  -n, --nth-prime         interpret x as n and print the nth prime");
    eprintln!("      --phi <a>           print phi(x, a)");
    eprintln!("  -t, --threads <n>       worker thread count");
    eprintln!("  -a, --alpha <a>         tuning factor y = a * x^(1/3)");
    eprintln!("  -s, --status            print progress between waves");
    eprintln!("      --verify            re-check the result with a second algorithm");
    eprintln!("  -v, --version           print version");
    eprintln!("  -h, --help              this help");
}
