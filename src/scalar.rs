//! 64bit / 128bit のスカラ抽象。
//!
//! ホットパスのセグメント内演算は常に u64 で行い、x と x/n の割り算だけを
//! この trait で抽象化します。加減・比較・小さい除数での除算という最小の
//! 能力集合だけを要求し、継承や動的ディスパッチは使いません。

/// 部分和アキュムレータ（i64 または i128）。
///
/// 1 leaf の寄与 ±(φ + rank) は常に x/y 未満なので、64bit パスでは i64、
/// 128bit パスでは i128 で総和しても桁あふれしない。
pub trait Accum:
    Copy
    + Default
    + Send
    + Sync
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::AddAssign
    + std::ops::SubAssign
{
    fn from_i64(v: i64) -> Self;
    fn from_u64(v: u64) -> Self;
    fn from_i128(v: i128) -> Self;
    fn to_i128(self) -> i128;
    /// self · v（mu_sum × phi_total の合算で使用）。
    fn mul_i64(self, v: i64) -> Self;
}

impl Accum for i64 {
    #[inline]
    fn from_i64(v: i64) -> Self {
        v
    }
    #[inline]
    fn from_i128(v: i128) -> Self {
        debug_assert!(v >= i128::from(i64::MIN) && v <= i128::from(i64::MAX));
        v as i64
    }
    #[inline]
    fn from_u64(v: u64) -> Self {
        v as i64
    }
    #[inline]
    fn to_i128(self) -> i128 {
        i128::from(self)
    }
    #[inline]
    fn mul_i64(self, v: i64) -> Self {
        self * v
    }
}

impl Accum for i128 {
    #[inline]
    fn from_i64(v: i64) -> Self {
        i128::from(v)
    }
    #[inline]
    fn from_i128(v: i128) -> Self {
        v
    }
    #[inline]
    fn from_u64(v: u64) -> Self {
        i128::from(v)
    }
    #[inline]
    fn to_i128(self) -> i128 {
        self
    }
    #[inline]
    fn mul_i64(self, v: i64) -> Self {
        self * i128::from(v)
    }
}

/// π(x) 計算のスカラ型（u64 または u128）。
pub trait CountInt: Copy + Ord + Send + Sync {
    /// 部分和の型。
    type Acc: Accum;

    /// この型の π(x) 入力として受け付ける上限。
    ///
    /// u128 でも 10^21 で打ち切ります。easy leaf の π 表は √x をカバーする
    /// 必要があり、これを超えると表が現実的なメモリに収まりません。
    const MAX_X: u128;

    fn from_u64(v: u64) -> Self;
    fn from_u128(v: u128) -> Self;
    fn to_u128(self) -> u128;

    /// self / d。
    fn div_u64(self, d: u64) -> Self;

    /// self / (d1·d2) を u64 で返す。商が u64 に収まることは呼び出し側の契約
    /// （special leaf の引数 x/n は常に x/y 以下）。
    fn div2_to_u64(self, d1: u64, d2: u64) -> u64;

    /// 値が u64 に収まっている前提での変換。
    fn to_u64_exact(self) -> u64;
}

impl CountInt for u64 {
    type Acc = i64;
    // i64 アキュムレータが φ(x, c) ≤ x を安全に保持できる範囲まで
    const MAX_X: u128 = i64::MAX as u128;

    #[inline]
    fn from_u64(v: u64) -> Self {
        v
    }
    #[inline]
    fn from_u128(v: u128) -> Self {
        debug_assert!(v <= u128::from(u64::MAX));
        v as u64
    }
    #[inline]
    fn to_u128(self) -> u128 {
        u128::from(self)
    }
    #[inline]
    fn div_u64(self, d: u64) -> Self {
        self / d
    }
    #[inline]
    fn div2_to_u64(self, d1: u64, d2: u64) -> u64 {
        // d1·d2 は u64 を超え得るため u128 で割る
        (u128::from(self) / (u128::from(d1) * u128::from(d2))) as u64
    }
    #[inline]
    fn to_u64_exact(self) -> u64 {
        self
    }
}

impl CountInt for u128 {
    type Acc = i128;
    const MAX_X: u128 = 1_000_000_000_000_000_000_000; // 10^21

    #[inline]
    fn from_u64(v: u64) -> Self {
        u128::from(v)
    }
    #[inline]
    fn from_u128(v: u128) -> Self {
        v
    }
    #[inline]
    fn to_u128(self) -> u128 {
        self
    }
    #[inline]
    fn div_u64(self, d: u64) -> Self {
        self / u128::from(d)
    }
    #[inline]
    fn div2_to_u64(self, d1: u64, d2: u64) -> u64 {
        let q = self / (u128::from(d1) * u128::from(d2));
        debug_assert!(q <= u128::from(u64::MAX));
        q as u64
    }
    #[inline]
    fn to_u64_exact(self) -> u64 {
        debug_assert!(self <= u128::from(u64::MAX));
        self as u64
    }
}

/// u128 対応の整数平方根。
pub fn integer_sqrt_u128(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut r = (n as f64).sqrt() as u128;
    while r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|sq| sq <= n) {
        r += 1;
    }
    r
}

/// u128 対応の整数 3 乗根。
pub fn integer_cbrt_u128(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut r = (n as f64).cbrt() as u128;
    while r.checked_mul(r).and_then(|s| s.checked_mul(r)).map_or(true, |c| c > n) {
        r -= 1;
    }
    loop {
        let next = r + 1;
        match next.checked_mul(next).and_then(|s| s.checked_mul(next)) {
            Some(c) if c <= n => r = next,
            _ => break,
        }
    }
    r
}
