//! Riemann R 関数とその逆関数。
//!
//! R(x) は π(x) の非常に精度の高い近似で、nth prime 探索の初期推定にだけ
//! 使われます。あくまで「種」であり、正確な π(x) が必ず補正します。
//! 計算は Gram 級数:
//!
//!   R(x) = 1 + Σ_{k=1}^{∞} ln(x)^k / (ζ(k+1) · k · k!)
//!
//! ζ の値は事前計算テーブル。f64 精度なので x ~ 10^12 程度までが
//! 近似として信頼できる範囲だが、それ以上でも探索の種としては十分。

/// ζ(k) (k = 0..127) の事前計算値。
/// R(x) とその導関数の計算に使う。
#[rustfmt::skip]
const ZETA: [f64; 128] = [
    -0.500000000000000000000000000000000000000,
    f64::INFINITY,
    1.644934066848226436472415166646025189219,
    1.202056903159594285399738161511449990765,
    1.082323233711138191516003696541167902775,
    1.036927755143369926331365486457034168057,
    1.017343061984449139714517929790920527902,
    1.008349277381922826839797549849796759600,
    1.004077356197944339378685238508652465259,
    1.002008392826082214417852769232412060486,
    1.000994575127818085337145958900319017006,
    1.000494188604119464558702282526469936469,
    1.000246086553308048298637998047739670960,
    1.000122713347578489146751836526357395714,
    1.000061248135058704829258545105135333747,
    1.000030588236307020493551728510645062588,
    1.000015282259408651871732571487636722023,
    1.000007637197637899762273600293563029213,
    1.000003817293264999839856461644621939730,
    1.000001908212716553938925656957795101353,
    1.000000953962033872796113152038683449346,
    1.000000476932986787806463116719604373046,
    1.000000238450502727732990003648186752995,
    1.000000119219925965311073067788718882326,
    1.000000059608189051259479612440207935801,
    1.000000029803503514652280186063705069366,
    1.000000014901554828365041234658506630699,
    1.000000007450711789835429491981004170604,
    1.000000003725334024788457054819204018402,
    1.000000001862659723513049006403909945417,
    1.000000000931327432419668182871764735021,
    1.000000000465662906503378407298923325122,
    1.000000000232831183367650549200145597594,
    1.000000000116415501727005197759297383546,
    1.000000000058207720879027008892436859891,
    1.000000000029103850444970996869294252279,
    1.000000000014551921891041984235929632245,
    1.000000000007275959835057481014520869012,
    1.000000000003637979547378651190237236356,
    1.000000000001818989650307065947584832101,
    1.000000000000909494784026388928253311839,
    1.000000000000454747378304215402679911203,
    1.000000000000227373684582465251522682158,
    1.000000000000113686840768022784934910484,
    1.000000000000056843419876275856092771830,
    1.000000000000028421709768893018554550737,
    1.000000000000014210854828031606769834307,
    1.000000000000007105427395210852712877354,
    1.000000000000003552713691337113673298470,
    1.000000000000001776356843579120327473349,
    1.000000000000000888178421093081590309609,
    1.000000000000000444089210314381336419777,
    1.000000000000000222044605079804198399932,
    1.000000000000000111022302514106613372054,
    1.000000000000000055511151248454812437237,
    1.000000000000000027755575621361241725816,
    1.000000000000000013877787809725232762839,
    1.000000000000000006938893904544153697446,
    1.000000000000000003469446952165922624744,
    1.000000000000000001734723476047576572049,
    1.000000000000000000867361738011993372834,
    1.000000000000000000433680869002065048750,
    1.000000000000000000216840434499721978501,
    1.000000000000000000108420217249424140630,
    1.000000000000000000054210108624566454109,
    1.000000000000000000027105054312234688320,
    1.000000000000000000013552527156101164581,
    1.000000000000000000006776263578045189098,
    1.000000000000000000003388131789020796818,
    1.000000000000000000001694065894509799165,
    1.000000000000000000000847032947254699835,
    1.000000000000000000000423516473627283335,
    1.000000000000000000000211758236813619473,
    1.000000000000000000000105879118406802339,
    1.000000000000000000000052939559203398703,
    1.000000000000000000000026469779601698530,
    1.000000000000000000000013234889800848991,
    1.000000000000000000000006617444900424404,
    1.000000000000000000000003308722450212172,
    1.000000000000000000000001654361225106076,
    1.000000000000000000000000827180612553034,
    1.000000000000000000000000413590306276516,
    1.000000000000000000000000206795153138258,
    1.000000000000000000000000103397576569129,
    1.000000000000000000000000051698788284564,
    1.000000000000000000000000025849394142282,
    1.000000000000000000000000012924697071141,
    1.000000000000000000000000006462348535571,
    1.000000000000000000000000003231174267785,
    1.000000000000000000000000001615587133893,
    1.000000000000000000000000000807793566946,
    1.000000000000000000000000000403896783473,
    1.000000000000000000000000000201948391737,
    1.000000000000000000000000000100974195868,
    1.000000000000000000000000000050487097934,
    1.000000000000000000000000000025243548967,
    1.000000000000000000000000000012621774484,
    1.000000000000000000000000000006310887242,
    1.000000000000000000000000000003155443621,
    1.000000000000000000000000000001577721810,
    1.000000000000000000000000000000788860905,
    1.000000000000000000000000000000394430453,
    1.000000000000000000000000000000197215226,
    1.000000000000000000000000000000098607613,
    1.000000000000000000000000000000049303807,
    1.000000000000000000000000000000024651903,
    1.000000000000000000000000000000012325952,
    1.000000000000000000000000000000006162976,
    1.000000000000000000000000000000003081488,
    1.000000000000000000000000000000001540744,
    1.000000000000000000000000000000000770372,
    1.000000000000000000000000000000000385186,
    1.000000000000000000000000000000000192593,
    1.000000000000000000000000000000000096296,
    1.000000000000000000000000000000000048148,
    1.000000000000000000000000000000000024074,
    1.000000000000000000000000000000000012037,
    1.000000000000000000000000000000000006019,
    1.000000000000000000000000000000000003009,
    1.000000000000000000000000000000000001505,
    1.000000000000000000000000000000000000752,
    1.000000000000000000000000000000000000376,
    1.000000000000000000000000000000000000188,
    1.000000000000000000000000000000000000094,
    1.000000000000000000000000000000000000047,
    1.000000000000000000000000000000000000024,
    1.000000000000000000000000000000000000012,
    1.000000000000000000000000000000000000006,
];

/// Cesàro の公式による nth prime の初期近似。
fn initial_nth_prime_approx(x: f64) -> f64 {
    if x < 1.0 {
        return 0.0;
    } else if x < 2.0 {
        return 2.0;
    } else if x < 3.0 {
        return 3.0;
    }

    let logx = x.ln();
    let loglogx = logx.ln();
    let mut t = logx + loglogx / 2.0;

    if x > 1600.0 {
        t += loglogx / 2.0 - 1.0 + (loglogx - 2.0) / logx;
    }
    if x > 1_200_000.0 {
        t -= (loglogx * loglogx - 6.0 * loglogx + 11.0) / (2.0 * logx * logx);
    }

    x * t
}

/// Riemann R 関数（Gram 級数）。
pub fn riemann_r(x: f64) -> f64 {
    if x < 0.1 {
        return 0.0;
    }

    let epsilon = f64::EPSILON;
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let logx = x.ln();

    // 収束しない環境対策として反復回数に上限を置く
    for k in 1u32..1000 {
        term *= logx / k as f64;
        let old_sum = sum;

        if (k + 1) < ZETA.len() as u32 {
            sum += term / (ZETA[(k + 1) as usize] * k as f64);
        } else {
            // k >= 127 では ζ(k+1) ≈ 1
            sum += term / k as f64;
        }

        if (sum - old_sum).abs() <= epsilon {
            break;
        }
    }

    sum
}

/// 逆 Riemann R 関数。nth prime の精度の高い近似。
///
/// f(t) = R(t) − x の零点を Newton 法で求める。R(t) ~ li(t) より
/// f'(t) ~ 1/ln(t) なので、補正項は (R(t) − x)·ln(t)。
pub fn riemann_r_inverse(x: f64) -> f64 {
    let mut t = initial_nth_prime_approx(x);
    let mut old_term = f64::INFINITY;

    if x < 3.0 {
        return t;
    }

    for _ in 0..100 {
        let term = (riemann_r(t) - x) * t.ln();

        // これ以上収束しない
        if term.abs() >= old_term.abs() {
            break;
        }

        t -= term;
        old_term = term;
    }

    t
}

/// R(x) を整数に丸めて返す。
pub fn riemann_r_u64(x: u64) -> u64 {
    riemann_r(x as f64) as u64
}

/// R^{-1}(n)。u64 に収まらない場合は飽和させる（呼び出し側で域エラーにする）。
pub fn riemann_r_inverse_u64(n: u64) -> u64 {
    let res = riemann_r_inverse(n as f64);
    if res >= u64::MAX as f64 {
        u64::MAX
    } else {
        res as u64
    }
}
