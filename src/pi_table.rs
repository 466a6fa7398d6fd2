//! 圧縮 PrimePi ルックアップテーブル。
//!
//! 2, 3, 5 で割り切れない数だけをビットで持ちます。各バイトの 8 ビットは
//! 剰余 { 1, 7, 11, 13, 17, 19, 23, 29 } (mod 30) に対応し、u64 1 語で
//! 30 × 8 = 240 の区間をカバーします。語ごとに「その区間より前の素数の累積数」
//! を併記する {count, bits} レコードなので、π(n) は
//! count + popcount(bits & 剰余マスク) の O(1) で引けます。
//!
//! n < 128·240 = 30720 はコンパイル時キャッシュで即答します。キャッシュより
//! 大きい範囲は 2 フェーズ並列（ビット敷設 → バリア → 接頭辞カウント）で
//! 初期化します。

use rayon::prelude::*;

use crate::primes::{sieve_segment, MOD30_TO_INDEX};
use crate::sieve_math::{ideal_num_threads, integer_sqrt, simple_sieve};

/// {count, bits}: count は語の区間より前の π、bits は区間内の素数ビット。
#[derive(Clone, Copy, Default)]
pub struct PiEntry {
    pub count: u64,
    pub bits: u64,
}

/// x < 6 の π(x)。剰余 1 のビットは素数ではないため、表引きの外で処理する。
const PI_TINY: [u64; 6] = [0, 0, 1, 2, 2, 3];

/// 剰余 r (mod 30) 以下に存在する候補剰余 {1,7,11,13,17,19,23,29} の個数。
const COUNT30: [u8; 30] = [
    0, 1, 1, 1, 1, 1, 1, 2, // 0-7
    2, 2, 2, 3, 3, 4, 4, 4, // 8-15
    4, 5, 5, 6, 6, 6, 6, 7, // 16-23
    7, 7, 7, 7, 7, 8, // 24-29
];

/// n < 128·240 用のコンパイル時キャッシュ。
///
/// 形式は {bit_count, bits}。bit_count は π(5) + それまでの 1 ビット数。
/// このテーブルは PiTable::init が埋める語列をそのまま書き出したものです。
#[rustfmt::skip]
const PI_CACHE: [PiEntry; 128] = [
    PiEntry { count:    3, bits: 0xF93DDBB67EEFDFFE }, PiEntry { count:   52, bits: 0x9EEDA6EAF31E4FD5 },
    PiEntry { count:   92, bits: 0xA559DD3BD3D30CE6 }, PiEntry { count:  128, bits: 0x56A61E78BD92676A },
    PiEntry { count:  162, bits: 0x554C2ADE2DADE356 }, PiEntry { count:  196, bits: 0xF8A154039FF0A3D9 },
    PiEntry { count:  228, bits: 0x3A13F666E944FD2E }, PiEntry { count:  263, bits: 0x54BF11453A2B4CB8 },
    PiEntry { count:  293, bits: 0x4F8CBCC8B37AC18C }, PiEntry { count:  325, bits: 0xEF17C19B71715821 },
    PiEntry { count:  357, bits: 0x468C83E5081A9654 }, PiEntry { count:  382, bits: 0x87588F9265AEFB72 },
    PiEntry { count:  417, bits: 0xA0E3266581D892D2 }, PiEntry { count:  444, bits: 0x99EB813C26C73811 },
    PiEntry { count:  473, bits: 0x4D33F3243E88518D }, PiEntry { count:  503, bits: 0x4C58B42AA71C8B5A },
    PiEntry { count:  532, bits: 0xC383DC8219F6264E }, PiEntry { count:  562, bits: 0x02CDCDB50238F12C },
    PiEntry { count:  590, bits: 0x307A4C570C944AB2 }, PiEntry { count:  617, bits: 0xF8246C44CBF10B43 },
    PiEntry { count:  646, bits: 0x8DEA735CA8950119 }, PiEntry { count:  675, bits: 0xC41E22A6502B9624 },
    PiEntry { count:  700, bits: 0x9C742F3AD40648D1 }, PiEntry { count:  729, bits: 0x2E1568BF88056A07 },
    PiEntry { count:  757, bits: 0x14089851B7E35560 }, PiEntry { count:  783, bits: 0x2770494D45AA5A86 },
    PiEntry { count:  811, bits: 0x618302ABCAD593D2 }, PiEntry { count:  840, bits: 0xADA9C22287CE2405 },
    PiEntry { count:  867, bits: 0xB01689D1784D8C18 }, PiEntry { count:  893, bits: 0x522434C0A262C757 },
    PiEntry { count:  919, bits: 0x4308218D32405AAE }, PiEntry { count:  942, bits: 0x60E119D9B6D2B634 },
    PiEntry { count:  973, bits: 0x947A44D060391A67 }, PiEntry { count: 1000, bits: 0x105574A88388099A },
    PiEntry { count: 1023, bits: 0x32C8231E685DA127 }, PiEntry { count: 1051, bits: 0x38B14873440319E0 },
    PiEntry { count: 1075, bits: 0x1CB59861572AE6C3 }, PiEntry { count: 1106, bits: 0x2902AC8F81C5680A },
    PiEntry { count: 1130, bits: 0x2E644E1194E3471A }, PiEntry { count: 1158, bits: 0x1006C514DC3DCB14 },
    PiEntry { count: 1184, bits: 0xE34730E982B129E9 }, PiEntry { count: 1214, bits: 0xB430300A25C31934 },
    PiEntry { count: 1237, bits: 0x4C8ED84446E5C16C }, PiEntry { count: 1265, bits: 0x818992787024225D },
    PiEntry { count: 1289, bits: 0xA508E9861B265682 }, PiEntry { count: 1315, bits: 0x104AC2B029C3D300 },
    PiEntry { count: 1337, bits: 0xC760421DA13859B2 }, PiEntry { count: 1364, bits: 0x8BC61A44C88C2722 },
    PiEntry { count: 1389, bits: 0x0931A610461A8182 }, PiEntry { count: 1409, bits: 0x15A9D8D2182F54F0 },
    PiEntry { count: 1438, bits: 0x91500EC0F60C2E06 }, PiEntry { count: 1462, bits: 0xC319653818C126CD },
    PiEntry { count: 1489, bits: 0x4A84D62D2A8B9356 }, PiEntry { count: 1518, bits: 0xC476E0092CA50A61 },
    PiEntry { count: 1543, bits: 0x1B6614E808D83C6A }, PiEntry { count: 1570, bits: 0x073110366302A4B0 },
    PiEntry { count: 1592, bits: 0xA08AC312424892D5 }, PiEntry { count: 1615, bits: 0x5C788582A4742D9F },
    PiEntry { count: 1645, bits: 0xE8021D1461B0180D }, PiEntry { count: 1667, bits: 0x30831C4901C11218 },
    PiEntry { count: 1686, bits: 0xF40C0FD888A13367 }, PiEntry { count: 1715, bits: 0xB1474266D7588898 },
    PiEntry { count: 1743, bits: 0x155941180896A816 }, PiEntry { count: 1765, bits: 0xA1AAB3E1522A44B5 },
    PiEntry { count: 1794, bits: 0x0CA5111855624559 }, PiEntry { count: 1818, bits: 0x0AD654BE00673CA3 },
    PiEntry { count: 1847, bits: 0x7E08150C826B3620 }, PiEntry { count: 1871, bits: 0x840A61D078019156 },
    PiEntry { count: 1893, bits: 0x50A0560E57012CA8 }, PiEntry { count: 1916, bits: 0x1063206C478C980B },
    PiEntry { count: 1939, bits: 0x750B88570CE409C4 }, PiEntry { count: 1965, bits: 0x022439C28252C20B },
    PiEntry { count: 1986, bits: 0xA3D629317A25562C }, PiEntry { count: 2016, bits: 0x328A0CB018B1E120 },
    PiEntry { count: 2038, bits: 0x3730ADC5093211C1 }, PiEntry { count: 2064, bits: 0x6B2520CF8291BC08 },
    PiEntry { count: 2090, bits: 0x076A4626448F309C }, PiEntry { count: 2116, bits: 0xC525021058098E49 },
    PiEntry { count: 2137, bits: 0x903C80A0805A42C4 }, PiEntry { count: 2156, bits: 0x0C518403E1146428 },
    PiEntry { count: 2176, bits: 0x7E47C008A48AA32E }, PiEntry { count: 2203, bits: 0x04002A54CD032BD3 },
    PiEntry { count: 2226, bits: 0xC1834C29426C92B3 }, PiEntry { count: 2252, bits: 0x38DB21462D1CCC92 },
    PiEntry { count: 2280, bits: 0xE0BB5812248C8459 }, PiEntry { count: 2305, bits: 0x912809C930700D06 },
    PiEntry { count: 2326, bits: 0xC280308CF9324441 }, PiEntry { count: 2348, bits: 0x1483817D0C62A472 },
    PiEntry { count: 2373, bits: 0x14780A82150EAAE1 }, PiEntry { count: 2397, bits: 0xB2F02E6F10089770 },
    PiEntry { count: 2425, bits: 0x866253324449301D }, PiEntry { count: 2449, bits: 0xD9364B110A844565 },
    PiEntry { count: 2475, bits: 0x197C9080613A698C }, PiEntry { count: 2500, bits: 0x2D050C8B409530C0 },
    PiEntry { count: 2521, bits: 0x1A8596B4A171C00E }, PiEntry { count: 2547, bits: 0xB7484C511415C016 },
    PiEntry { count: 2571, bits: 0xA1022E8A89109579 }, PiEntry { count: 2595, bits: 0x220891108190D51C },
    PiEntry { count: 2614, bits: 0x5C2033C078E91EB4 }, PiEntry { count: 2642, bits: 0x471023AAE20EC48B },
    PiEntry { count: 2668, bits: 0xA851A1197B5528E3 }, PiEntry { count: 2697, bits: 0x6061D12C82900406 },
    PiEntry { count: 2716, bits: 0x23548144410652A1 }, PiEntry { count: 2736, bits: 0x4872222704A91888 },
    PiEntry { count: 2757, bits: 0x29CA1712421C40B6 }, PiEntry { count: 2781, bits: 0x898452E13C015AA0 },
    PiEntry { count: 2804, bits: 0xD2692CF1064001DA }, PiEntry { count: 2829, bits: 0xC88A3421C1634248 },
    PiEntry { count: 2851, bits: 0x442E88092671216C }, PiEntry { count: 2874, bits: 0xD11286981D9228D5 },
    PiEntry { count: 2900, bits: 0x5014462046A0A352 }, PiEntry { count: 2920, bits: 0x8CA9445083DDDC83 },
    PiEntry { count: 2948, bits: 0x391B8914542E144D }, PiEntry { count: 2974, bits: 0x02808F2981148042 },
    PiEntry { count: 2991, bits: 0x0C05B08382963203 }, PiEntry { count: 3012, bits: 0x1AECD9F807885114 },
    PiEntry { count: 3040, bits: 0x230686435C314806 }, PiEntry { count: 3062, bits: 0xB2F000A50C4409B3 },
    PiEntry { count: 3085, bits: 0xB618C242E1CA0180 }, PiEntry { count: 3107, bits: 0x612C29522EC79B2C },
    PiEntry { count: 3136, bits: 0x5E80848B24268A1A }, PiEntry { count: 3159, bits: 0x2145352A53C10260 },
    PiEntry { count: 3181, bits: 0x04484AC5B842D152 }, PiEntry { count: 3204, bits: 0xC45009C161237016 },
    PiEntry { count: 3226, bits: 0x28221601D9188881 }, PiEntry { count: 3245, bits: 0x09532438EB84908C },
    PiEntry { count: 3269, bits: 0x30860982146A41A9 }, PiEntry { count: 3290, bits: 0x5A952B004238A29C },
];

const CACHE_LIMIT: u64 = PI_CACHE.len() as u64 * 240;

pub struct PiTable {
    max_x: u64,
    pi: Vec<PiEntry>,
}

impl PiTable {
    /// `[0, max_x]` をカバーする π テーブルを構築する。
    ///
    /// キャッシュ範囲を超える部分は 2 フェーズで並列初期化します:
    /// (a) 各スレッドが自分のチャンクを篩ってビットを立て、チャンク内素数を数える
    /// (b) バリア後、各語の count を「キャッシュ末尾 + 先行チャンク計 + チャンク内累積」で埋める
    pub fn new(max_x: u64, threads: usize) -> PiTable {
        let limit = max_x + 1;
        let words = (limit.div_ceil(240)) as usize;
        let mut pi = vec![PiEntry::default(); words];
        let n = PI_CACHE.len().min(words);
        pi[..n].copy_from_slice(&PI_CACHE[..n]);

        let mut table = PiTable { max_x, pi };
        if limit > CACHE_LIMIT {
            table.init(limit, threads);
        }
        table
    }

    pub fn max_x(&self) -> u64 {
        self.max_x
    }

    /// π(n)。契約: n <= max_x。
    #[inline]
    pub fn pi(&self, n: u64) -> u64 {
        debug_assert!(n <= self.max_x, "PiTable query {n} > max_x {}", self.max_x);
        if n < 6 {
            return PI_TINY[n as usize];
        }
        let entry = self.pi[(n / 240) as usize];
        let r = n % 240;
        let idx = (r / 30) * 8 + u64::from(COUNT30[(r % 30) as usize]);
        let mask = if idx >= 64 { u64::MAX } else { (1u64 << idx) - 1 };
        entry.count + (entry.bits & mask).count_ones() as u64
    }

    fn init(&mut self, limit: u64, threads: usize) {
        let dist = limit - CACHE_LIMIT;
        let thread_threshold: u64 = 10_000_000;
        let threads = ideal_num_threads(dist, threads, thread_threshold);
        let mut thread_dist = (dist / threads as u64).max(thread_threshold);
        thread_dist += 240 - thread_dist % 240;
        let words_per_thread = (thread_dist / 240) as usize;

        let base = simple_sieve(integer_sqrt(limit) + 1).unwrap_or_default();
        let cache_words = PI_CACHE.len();

        // フェーズ (a): チャンクごとにビットを立て、素数個数を返す
        let counts: Vec<u64> = self.pi[cache_words..]
            .par_chunks_mut(words_per_thread)
            .enumerate()
            .map(|(t, chunk)| {
                let low = CACHE_LIMIT + thread_dist * t as u64;
                let high = (low + thread_dist).min(limit);
                let mut count = 0u64;
                for entry in chunk.iter_mut() {
                    *entry = PiEntry::default();
                }
                if low < high {
                    for p in sieve_segment(low.max(7), high - 1, &base) {
                        let r = p % 240;
                        let bit = (r / 30) * 8 + u64::from(MOD30_TO_INDEX[(r % 30) as usize]);
                        chunk[((p - low) / 240) as usize].bits |= 1u64 << bit;
                        count += 1;
                    }
                }
                count
            })
            .collect();

        // フェーズ (b): 接頭辞カウントを決定的な順序で敷く
        let cache_last = PI_CACHE[PI_CACHE.len() - 1];
        let mut prefix = cache_last.count + cache_last.bits.count_ones() as u64;
        let mut prefixes = Vec::with_capacity(counts.len());
        for &c in &counts {
            prefixes.push(prefix);
            prefix += c;
        }

        self.pi[cache_words..]
            .par_chunks_mut(words_per_thread)
            .zip(prefixes.par_iter())
            .for_each(|(chunk, &start)| {
                let mut count = start;
                for entry in chunk.iter_mut() {
                    entry.count = count;
                    count += entry.bits.count_ones() as u64;
                }
            });
    }
}
