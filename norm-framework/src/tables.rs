//! Built-in property data.
//!
//! Static first-level decomposition and combining-class data for the
//! covered repertoire, with the composition-pair map and quick-check sets
//! derived from it once at first use. Code points outside the data behave
//! as inert starters, which matches the Unicode defaults for unlisted
//! code points. Hangul is algorithmic and deliberately absent.
//!
//! The module has the same read-only interface a fully generated UCD table
//! would have; swapping in complete data is a data change, not an engine
//! change.

use std::cmp::Ordering;
use std::sync::OnceLock;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::hangul;
use crate::properties::{Properties, PropertyOracle, QuickCheck};

/// Canonical combining classes as inclusive code point ranges. Everything
/// not listed has class 0.
static COMBINING_CLASSES: &[(u32, u32, u8)] = &[
    (0x0300, 0x0314, 230),
    (0x0315, 0x0315, 232),
    (0x0316, 0x0319, 220),
    (0x031A, 0x031A, 232),
    (0x031B, 0x031B, 216),
    (0x031C, 0x0320, 220),
    (0x0321, 0x0322, 202),
    (0x0323, 0x0326, 220),
    (0x0327, 0x0328, 202),
    (0x0329, 0x0333, 220),
    (0x0334, 0x0338, 1),
    (0x0339, 0x033C, 220),
    (0x033D, 0x0344, 230),
    (0x0345, 0x0345, 240),
    (0x0346, 0x0346, 230),
    (0x0347, 0x0349, 220),
    (0x034A, 0x034C, 230),
    (0x034D, 0x034E, 220),
    (0x0350, 0x0352, 230),
    (0x0353, 0x0356, 220),
    (0x0357, 0x0357, 230),
    (0x0358, 0x0358, 232),
    (0x0359, 0x035A, 220),
    (0x035B, 0x035B, 230),
    (0x035C, 0x035C, 233),
    (0x035D, 0x035E, 234),
    (0x035F, 0x035F, 233),
    (0x0360, 0x0361, 234),
    (0x0362, 0x0362, 233),
    (0x0363, 0x036F, 230),
    (0x0483, 0x0487, 230),
    (0x0610, 0x0617, 230),
    (0x064B, 0x064B, 27),
    (0x064C, 0x064C, 28),
    (0x064D, 0x064D, 29),
    (0x064E, 0x064E, 30),
    (0x064F, 0x064F, 31),
    (0x0650, 0x0650, 32),
    (0x0651, 0x0651, 33),
    (0x0652, 0x0652, 34),
    (0x0653, 0x0654, 230),
    (0x0655, 0x0656, 220),
    (0x093C, 0x093C, 7),
    (0x09BC, 0x09BC, 7),
    (0x0E38, 0x0E39, 103),
    (0x0E3A, 0x0E3A, 9),
    (0x20D0, 0x20D1, 230),
    (0x3099, 0x309A, 8),
    (0xFE20, 0xFE26, 230),
];

/// First-level canonical decompositions, sorted by code point.
static CANONICAL_DECOMPOSITIONS: &[(u32, &str)] = &[
    (0x00C0, "A\u{300}"),
    (0x00C1, "A\u{301}"),
    (0x00C2, "A\u{302}"),
    (0x00C3, "A\u{303}"),
    (0x00C4, "A\u{308}"),
    (0x00C5, "A\u{30A}"),
    (0x00C7, "C\u{327}"),
    (0x00C8, "E\u{300}"),
    (0x00C9, "E\u{301}"),
    (0x00CA, "E\u{302}"),
    (0x00CB, "E\u{308}"),
    (0x00CC, "I\u{300}"),
    (0x00CD, "I\u{301}"),
    (0x00CE, "I\u{302}"),
    (0x00CF, "I\u{308}"),
    (0x00D1, "N\u{303}"),
    (0x00D2, "O\u{300}"),
    (0x00D3, "O\u{301}"),
    (0x00D4, "O\u{302}"),
    (0x00D5, "O\u{303}"),
    (0x00D6, "O\u{308}"),
    (0x00D9, "U\u{300}"),
    (0x00DA, "U\u{301}"),
    (0x00DB, "U\u{302}"),
    (0x00DC, "U\u{308}"),
    (0x00DD, "Y\u{301}"),
    (0x00E0, "a\u{300}"),
    (0x00E1, "a\u{301}"),
    (0x00E2, "a\u{302}"),
    (0x00E3, "a\u{303}"),
    (0x00E4, "a\u{308}"),
    (0x00E5, "a\u{30A}"),
    (0x00E7, "c\u{327}"),
    (0x00E8, "e\u{300}"),
    (0x00E9, "e\u{301}"),
    (0x00EA, "e\u{302}"),
    (0x00EB, "e\u{308}"),
    (0x00EC, "i\u{300}"),
    (0x00ED, "i\u{301}"),
    (0x00EE, "i\u{302}"),
    (0x00EF, "i\u{308}"),
    (0x00F1, "n\u{303}"),
    (0x00F2, "o\u{300}"),
    (0x00F3, "o\u{301}"),
    (0x00F4, "o\u{302}"),
    (0x00F5, "o\u{303}"),
    (0x00F6, "o\u{308}"),
    (0x00F9, "u\u{300}"),
    (0x00FA, "u\u{301}"),
    (0x00FB, "u\u{302}"),
    (0x00FC, "u\u{308}"),
    (0x00FD, "y\u{301}"),
    (0x00FF, "y\u{308}"),
    (0x0100, "A\u{304}"),
    (0x0101, "a\u{304}"),
    (0x0102, "A\u{306}"),
    (0x0103, "a\u{306}"),
    (0x0104, "A\u{328}"),
    (0x0105, "a\u{328}"),
    (0x0106, "C\u{301}"),
    (0x0107, "c\u{301}"),
    (0x0108, "C\u{302}"),
    (0x0109, "c\u{302}"),
    (0x010A, "C\u{307}"),
    (0x010B, "c\u{307}"),
    (0x010C, "C\u{30C}"),
    (0x010D, "c\u{30C}"),
    (0x010E, "D\u{30C}"),
    (0x010F, "d\u{30C}"),
    (0x0112, "E\u{304}"),
    (0x0113, "e\u{304}"),
    (0x0114, "E\u{306}"),
    (0x0115, "e\u{306}"),
    (0x0116, "E\u{307}"),
    (0x0117, "e\u{307}"),
    (0x0118, "E\u{328}"),
    (0x0119, "e\u{328}"),
    (0x011A, "E\u{30C}"),
    (0x011B, "e\u{30C}"),
    (0x011C, "G\u{302}"),
    (0x011D, "g\u{302}"),
    (0x011E, "G\u{306}"),
    (0x011F, "g\u{306}"),
    (0x0120, "G\u{307}"),
    (0x0121, "g\u{307}"),
    (0x0122, "G\u{327}"),
    (0x0123, "g\u{327}"),
    (0x0124, "H\u{302}"),
    (0x0125, "h\u{302}"),
    (0x0128, "I\u{303}"),
    (0x0129, "i\u{303}"),
    (0x012A, "I\u{304}"),
    (0x012B, "i\u{304}"),
    (0x012C, "I\u{306}"),
    (0x012D, "i\u{306}"),
    (0x012E, "I\u{328}"),
    (0x012F, "i\u{328}"),
    (0x0130, "I\u{307}"),
    (0x0134, "J\u{302}"),
    (0x0135, "j\u{302}"),
    (0x0136, "K\u{327}"),
    (0x0137, "k\u{327}"),
    (0x0139, "L\u{301}"),
    (0x013A, "l\u{301}"),
    (0x013B, "L\u{327}"),
    (0x013C, "l\u{327}"),
    (0x013D, "L\u{30C}"),
    (0x013E, "l\u{30C}"),
    (0x0143, "N\u{301}"),
    (0x0144, "n\u{301}"),
    (0x0145, "N\u{327}"),
    (0x0146, "n\u{327}"),
    (0x0147, "N\u{30C}"),
    (0x0148, "n\u{30C}"),
    (0x014C, "O\u{304}"),
    (0x014D, "o\u{304}"),
    (0x014E, "O\u{306}"),
    (0x014F, "o\u{306}"),
    (0x0150, "O\u{30B}"),
    (0x0151, "o\u{30B}"),
    (0x0154, "R\u{301}"),
    (0x0155, "r\u{301}"),
    (0x0156, "R\u{327}"),
    (0x0157, "r\u{327}"),
    (0x0158, "R\u{30C}"),
    (0x0159, "r\u{30C}"),
    (0x015A, "S\u{301}"),
    (0x015B, "s\u{301}"),
    (0x015C, "S\u{302}"),
    (0x015D, "s\u{302}"),
    (0x015E, "S\u{327}"),
    (0x015F, "s\u{327}"),
    (0x0160, "S\u{30C}"),
    (0x0161, "s\u{30C}"),
    (0x0162, "T\u{327}"),
    (0x0163, "t\u{327}"),
    (0x0164, "T\u{30C}"),
    (0x0165, "t\u{30C}"),
    (0x0168, "U\u{303}"),
    (0x0169, "u\u{303}"),
    (0x016A, "U\u{304}"),
    (0x016B, "u\u{304}"),
    (0x016C, "U\u{306}"),
    (0x016D, "u\u{306}"),
    (0x016E, "U\u{30A}"),
    (0x016F, "u\u{30A}"),
    (0x0170, "U\u{30B}"),
    (0x0171, "u\u{30B}"),
    (0x0172, "U\u{328}"),
    (0x0173, "u\u{328}"),
    (0x0174, "W\u{302}"),
    (0x0175, "w\u{302}"),
    (0x0176, "Y\u{302}"),
    (0x0177, "y\u{302}"),
    (0x0178, "Y\u{308}"),
    (0x0179, "Z\u{301}"),
    (0x017A, "z\u{301}"),
    (0x017B, "Z\u{307}"),
    (0x017C, "z\u{307}"),
    (0x017D, "Z\u{30C}"),
    (0x017E, "z\u{30C}"),
    (0x0340, "\u{300}"),
    (0x0341, "\u{301}"),
    (0x0344, "\u{308}\u{301}"),
    (0x0386, "\u{391}\u{301}"),
    (0x0388, "\u{395}\u{301}"),
    (0x0389, "\u{397}\u{301}"),
    (0x038A, "\u{399}\u{301}"),
    (0x038C, "\u{39F}\u{301}"),
    (0x038E, "\u{3A5}\u{301}"),
    (0x038F, "\u{3A9}\u{301}"),
    (0x0390, "\u{3CA}\u{301}"),
    (0x03AC, "\u{3B1}\u{301}"),
    (0x03AD, "\u{3B5}\u{301}"),
    (0x03AE, "\u{3B7}\u{301}"),
    (0x03AF, "\u{3B9}\u{301}"),
    (0x03B0, "\u{3CB}\u{301}"),
    (0x03CA, "\u{3B9}\u{308}"),
    (0x03CB, "\u{3C5}\u{308}"),
    (0x03CC, "\u{3BF}\u{301}"),
    (0x03CD, "\u{3C5}\u{301}"),
    (0x03CE, "\u{3C9}\u{301}"),
    (0x0400, "\u{415}\u{300}"),
    (0x0401, "\u{415}\u{308}"),
    (0x0403, "\u{413}\u{301}"),
    (0x040C, "\u{41A}\u{301}"),
    (0x040D, "\u{418}\u{300}"),
    (0x040E, "\u{423}\u{306}"),
    (0x0419, "\u{418}\u{306}"),
    (0x0439, "\u{438}\u{306}"),
    (0x0450, "\u{435}\u{300}"),
    (0x0451, "\u{435}\u{308}"),
    (0x0453, "\u{433}\u{301}"),
    (0x045C, "\u{43A}\u{301}"),
    (0x045D, "\u{438}\u{300}"),
    (0x045E, "\u{443}\u{306}"),
    (0x0958, "\u{915}\u{93C}"),
    (0x095F, "\u{92F}\u{93C}"),
    (0x1E0C, "D\u{323}"),
    (0x1E0D, "d\u{323}"),
    (0x1EA0, "A\u{323}"),
    (0x1EA1, "a\u{323}"),
    (0x1EA4, "\u{C2}\u{301}"),
    (0x1EA5, "\u{E2}\u{301}"),
    (0x1EA6, "\u{C2}\u{300}"),
    (0x1EA7, "\u{E2}\u{300}"),
    (0x1EBE, "\u{CA}\u{301}"),
    (0x1EBF, "\u{EA}\u{301}"),
    (0x1EC0, "\u{CA}\u{300}"),
    (0x1EC1, "\u{EA}\u{300}"),
    (0x2126, "\u{3A9}"),
    (0x212A, "K"),
    (0x212B, "\u{C5}"),
    (0x304C, "\u{304B}\u{3099}"),
    (0x3052, "\u{3051}\u{3099}"),
    (0x3070, "\u{306F}\u{3099}"),
    (0x3071, "\u{306F}\u{309A}"),
    (0x30AC, "\u{30AB}\u{3099}"),
    (0x30D1, "\u{30CF}\u{309A}"),
    (0x30F4, "\u{30A6}\u{3099}"),
];

/// First-level compatibility decompositions, sorted by code point.
static COMPAT_DECOMPOSITIONS: &[(u32, &str)] = &[
    (0x00A0, " "),
    (0x00A8, " \u{308}"),
    (0x00AA, "a"),
    (0x00B2, "2"),
    (0x00B3, "3"),
    (0x00B4, " \u{301}"),
    (0x00B5, "\u{3BC}"),
    (0x00B9, "1"),
    (0x00BA, "o"),
    (0x00BC, "1\u{2044}4"),
    (0x00BD, "1\u{2044}2"),
    (0x00BE, "3\u{2044}4"),
    (0x0132, "IJ"),
    (0x0133, "ij"),
    (0x2460, "1"),
    (0xFB00, "ff"),
    (0xFB01, "fi"),
    (0xFB02, "fl"),
    (0xFF21, "A"),
    (0xFF41, "a"),
];

/// Composition exclusions within the covered repertoire, sorted.
static COMPOSITION_EXCLUSIONS: &[u32] = &[0x0340, 0x0341, 0x0958, 0x095F];

fn combining_class(cp: u32) -> u8 {
    let found = COMBINING_CLASSES.binary_search_by(|&(start, end, _)| {
        if end < cp {
            Ordering::Less
        } else if start > cp {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    });
    match found {
        Ok(i) => COMBINING_CLASSES[i].2,
        Err(_) => 0,
    }
}

fn find_decomposition(table: &'static [(u32, &'static str)], cp: u32) -> Option<&'static str> {
    table
        .binary_search_by_key(&cp, |&(code, _)| code)
        .ok()
        .map(|i| table[i].1)
}

fn is_excluded(cp: u32) -> bool {
    COMPOSITION_EXCLUSIONS.binary_search(&cp).is_ok()
}

/// The built-in [`PropertyOracle`], backed by the static tables above plus
/// maps derived from them at first use. Immutable after construction and
/// shared process-wide.
pub struct UnicodeTables {
    pairs: FxHashMap<(char, char), char>,
    combines_forward: FxHashSet<char>,
    combines_backward: FxHashSet<char>,
    /// Code points that can never appear in composed output: singleton
    /// decompositions, excluded composites and non-starter decompositions.
    composing_no: FxHashSet<char>,
}

static TABLES: OnceLock<UnicodeTables> = OnceLock::new();

impl UnicodeTables {
    /// The process-wide singleton, built on first use.
    pub fn get() -> &'static UnicodeTables {
        TABLES.get_or_init(UnicodeTables::build)
    }

    fn build() -> UnicodeTables {
        let mut pairs = FxHashMap::default();
        let mut combines_forward = FxHashSet::default();
        let mut combines_backward = FxHashSet::default();
        let mut composing_no = FxHashSet::default();

        for &(cp, decomposition) in CANONICAL_DECOMPOSITIONS {
            let composite = match char::from_u32(cp) {
                Some(ch) => ch,
                None => continue,
            };
            let mut chars = decomposition.chars();
            match (chars.next(), chars.next(), chars.next()) {
                (Some(_), None, _) => {
                    // Singletons are never reconstituted.
                    composing_no.insert(composite);
                }
                (Some(first), Some(second), None) => {
                    if combining_class(first as u32) != 0 {
                        // Non-starter decomposition: excluded from
                        // composition entirely.
                        composing_no.insert(composite);
                    } else {
                        // Pairings are recorded even for excluded
                        // composites; the engine checks the exclusion.
                        pairs.insert((first, second), composite);
                        if is_excluded(cp) {
                            composing_no.insert(composite);
                        } else {
                            combines_forward.insert(first);
                            combines_backward.insert(second);
                        }
                    }
                }
                _ => {
                    // Longer first-level decompositions do not occur in the
                    // canonical data.
                }
            }
        }

        UnicodeTables {
            pairs,
            combines_forward,
            combines_backward,
            composing_no,
        }
    }
}

impl PropertyOracle for UnicodeTables {
    fn properties(&self, ch: char) -> Properties {
        let size = ch.len_utf8() as u8;

        if hangul::is_syllable(ch) {
            let mut p = Properties::inert(size);
            p.quick_check = [
                QuickCheck::Yes, // NFC
                QuickCheck::No,  // NFD
                QuickCheck::Yes, // NFKC
                QuickCheck::No,  // NFKD
            ];
            p.combines_forward = hangul::is_lv_syllable(ch);
            return p;
        }
        if hangul::is_jamo_v(ch) || hangul::is_jamo_t(ch) {
            let mut p = Properties::inert(size);
            p.quick_check = [
                QuickCheck::Maybe,
                QuickCheck::Yes,
                QuickCheck::Maybe,
                QuickCheck::Yes,
            ];
            p.combines_backward = true;
            return p;
        }
        if hangul::is_jamo_l(ch) {
            let mut p = Properties::inert(size);
            p.combines_forward = true;
            return p;
        }

        let cp = ch as u32;
        let ccc = combining_class(cp);
        let canonical = find_decomposition(CANONICAL_DECOMPOSITIONS, cp);
        let compat = find_decomposition(COMPAT_DECOMPOSITIONS, cp);
        let combines_forward = self.combines_forward.contains(&ch);
        let combines_backward = self.combines_backward.contains(&ch);

        let composing_no = self.composing_no.contains(&ch);
        let qc_nfc = if composing_no {
            QuickCheck::No
        } else if combines_backward {
            QuickCheck::Maybe
        } else {
            QuickCheck::Yes
        };
        let qc_nfd = if canonical.is_some() {
            QuickCheck::No
        } else {
            QuickCheck::Yes
        };
        let qc_nfkc = if composing_no || compat.is_some() {
            QuickCheck::No
        } else if combines_backward {
            QuickCheck::Maybe
        } else {
            QuickCheck::Yes
        };
        let qc_nfkd = if canonical.is_some() || compat.is_some() {
            QuickCheck::No
        } else {
            QuickCheck::Yes
        };

        Properties {
            size,
            ccc,
            canonical,
            compat,
            quick_check: [qc_nfc, qc_nfd, qc_nfkc, qc_nfkd],
            combines_forward,
            combines_backward,
            illegal: false,
        }
    }

    fn compose_pair(&self, first: char, second: char) -> Option<char> {
        self.pairs.get(&(first, second)).copied()
    }

    fn is_composition_exclusion(&self, ch: char) -> bool {
        is_excluded(ch as u32)
    }
}
