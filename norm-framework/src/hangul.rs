//! Algorithmic Hangul syllable mapping.
//!
//! Hangul decomposition and composition are fully arithmetic (Unicode
//! chapter 3.12) and never appear in the property tables.

const S_BASE: u32 = 0xAC00;
const L_BASE: u32 = 0x1100;
const V_BASE: u32 = 0x1161;
const T_BASE: u32 = 0x11A7;
const L_COUNT: u32 = 19;
const V_COUNT: u32 = 21;
const T_COUNT: u32 = 28;
const N_COUNT: u32 = V_COUNT * T_COUNT;
const S_COUNT: u32 = L_COUNT * N_COUNT;

/// Whether `ch` is a precomposed Hangul syllable.
pub fn is_syllable(ch: char) -> bool {
    let cp = ch as u32;
    (S_BASE..S_BASE + S_COUNT).contains(&cp)
}

/// Whether `ch` is an LV syllable (can still take a trailing consonant).
pub fn is_lv_syllable(ch: char) -> bool {
    let cp = ch as u32;
    is_syllable(ch) && (cp - S_BASE) % T_COUNT == 0
}

/// Whether `ch` is a leading-consonant Jamo.
pub fn is_jamo_l(ch: char) -> bool {
    let cp = ch as u32;
    (L_BASE..L_BASE + L_COUNT).contains(&cp)
}

/// Whether `ch` is a vowel Jamo.
pub fn is_jamo_v(ch: char) -> bool {
    let cp = ch as u32;
    (V_BASE..V_BASE + V_COUNT).contains(&cp)
}

/// Whether `ch` is a trailing-consonant Jamo.
pub fn is_jamo_t(ch: char) -> bool {
    let cp = ch as u32;
    // T_BASE itself is a filler, not a valid trailing consonant.
    (T_BASE + 1..T_BASE + T_COUNT).contains(&cp)
}

/// Decomposes a precomposed syllable into (L, V, optional T).
pub fn decompose(ch: char) -> Option<(char, char, Option<char>)> {
    let cp = ch as u32;
    if !is_syllable(ch) {
        return None;
    }
    let index = cp - S_BASE;
    let l = char::from_u32(L_BASE + index / N_COUNT)?;
    let v = char::from_u32(V_BASE + (index % N_COUNT) / T_COUNT)?;
    let t_index = index % T_COUNT;
    let t = if t_index == 0 {
        None
    } else {
        Some(char::from_u32(T_BASE + t_index)?)
    };
    Some((l, v, t))
}

/// Composes L+V into an LV syllable, or LV+T into an LVT syllable.
pub fn compose(first: char, second: char) -> Option<char> {
    if is_jamo_l(first) && is_jamo_v(second) {
        let l_index = first as u32 - L_BASE;
        let v_index = second as u32 - V_BASE;
        return char::from_u32(S_BASE + (l_index * V_COUNT + v_index) * T_COUNT);
    }
    if is_lv_syllable(first) && is_jamo_t(second) {
        return char::from_u32(first as u32 + (second as u32 - T_BASE));
    }
    None
}
