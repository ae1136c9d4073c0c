//! Model-name canonicalization.
//!
//! `normalize` turns free text such as `"T-Cross 200 TSI Highline"` or
//! `"Citroën C4 Cactus"` into a comparable key (`"tcross200tsihighline"`,
//! `"citroenc4cactus"`). Output alphabet is `[a-z0-9]` only, so lookups are
//! insensitive to case, accents, spacing and punctuation.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize free text. `None` and empty input yield an empty string.
pub fn normalize(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let mut out = String::with_capacity(text.len());
    for ch in text.nfkd() {
        if ch.is_ascii() {
            if ch.is_ascii_alphanumeric() {
                out.push(ch.to_ascii_lowercase());
            }
            continue;
        }
        if is_combining_mark(ch) {
            continue;
        }
        if let Some(folded) = fold_letter(ch) {
            out.extend(folded.chars().filter(|c| c.is_ascii_alphanumeric()));
        }
    }
    out
}

/// ASCII replacements for letters that NFKD leaves intact.
fn fold_letter(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'ß' | 'ẞ' => "ss",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ø' | 'Ø' => "o",
        'ł' | 'Ł' => "l",
        'đ' | 'Đ' | 'ð' | 'Ð' => "d",
        'þ' | 'Þ' => "th",
        'ı' => "i",
        'ŀ' | 'Ŀ' => "l",
        'ħ' | 'Ħ' => "h",
        'ŧ' | 'Ŧ' => "t",
        'ŋ' | 'Ŋ' => "n",
        'ĸ' => "k",
        _ => return None,
    };
    Some(folded)
}
