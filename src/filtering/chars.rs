//! Character classes used by the rule checks and the text cleaners.
use unic_ucd::GeneralCategory;
use unicode_script::{Script, UnicodeScript};

/// Han (CJK ideograph) character.
pub fn is_cjk(c: char) -> bool {
    c.script() == Script::Han
}

/// Neither a letter, a number, `_` nor whitespace.
pub fn is_symbol(c: char) -> bool {
    if c == '_' || c.is_whitespace() {
        return false;
    }
    let cat = GeneralCategory::of(c);
    !(cat.is_letter() || cat.is_number())
}

/// Emoji and pictographs.
pub fn is_pictograph(c: char) -> bool {
    matches!(c as u32,
        0x1F300..=0x1F5FF // symbols & pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport & map
        | 0x1F700..=0x1F77F // alchemical
        | 0x1F780..=0x1F7FF // geometric shapes extended
        | 0x1F800..=0x1F8FF // supplemental arrows-c
        | 0x1F900..=0x1F9FF // supplemental symbols & pictographs
        | 0x1FA00..=0x1FAFF // chess, symbols & pictographs extended-a
        | 0x1F1E6..=0x1F1FF // regional indicators
        | 0x2600..=0x26FF   // misc symbols
        | 0x2702..=0x27B0   // dingbats
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cjk() {
        assert!("中文字".chars().all(is_cjk));
        assert!(!"abc，。1".chars().any(is_cjk));
    }

    #[test]
    fn symbols() {
        assert!("!@#，。|".chars().all(is_symbol));
        assert!(!"a1_ 中\n٣".chars().any(is_symbol));
    }

    #[test]
    fn pictographs() {
        assert!("😀🚀🤖☀✈".chars().all(is_pictograph));
        assert!(!"a中，|".chars().any(is_pictograph));
    }
}
