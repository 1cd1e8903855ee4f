use serde::{Deserialize, Serialize};

/// Which codepoints count as "symbol/emoji" for the emoji-flood signal.
///
/// The two reference implementations disagreed on this (one matched the
/// Unicode symbol categories Sm/Sc/Sk/So, the other matched emoji
/// presentation), so the classification is pinned here as an explicit,
/// swappable policy instead of leaning on whatever Unicode tables the host
/// ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolPolicy {
    /// Approximates the Unicode symbol categories (Sm, Sc, Sk, So) with
    /// fixed codepoint ranges. This is the default and matches the behavior
    /// the rest of the scoring table was tuned against.
    GeneralCategories,
    /// Only pictographic emoji blocks. Stricter; plain math/currency
    /// symbols no longer count toward the flood signal.
    EmojiPictographic,
}

impl Default for SymbolPolicy {
    fn default() -> Self {
        SymbolPolicy::GeneralCategories
    }
}

impl SymbolPolicy {
    pub fn is_symbol(&self, c: char) -> bool {
        match self {
            SymbolPolicy::GeneralCategories => {
                in_general_symbol_ranges(c) || in_emoji_ranges(c)
            }
            SymbolPolicy::EmojiPictographic => in_emoji_ranges(c),
        }
    }
}

fn in_general_symbol_ranges(c: char) -> bool {
    matches!(c,
        // ASCII / Latin-1 symbol characters (Sm, Sc, Sk, So members)
        '$' | '+' | '<'..='>' | '^' | '`' | '|' | '~' |
        '\u{00A2}'..='\u{00A6}' |  // ¢ £ ¤ ¥ ¦
        '\u{00A8}' | '\u{00A9}' | '\u{00AC}' | '\u{00AE}' | '\u{00AF}' |
        '\u{00B0}' | '\u{00B1}' | '\u{00B4}' | '\u{00B8}' |
        '\u{00D7}' | '\u{00F7}' |
        // Currency Symbols: U+20A0–U+20CF
        '\u{20A0}'..='\u{20CF}' |
        // Letterlike Symbols: U+2100–U+214F
        '\u{2100}'..='\u{214F}' |
        // Arrows through Miscellaneous Symbols and Arrows:
        // U+2190–U+2BFF (arrows, math operators, technical, enclosed
        // alphanumerics, box drawing, geometric shapes, misc symbols,
        // dingbats, supplemental arrows/math)
        '\u{2190}'..='\u{2BFF}'
    )
}

fn in_emoji_ranges(c: char) -> bool {
    matches!(c,
        // Miscellaneous Symbols and Dingbats: U+2600–U+27BF
        '\u{2600}'..='\u{27BF}' |
        // Regional indicators (flag pairs): U+1F1E6–U+1F1FF
        '\u{1F1E6}'..='\u{1F1FF}' |
        // Mahjong/domino/cards through Symbols and Pictographs Extended-A:
        // U+1F000–U+1FAFF (pictographs, emoticons, transport, supplemental
        // symbols)
        '\u{1F000}'..='\u{1FAFF}'
    )
}
