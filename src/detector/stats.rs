use super::symbols::SymbolPolicy;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref URL_PATTERN: Regex =
        Regex::new(r"(?i)(https?://[\w.-]+|www\.[\w.-]+)").unwrap();
}

/// Zero-width and formatting characters used to pad virtex payloads.
pub const INVISIBLE_CHARS: [char; 10] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}',
    '\u{FEFF}', '\u{2060}', '\u{2061}', '\u{2062}', '\u{2063}',
];

/// Per-call statistics shared by the signal extractors.
///
/// All counts are in Unicode codepoints, never UTF-16 units or bytes, so
/// length/ratio/diversity stay correct for text outside the BMP.
#[derive(Debug, Clone)]
pub struct TextStats {
    pub length: usize,
    pub non_ascii_count: usize,
    pub invisible_count: usize,
    pub symbol_count: usize,
    pub longest_run: usize,
    pub urls: Vec<String>,
    pub distinct_chars: usize,
    pub lower: String,
}

impl TextStats {
    pub fn compute(text: &str, policy: SymbolPolicy) -> Self {
        let mut length = 0;
        let mut non_ascii_count = 0;
        let mut invisible_count = 0;
        let mut symbol_count = 0;
        let mut longest_run = 0;
        let mut current_run = 0;
        let mut previous: Option<char> = None;
        let mut seen: HashSet<char> = HashSet::new();

        for c in text.chars() {
            length += 1;
            if c as u32 > 127 {
                non_ascii_count += 1;
            }
            if INVISIBLE_CHARS.contains(&c) {
                invisible_count += 1;
            }
            if policy.is_symbol(c) {
                symbol_count += 1;
            }
            if previous == Some(c) {
                current_run += 1;
            } else {
                current_run = 1;
                previous = Some(c);
            }
            if current_run > longest_run {
                longest_run = current_run;
            }
            seen.insert(c);
        }

        let urls = URL_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();

        TextStats {
            length,
            non_ascii_count,
            invisible_count,
            symbol_count,
            longest_run,
            urls,
            distinct_chars: seen.len(),
            lower: text.to_lowercase(),
        }
    }
}
