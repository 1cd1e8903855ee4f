use super::stats::TextStats;
use super::PatternTag;

/// Shortener hosts and giveaway-bait tokens that mark a link as a lure.
const SUSPICIOUS_URL_TOKENS: [&str; 13] = [
    "bit.ly",
    "tinyurl",
    "freegift",
    "claim-now",
    "bonus-ff",
    "get-prize",
    "win-prize",
    "free-money",
    "claim.now",
    "shopeepay",
    "dana-gratis",
    "ovo-gratis",
    "pulsa-gratis",
];

/// Lure keywords, Indonesian and English. Matched case-insensitively as
/// substrings of the whole message.
const PHISHING_KEYWORDS: [&str; 14] = [
    "menang",
    "hadiah",
    "gratis",
    "klaim",
    "bonus",
    "prize",
    "congratulation",
    "winner",
    "claim",
    "verify account",
    "suspended",
    "blocked",
    "urgent",
    "immediately",
];

/// One triggered detector: its score contribution, the human-readable
/// explanation, and the pattern tag it proposes for the verdict.
#[derive(Debug, Clone)]
pub struct Signal {
    pub points: u32,
    pub reason: String,
    pub tag: PatternTag,
}

/// Runs every extractor against the precomputed stats, in the fixed order
/// the tie-break rule depends on. Points and reasons are position-independent;
/// only the pattern resolution cares about this ordering.
pub fn run_all(stats: &TextStats) -> Vec<Signal> {
    let extractors: [fn(&TextStats) -> Option<Signal>; 8] = [
        excessive_length,
        unicode_heavy,
        invisible_chars,
        emoji_flood,
        char_repetition,
        suspicious_url,
        phishing_keywords,
        low_diversity,
    ];

    extractors.iter().filter_map(|f| f(stats)).collect()
}

fn excessive_length(stats: &TextStats) -> Option<Signal> {
    if stats.length > 300 {
        Some(Signal {
            points: 25,
            reason: format!("Very long message ({} chars)", stats.length),
            tag: PatternTag::LengthExcessive,
        })
    } else {
        None
    }
}

fn unicode_heavy(stats: &TextStats) -> Option<Signal> {
    let ratio = (stats.non_ascii_count as f32 / stats.length as f32) * 100.0;
    if ratio > 40.0 {
        Some(Signal {
            points: 30,
            reason: format!("High non-ASCII ratio ({ratio:.1}%)"),
            tag: PatternTag::UnicodeHeavy,
        })
    } else {
        None
    }
}

fn invisible_chars(stats: &TextStats) -> Option<Signal> {
    if stats.invisible_count > 5 {
        Some(Signal {
            points: 35,
            reason: format!("Contains invisible characters ({})", stats.invisible_count),
            tag: PatternTag::InvisibleChars,
        })
    } else {
        None
    }
}

fn emoji_flood(stats: &TextStats) -> Option<Signal> {
    if stats.symbol_count > 20 {
        Some(Signal {
            points: 20,
            reason: format!("Excessive emojis/symbols ({})", stats.symbol_count),
            tag: PatternTag::EmojiSpam,
        })
    } else {
        None
    }
}

fn char_repetition(stats: &TextStats) -> Option<Signal> {
    if stats.longest_run >= 11 {
        Some(Signal {
            points: 30,
            reason: "Repeating character pattern detected".to_string(),
            tag: PatternTag::CharRepetition,
        })
    } else {
        None
    }
}

fn suspicious_url(stats: &TextStats) -> Option<Signal> {
    let hit = stats.urls.iter().any(|url| {
        let url = url.to_lowercase();
        SUSPICIOUS_URL_TOKENS.iter().any(|token| url.contains(token))
    });
    if hit {
        Some(Signal {
            points: 40,
            reason: "Suspicious URL detected".to_string(),
            tag: PatternTag::PhishingUrl,
        })
    } else {
        None
    }
}

/// Keyword extractor with two outcomes: any keyword next to a URL is the
/// strong combo signal; three or more keywords with no URL is the weaker
/// keyword-only signal.
fn phishing_keywords(stats: &TextStats) -> Option<Signal> {
    let matched: Vec<&str> = PHISHING_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| stats.lower.contains(keyword))
        .collect();

    if !matched.is_empty() && !stats.urls.is_empty() {
        Some(Signal {
            points: 25,
            reason: format!(
                "Phishing keywords with URL: {}",
                matched[..matched.len().min(3)].join(", ")
            ),
            tag: PatternTag::PhishingCombo,
        })
    } else if matched.len() >= 3 {
        Some(Signal {
            points: 15,
            reason: "Multiple phishing keywords detected".to_string(),
            tag: PatternTag::PhishingKeywords,
        })
    } else {
        None
    }
}

fn low_diversity(stats: &TextStats) -> Option<Signal> {
    let ratio = (stats.distinct_chars as f32 / stats.length as f32) * 100.0;
    if stats.length > 100 && ratio < 10.0 {
        Some(Signal {
            points: 25,
            reason: format!("Low character diversity ({ratio:.1}%)"),
            tag: PatternTag::LowDiversity,
        })
    } else {
        None
    }
}
