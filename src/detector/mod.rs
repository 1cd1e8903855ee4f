pub mod signals;
pub mod stats;
pub mod symbols;

use serde::{Deserialize, Serialize};
use signals::Signal;
use stats::TextStats;
use symbols::SymbolPolicy;

/// Score at or above which a message is considered a threat.
pub const DEFAULT_SCORE_THRESHOLD: u32 = 50;

/// Which signal ultimately explains a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternTag {
    LengthExcessive,
    UnicodeHeavy,
    InvisibleChars,
    EmojiSpam,
    CharRepetition,
    PhishingUrl,
    PhishingCombo,
    PhishingKeywords,
    LowDiversity,
    Clean,
}

impl PatternTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::LengthExcessive => "LENGTH_EXCESSIVE",
            PatternTag::UnicodeHeavy => "UNICODE_HEAVY",
            PatternTag::InvisibleChars => "INVISIBLE_CHARS",
            PatternTag::EmojiSpam => "EMOJI_SPAM",
            PatternTag::CharRepetition => "CHAR_REPETITION",
            PatternTag::PhishingUrl => "PHISHING_URL",
            PatternTag::PhishingCombo => "PHISHING_COMBO",
            PatternTag::PhishingKeywords => "PHISHING_KEYWORDS",
            PatternTag::LowDiversity => "LOW_DIVERSITY",
            PatternTag::Clean => "CLEAN",
        }
    }

    /// Tags from the first six extractors always claim the verdict, each
    /// overwriting whatever came before it. The keyword and diversity tags
    /// only claim it when nothing else has.
    fn claims_verdict(&self) -> bool {
        !matches!(
            self,
            PatternTag::PhishingCombo | PatternTag::PhishingKeywords | PatternTag::LowDiversity
        )
    }
}

/// Coarse category derived from the pattern tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatCategory {
    Virtex,
    Phishing,
    Spam,
    Suspicious,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::Virtex => "virtex",
            ThreatCategory::Phishing => "phishing",
            ThreatCategory::Spam => "spam",
            ThreatCategory::Suspicious => "suspicious",
        }
    }
}

/// Verdict for one message. Created fresh per call, never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u32,
    pub is_threat: bool,
    pub reasons: Vec<String>,
    pub matched_pattern: PatternTag,
}

impl AnalysisResult {
    fn clean() -> Self {
        AnalysisResult {
            score: 0,
            is_threat: false,
            reasons: Vec::new(),
            matched_pattern: PatternTag::Clean,
        }
    }

    pub fn category(&self) -> ThreatCategory {
        categorize(self)
    }
}

/// Maps the pattern tag to a category. Depends on the tag only — callers
/// must gate on `is_threat` separately, since CLEAN also lands on
/// `Suspicious` here.
pub fn categorize(result: &AnalysisResult) -> ThreatCategory {
    match result.matched_pattern {
        PatternTag::PhishingUrl | PatternTag::PhishingCombo | PatternTag::PhishingKeywords => {
            ThreatCategory::Phishing
        }
        PatternTag::LengthExcessive
        | PatternTag::UnicodeHeavy
        | PatternTag::InvisibleChars
        | PatternTag::CharRepetition
        | PatternTag::LowDiversity => ThreatCategory::Virtex,
        PatternTag::EmojiSpam => ThreatCategory::Spam,
        PatternTag::Clean => ThreatCategory::Suspicious,
    }
}

/// Stateless message classifier. Pure function of its input: no I/O, no
/// shared state, safe to call concurrently from any thread.
#[derive(Debug, Clone, Copy)]
pub struct MessageAnalyzer {
    threshold: u32,
    symbol_policy: SymbolPolicy,
}

impl Default for MessageAnalyzer {
    fn default() -> Self {
        MessageAnalyzer {
            threshold: DEFAULT_SCORE_THRESHOLD,
            symbol_policy: SymbolPolicy::default(),
        }
    }
}

impl MessageAnalyzer {
    pub fn new(threshold: u32, symbol_policy: SymbolPolicy) -> Self {
        MessageAnalyzer {
            threshold,
            symbol_policy,
        }
    }

    pub fn analyze(&self, text: &str) -> AnalysisResult {
        if text.is_empty() {
            return AnalysisResult::clean();
        }

        let stats = TextStats::compute(text, self.symbol_policy);
        let triggered = signals::run_all(&stats);

        let score = triggered
            .iter()
            .map(|signal| signal.points)
            .sum::<u32>()
            .min(100);

        AnalysisResult {
            score,
            is_threat: score >= self.threshold,
            reasons: triggered.iter().map(|signal| signal.reason.clone()).collect(),
            matched_pattern: resolve_pattern(&triggered),
        }
    }
}

/// Analyzes with the default threshold and symbol policy.
pub fn analyze(text: &str) -> AnalysisResult {
    MessageAnalyzer::default().analyze(text)
}

/// Picks the tag that explains the verdict: the last triggered tag that
/// claims the verdict unconditionally, otherwise the first triggered tag
/// overall, otherwise CLEAN. Signals must be in extractor-evaluation order.
fn resolve_pattern(triggered: &[Signal]) -> PatternTag {
    let mut resolved = PatternTag::Clean;
    for signal in triggered {
        if signal.tag.claims_verdict() || resolved == PatternTag::Clean {
            resolved = signal.tag;
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message() {
        let result = analyze("");
        assert_eq!(result.score, 0);
        assert!(!result.is_threat);
        assert!(result.reasons.is_empty());
        assert_eq!(result.matched_pattern, PatternTag::Clean);
    }

    #[test]
    fn test_normal_message_is_clean() {
        let result = analyze("Hey, want to grab coffee later? There's a new place downtown.");
        assert_eq!(result.score, 0);
        assert!(!result.is_threat);
        assert!(result.reasons.is_empty());
        assert_eq!(result.matched_pattern, PatternTag::Clean);
    }

    #[test]
    fn test_repetition_alone_is_below_threshold() {
        // 34 repeated chars: only the repetition extractor fires
        let result = analyze(&"A".repeat(34));
        assert_eq!(result.score, 30);
        assert!(!result.is_threat);
        assert_eq!(result.matched_pattern, PatternTag::CharRepetition);
        assert_eq!(result.category(), ThreatCategory::Virtex);
        assert_eq!(result.reasons.len(), 1);
    }

    #[test]
    fn test_long_repeated_flood() {
        // 400 repeated chars: length (25) + repetition (30) + diversity (25)
        let result = analyze(&"A".repeat(400));
        assert_eq!(result.score, 80);
        assert!(result.is_threat);
        // Repetition is the last unconditional tag to fire; diversity is
        // conditional and cannot displace it
        assert_eq!(result.matched_pattern, PatternTag::CharRepetition);
        assert_eq!(result.category(), ThreatCategory::Virtex);
        assert_eq!(result.reasons.len(), 3);
    }

    #[test]
    fn test_phishing_lure_with_shortener() {
        let result = analyze(
            "Selamat! Anda menang hadiah besar! Klaim sekarang di https://bit.ly/claim-prize-now",
        );
        // Suspicious URL (40) + keyword/URL combo (25)
        assert!(result.score >= 65);
        assert!(result.is_threat);
        // The URL extractor writes unconditionally and beats the combo tag
        assert_eq!(result.matched_pattern, PatternTag::PhishingUrl);
        assert_eq!(result.category(), ThreatCategory::Phishing);
    }

    #[test]
    fn test_keyword_combo_without_suspicious_url() {
        let result = analyze("Congratulations winner! Verify account at https://example.com");
        assert_eq!(result.matched_pattern, PatternTag::PhishingCombo);
        assert_eq!(result.category(), ThreatCategory::Phishing);
    }

    #[test]
    fn test_keywords_only() {
        let result = analyze("URGENT! Your account is suspended. Act immediately to claim it.");
        assert_eq!(result.matched_pattern, PatternTag::PhishingKeywords);
        assert_eq!(result.score, 15);
        assert!(!result.is_threat);
    }

    #[test]
    fn test_emoji_flood_categorizes_as_spam() {
        // Alternating emojis: over the symbol bar but no long run, so the
        // emoji tag is the last unconditional writer to fire
        let result = analyze(&"🎉🔥".repeat(11));
        assert_eq!(result.matched_pattern, PatternTag::EmojiSpam);
        assert_eq!(result.category(), ThreatCategory::Spam);
    }

    #[test]
    fn test_emoji_virtex_scores_high() {
        let text = format!(
            "{}{}{}",
            "🔥".repeat(25),
            "⚡".repeat(25),
            "A".repeat(50),
        );
        let result = analyze(&text);
        // unicode-heavy + emoji flood + repetition at minimum
        assert!(result.is_threat);
        assert!(result.score > 70);
    }

    #[test]
    fn test_invisible_char_padding() {
        let result = analyze("Hello\u{200B}\u{200C}\u{200D}\u{200E}\u{200F}\u{FEFF}\u{2060}World");
        assert_eq!(result.matched_pattern, PatternTag::InvisibleChars);
        assert!(result.score > 0);
    }

    #[test]
    fn test_score_is_clamped_to_100() {
        // Length + unicode-heavy + invisible + emoji + repetition: 140 pre-clamp
        let text = format!(
            "{}{}{}",
            "🔥".repeat(150),
            "\u{200B}".repeat(10),
            "A".repeat(160),
        );
        let result = analyze(&text);
        assert_eq!(result.score, 100);
        assert!(result.is_threat);
    }

    #[test]
    fn test_threat_iff_score_at_least_threshold() {
        for text in [
            "",
            "hello there",
            &"A".repeat(34),
            &"A".repeat(400),
            "menang hadiah gratis https://bit.ly/x",
        ] {
            let result = analyze(text);
            assert_eq!(result.is_threat, result.score >= DEFAULT_SCORE_THRESHOLD);
            assert!(result.score <= 100);
            assert_eq!(result.matched_pattern == PatternTag::Clean, result.reasons.is_empty());
        }
    }

    #[test]
    fn test_custom_threshold() {
        let strict = MessageAnalyzer::new(25, Default::default());
        let result = strict.analyze(&"A".repeat(34));
        assert!(result.is_threat);
    }

    #[test]
    fn test_determinism() {
        let text = "menang hadiah! https://bit.ly/claim 🔥🔥🔥";
        assert_eq!(analyze(text), analyze(text));
    }

    #[test]
    fn test_reasons_follow_evaluation_order() {
        let result = analyze(&"A".repeat(400));
        assert_eq!(result.reasons[0], "Very long message (400 chars)");
        assert_eq!(result.reasons[1], "Repeating character pattern detected");
        assert!(result.reasons[2].starts_with("Low character diversity"));
    }

    #[test]
    fn test_categorize_depends_only_on_tag() {
        let mut result = analyze(&"A".repeat(34));
        assert_eq!(categorize(&result), ThreatCategory::Virtex);
        // Same tag, different score: same category
        result.score = 99;
        assert_eq!(categorize(&result), ThreatCategory::Virtex);
    }

    #[test]
    fn test_clean_maps_to_suspicious() {
        // The mapper does not encode "no threat"; callers gate on is_threat
        let result = analyze("");
        assert_eq!(categorize(&result), ThreatCategory::Suspicious);
    }

    #[test]
    fn test_monotonicity_when_appending_trigger() {
        let base = "menang hadiah gratis, klaim bonus sekarang juga ya";
        let before = analyze(base);
        let extended = format!("{base} https://bit.ly/claim-now");
        let after = analyze(&extended);
        assert!(after.score >= before.score);
    }

    #[test]
    fn test_tag_string_forms() {
        assert_eq!(PatternTag::LengthExcessive.as_str(), "LENGTH_EXCESSIVE");
        assert_eq!(PatternTag::Clean.as_str(), "CLEAN");
        assert_eq!(ThreatCategory::Virtex.as_str(), "virtex");
    }
}
