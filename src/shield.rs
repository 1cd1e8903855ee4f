use crate::config::Config;
use crate::detector::{MessageAnalyzer, ThreatCategory};
use crate::store::{NewThreatRecord, ThreatStore};
use anyhow::Result;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// One inbound notification as delivered by the host platform's capture
/// layer (a notification-listener service or equivalent).
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub app_source: String,
    pub sender_id: Option<String>,
    pub text: String,
}

/// What the caller should do with the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShieldAction {
    /// Let the notification through: unmonitored app, shield disabled, or
    /// the message scored below the threat threshold.
    Deliver,
    /// Cancel the notification; a record of the verdict was persisted.
    Suppress {
        record_id: i64,
        category: ThreatCategory,
        score: u32,
    },
}

/// Wires the capture layer to the classification core and the store. The
/// analyzer itself stays pure; everything stateful (the enable flag, the
/// allow-list, persistence) lives out here.
pub struct ShieldEngine {
    analyzer: MessageAnalyzer,
    store: Arc<ThreatStore>,
    monitored_apps: Vec<String>,
    snippet_max_chars: usize,
}

impl ShieldEngine {
    pub fn new(config: &Config, store: Arc<ThreatStore>) -> Self {
        ShieldEngine {
            analyzer: MessageAnalyzer::new(config.score_threshold, config.symbol_policy),
            store,
            monitored_apps: config.monitored_apps.clone(),
            snippet_max_chars: config.snippet_max_chars,
        }
    }

    pub fn handle_notification(&self, event: &NotificationEvent) -> Result<ShieldAction> {
        if !self.monitored_apps.contains(&event.app_source) {
            log::debug!("Ignoring notification from unmonitored app: {}", event.app_source);
            return Ok(ShieldAction::Deliver);
        }

        if !self.store.shield_enabled()? {
            log::debug!("Shield disabled, delivering notification");
            return Ok(ShieldAction::Deliver);
        }

        let result = self.analyzer.analyze(&event.text);
        if !result.is_threat {
            return Ok(ShieldAction::Deliver);
        }

        let snippet = truncate_chars(&event.text, self.snippet_max_chars);
        let category = result.category();
        let record = NewThreatRecord {
            timestamp: Utc::now().timestamp_millis(),
            app_source: event.app_source.clone(),
            sender_id: event.sender_id.clone(),
            message_snippet: snippet.clone(),
            reason: category.as_str().to_string(),
            score: result.score,
            hash: sha256_hex(&snippet),
            screenshot_path: None,
        };
        let record_id = self.store.insert(&record)?;

        log::info!(
            "Suppressed {} notification from {} (score {}, pattern {}): {}",
            category.as_str(),
            event.app_source,
            result.score,
            result.matched_pattern.as_str(),
            result.reasons.join("; "),
        );

        Ok(ShieldAction::Suppress {
            record_id,
            category,
            score: result.score,
        })
    }
}

/// Truncates to at most `max` codepoints, matching how the snippet column
/// and its hash are defined.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

pub fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}
