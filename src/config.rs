use crate::detector::symbols::SymbolPolicy;
use crate::detector::DEFAULT_SCORE_THRESHOLD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Score at or above which a notification is suppressed.
    pub score_threshold: u32,
    pub database_path: String,
    pub listen_addr: String,
    /// Package identifiers of the chat applications the shield watches.
    pub monitored_apps: Vec<String>,
    /// Stored snippets (and their hashes) are capped at this many codepoints.
    pub snippet_max_chars: usize,
    pub symbol_policy: SymbolPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            database_path: "chat-shield.db".to_string(),
            listen_addr: "127.0.0.1:5000".to_string(),
            monitored_apps: vec![
                "com.whatsapp".to_string(),
                "org.telegram.messenger".to_string(),
                "com.facebook.orca".to_string(),
                "com.instagram.android".to_string(),
                "com.twitter.android".to_string(),
            ],
            snippet_max_chars: 250,
            symbol_policy: SymbolPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
