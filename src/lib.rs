pub mod api;
pub mod config;
pub mod detector;
pub mod export;
pub mod shield;
pub mod store;

pub use config::Config;
pub use detector::{analyze, categorize, AnalysisResult, MessageAnalyzer, PatternTag, ThreatCategory};
pub use shield::{NotificationEvent, ShieldAction, ShieldEngine};
pub use store::{ThreatRecord, ThreatStore};
