use crate::store::ThreatRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const CSV_HEADER: &str =
    "ID,Timestamp,App Source,Sender ID,Message Snippet,Reason,Score,Hash,Is False Positive,Screenshot Path";

// All exported timestamps are rendered in UTC+7 (WIB) regardless of the
// host timezone, so the evidence reads the same everywhere.
const EXPORT_UTC_OFFSET_SECS: i32 = 7 * 3600;

pub fn format_timestamp(epoch_ms: i64) -> String {
    let offset = FixedOffset::east_opt(EXPORT_UTC_OFFSET_SECS).unwrap();
    let utc: DateTime<Utc> = Utc
        .timestamp_millis_opt(epoch_ms)
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap());
    utc.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn csv_escape(text: &str) -> String {
    text.replace('"', "\"\"")
}

/// Renders the full record set as CSV with the fixed column order above.
/// Text fields are double-quoted with internal quotes doubled; numeric and
/// boolean fields are bare.
pub fn render_csv(records: &[ThreatRecord]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for record in records {
        let line = format!(
            "{},\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",{},\"{}\",{},\"{}\"\n",
            record.id,
            format_timestamp(record.timestamp),
            csv_escape(&record.app_source),
            csv_escape(record.sender_id.as_deref().unwrap_or("Unknown")),
            csv_escape(&record.message_snippet),
            csv_escape(&record.reason),
            record.score,
            record.hash,
            record.is_false_positive,
            csv_escape(record.screenshot_path.as_deref().unwrap_or("")),
        );
        csv.push_str(&line);
    }

    csv
}

/// The fixed appeal letter bundled with every evidence export.
pub fn appeal_template(export_date: &str, threat_count: usize) -> String {
    format!(
        "To the Support Team,\n\
         \n\
         My account was blocked without warning. The attached evidence,\n\
         collected by the Chat Shield application running on my device,\n\
         shows that harmful messages (virtex floods, phishing lures, spam)\n\
         were sent TO this account by third parties.\n\
         \n\
         Please review the block on my account.\n\
         Thank you for your time and assistance.\n\
         \n\
         Sincerely,\n\
         (Account holder name)\n\
         (Account identifier)\n\
         \n\
         ---\n\
         \n\
         Evidence Details:\n\
         - Export Date: {export_date}\n\
         - Total Threats Detected: {threat_count}\n\
         \n\
         Files Included:\n\
         1. logs.csv - Complete threat log with metadata\n\
         2. readme_for_support.txt - This file\n\
         3. evidence/ - Screenshots (if available)\n\
         \n\
         Instructions:\n\
         1. Review logs.csv for complete details of each blocked message\n\
         2. Each entry carries the SHA-256 hash of the stored snippet\n\
         3. Screenshots provide visual proof of the harmful messages\n\
         \n\
         Disclaimer:\n\
         This evidence is provided solely for account appeal purposes.\n\
         All data was collected locally on the device. No offensive\n\
         actions were taken by this account.\n"
    )
}

/// Writes the evidence bundle: the CSV, the appeal letter, and every
/// screenshot that still exists on disk under an evidence/ prefix.
/// `stamp` is the caller-supplied timestamp used in the archive name.
pub fn write_evidence_bundle(
    dir: &Path,
    records: &[ThreatRecord],
    export_date: &str,
    stamp: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let bundle_path = dir.join(format!("ChatShield_Evidence_{stamp}.zip"));
    let file = File::create(&bundle_path)
        .with_context(|| format!("Failed to create archive: {}", bundle_path.display()))?;

    let mut archive = ZipWriter::new(file);
    let options: FileOptions = FileOptions::default();

    archive.start_file("logs.csv", options)?;
    archive.write_all(render_csv(records).as_bytes())?;

    archive.start_file("readme_for_support.txt", options)?;
    archive.write_all(appeal_template(export_date, records.len()).as_bytes())?;

    for record in records {
        let Some(path) = record.screenshot_path.as_deref() else {
            continue;
        };
        let screenshot = Path::new(path);
        if !screenshot.exists() {
            log::warn!("Screenshot missing, skipping: {path}");
            continue;
        }
        let name = screenshot
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("screenshot_{}.png", record.id));
        archive.start_file(format!("evidence/{name}"), options)?;
        let bytes = std::fs::read(screenshot)
            .with_context(|| format!("Failed to read screenshot: {path}"))?;
        archive.write_all(&bytes)?;
    }

    archive.finish()?;
    log::info!("Evidence bundle written to {}", bundle_path.display());
    Ok(bundle_path)
}
