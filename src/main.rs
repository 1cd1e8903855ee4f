use chat_shield::api;
use chat_shield::export;
use chat_shield::shield::{NotificationEvent, ShieldAction, ShieldEngine};
use chat_shield::store::ThreatStore;
use chat_shield::{analyze, Config};
use chrono::Utc;
use clap::{Arg, Command};
use log::LevelFilter;
use std::path::Path;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = Command::new("chat-shield")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Notification shield against virtex floods, phishing lures, and spam")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/chat-shield.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("analyze")
                .short('a')
                .long("analyze")
                .value_name("TEXT")
                .help("Classify one message and print the verdict")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("serve")
                .long("serve")
                .help("Start the dashboard REST API")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Show blocked-threat counters and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("export")
                .long("export")
                .value_name("DIR")
                .help("Write the evidence bundle (CSV, appeal letter, screenshots)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .help("Run sample notifications through the shield pipeline")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    if let Some(text) = matches.get_one::<String>("analyze") {
        analyze_text(text);
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    let store = match ThreatStore::open(&config.database_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error opening threat database: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("stats") {
        show_stats(&store);
        return;
    }

    if let Some(dir) = matches.get_one::<String>("export") {
        export_evidence(&store, dir);
        return;
    }

    if matches.get_flag("demo") {
        run_demo(&config, store);
        return;
    }

    if matches.get_flag("serve") {
        log::info!("Starting chat-shield...");
        if let Err(e) = api::serve(&config, store).await {
            log::error!("API server error: {e}");
            process::exit(1);
        }
        return;
    }

    eprintln!("Nothing to do. Try --serve, --analyze, --stats, --export or --demo.");
    process::exit(1);
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn analyze_text(text: &str) {
    let result = analyze(text);

    println!("🔍 Analysis result:");
    println!("   Score: {}/100", result.score);
    println!("   Pattern: {}", result.matched_pattern.as_str());
    println!("   Category: {}", result.category().as_str());
    if result.is_threat {
        println!("❌ Verdict: THREAT (notification would be suppressed)");
    } else {
        println!("✅ Verdict: clean (notification would be delivered)");
    }
    if !result.reasons.is_empty() {
        println!("   Reasons:");
        for reason in &result.reasons {
            println!("   - {reason}");
        }
    }
}

fn show_stats(store: &ThreatStore) {
    match store.counts() {
        Ok(counts) => {
            println!("🛡️  Blocked threats:");
            println!("   Total:           {}", counts.total);
            println!("   Virtex:          {}", counts.virtex);
            println!("   Phishing:        {}", counts.phishing);
            println!("   Spam:            {}", counts.spam);
            println!("   False positives: {}", counts.false_positives);
        }
        Err(e) => {
            eprintln!("Error reading statistics: {e}");
            process::exit(1);
        }
    }
}

fn export_evidence(store: &ThreatStore, dir: &str) {
    let records = match store.list_all() {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error reading threat log: {e}");
            process::exit(1);
        }
    };

    let now = Utc::now();
    let export_date = export::format_timestamp(now.timestamp_millis());
    let stamp = now.format("%Y%m%d_%H%M%S").to_string();

    match export::write_evidence_bundle(Path::new(dir), &records, &export_date, &stamp) {
        Ok(path) => println!("📦 Evidence bundle written to: {}", path.display()),
        Err(e) => {
            eprintln!("Error writing evidence bundle: {e}");
            process::exit(1);
        }
    }
}

fn run_demo(config: &Config, store: Arc<ThreatStore>) {
    let engine = ShieldEngine::new(config, store);

    let samples = [
        ("com.whatsapp", "Hey, are we still on for lunch tomorrow?"),
        (
            "com.whatsapp",
            "Selamat! Anda menang hadiah 10 juta! Klaim sekarang di https://bit.ly/claim-prize-now",
        ),
        ("org.telegram.messenger", "🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥🔥"),
        ("com.example.mail", "Your parcel is out for delivery"),
    ];

    println!("🧪 Running {} sample notifications...", samples.len());
    println!();

    for (app, text) in samples {
        let event = NotificationEvent {
            app_source: app.to_string(),
            sender_id: None,
            text: text.to_string(),
        };
        match engine.handle_notification(&event) {
            Ok(ShieldAction::Deliver) => {
                println!("✅ [{app}] delivered: {}", preview(text));
            }
            Ok(ShieldAction::Suppress { category, score, .. }) => {
                println!(
                    "❌ [{app}] suppressed as {} (score {score}): {}",
                    category.as_str(),
                    preview(text)
                );
            }
            Err(e) => {
                eprintln!("Error handling notification: {e}");
            }
        }
    }
}

fn preview(text: &str) -> String {
    let short: String = text.chars().take(40).collect();
    if short.len() < text.len() {
        format!("{short}...")
    } else {
        short
    }
}
