//! Carebot binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Load the practitioner roster and start the periodic reload
//! 3. Build the chat orchestrator over the branch catalog and roster cache
//! 4. Answer questions read line by line from stdin, one JSON answer per line

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use carebot_chat::{AnswerEnvelope, BranchCatalog, ChatOrchestrator, PractitionerCache};
use carebot_core::config::CarebotConfig;
use carebot_core::types::load_roster;

use cli::CliArgs;

/// Reload the roster file on a fixed interval, keeping the previous snapshot
/// when a reload fails.
async fn roster_refresh_loop(orchestrator: Arc<ChatOrchestrator>, path: PathBuf, interval_secs: u64) {
    if interval_secs == 0 {
        tracing::info!("Roster refresh disabled");
        return;
    }

    tracing::info!(interval_secs, path = %path.display(), "Roster refresh loop started");

    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
    // The first tick completes immediately; the initial load already ran.
    interval.tick().await;

    loop {
        interval.tick().await;

        match orchestrator.reload_roster(&path) {
            Ok(generation) => tracing::debug!(generation, "Roster reloaded"),
            Err(e) => {
                tracing::warn!(error = %e, "Roster reload failed, keeping previous snapshot");
            }
        }
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Line-oriented front end: one question per line, one JSON answer per line.
async fn run_repl(orchestrator: Arc<ChatOrchestrator>) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_id = new_session_id();
    tracing::info!(session_id = %session_id, "Session started");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "/quit" => break,
            "/reset" => {
                let outcome = orchestrator.reset(&session_id)?;
                println!("{}", serde_json::to_string(&outcome)?);
                session_id = new_session_id();
                tracing::info!(session_id = %session_id, "Session started");
                continue;
            }
            _ => {}
        }

        match orchestrator.handle_question(&session_id, line) {
            Ok(answer) => {
                println!("{}", serde_json::to_string(&AnswerEnvelope::from(answer))?);
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Question rejected");
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing is up so its log level can apply;
    // a load failure is reported once logging is installed.
    let config_file = args.resolve_config_path();
    let loaded = CarebotConfig::load(&config_file);
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Tracing. Answers go to stdout, logs to stderr.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting carebot v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Err(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    // Roster.
    let roster_path = args.resolve_roster_path(&config.roster.path);
    let roster = match load_roster(&roster_path) {
        Ok(records) => PractitionerCache::with_records(records),
        Err(e) => {
            tracing::warn!(error = %e, "Initial roster load failed, starting with an empty roster");
            PractitionerCache::new()
        }
    };
    tracing::info!(practitioners = roster.len(), "Practitioner cache ready");

    let orchestrator = Arc::new(ChatOrchestrator::new(
        config.chat.clone(),
        Arc::new(BranchCatalog::default()),
        Arc::new(roster),
    ));

    // === Background tasks ===

    let refresh_orchestrator = Arc::clone(&orchestrator);
    let refresh_secs = config.roster.refresh_interval_secs;
    tokio::spawn(async move {
        roster_refresh_loop(refresh_orchestrator, roster_path, refresh_secs).await;
    });

    run_repl(orchestrator).await?;

    tracing::info!("Goodbye");
    Ok(())
}
