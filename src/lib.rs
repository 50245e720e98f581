pub mod types;
pub mod error;
pub mod config;
pub mod slot;
pub mod resolver;
pub mod bracket;
pub mod builder;
pub mod topology;
pub mod codec;
pub mod snapshot;
pub mod session;

pub use error::BracketError;
pub use session::{rebuild, SaveCallback, Session, SessionError};
pub use snapshot::TopologyState;
pub use topology::Topology;
pub use types::{BracketData, BracketOptions};

use config::*;
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── Entry point ────────────────────────────────────────────────────────

pub fn run() -> Result<(), String> {
    load_env_file();

    // Initialize tracing with file output; stdout carries the bracket state
    let logs_dir = logs_dir();
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "bracket.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Bracket topology starting");
    log_env_warnings();

    let path = bracket_data_path();
    let data = load_bracket_data_from(&path)?;
    for issue in codec::validate(&data) {
        warn!("Stored bracket {}: {}", path.display(), issue);
    }

    let options = apply_env_defaults(BracketOptions::default());
    let session = Session::new(data, options).map_err(|e| e.to_string())?;
    let state = session.snapshot().map_err(|e| e.to_string())?;
    let payload = serde_json::to_string_pretty(&state).map_err(|e| e.to_string())?;
    println!("{payload}");

    if env_flag_true("BRACKET_NORMALIZE") {
        save_bracket_data_to(&path, session.data())?;
        let results = serde_json::to_string(&session.data().results).map_err(|e| e.to_string())?;
        append_save_log(&format!("normalized {}", path.display()), &results);
        info!("Wrote normalized bracket to {}", path.display());
    }
    Ok(())
}
