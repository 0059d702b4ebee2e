//! ildrisk: ILD grade prediction terminal application
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ildrisk::adapters::sanitize::SanitizingMakeWriter;
use ildrisk::application::PredictionService;
use ildrisk::config::AppConfig;
use ildrisk::tui::App;

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    // Writing logs to the terminal would corrupt the TUI (alternate screen).
    // Interactive sessions log to a file by default, everything else to stdout.
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if config.log_mode.use_file(interactive) {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting ildrisk...");

    // A load failure is not fatal: the dashboard shows it and every
    // submission reports it.
    let mut service = PredictionService::new();
    if let Err(e) = service.initialize(&config.artifact_source()) {
        tracing::warn!("Prediction disabled for this session: {}", e);
    }

    let mut app = App::new(service, config);
    app.run()?;

    tracing::info!("ildrisk shutdown complete.");
    Ok(())
}
