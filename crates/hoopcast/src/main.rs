// Draft assistant entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout stays free for the REPL)
// 2. Load config
// 3. Build the shared services (completion client, context, stats, tools)
// 4. Run the chosen transport: `serve` (default, WebSocket) or `repl`

use std::sync::Arc;

use hoopcast::config;
use hoopcast::context::extractor::PdfTextExtractor;
use hoopcast::context::ContextAggregator;
use hoopcast::llm::client::LlmClient;
use hoopcast::repl;
use hoopcast::session::SessionFactory;
use hoopcast::stats::source::CsvStatsSource;
use hoopcast::tools::DraftTools;
use hoopcast::ws_server;

use anyhow::{bail, Context};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("hoopcast starting up");

    let mode = std::env::args().nth(1).unwrap_or_else(|| "serve".to_string());

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} categories",
        config.league.name,
        config.league.num_teams,
        config.league.categories.len()
    );

    // 3. Shared services
    let llm_client = LlmClient::from_config(&config);
    match &llm_client {
        LlmClient::Active(_) => info!("LLM client initialized (API key configured)"),
        LlmClient::Disabled => info!("LLM client disabled (no API key)"),
    }

    let context = Arc::new(ContextAggregator::from_config(
        &config,
        Arc::new(PdfTextExtractor),
    ));
    let stats = Arc::new(CsvStatsSource::new(&config.paths.stats_csv));
    let tools = DraftTools::new(stats, Arc::clone(&context));
    let sessions = SessionFactory::from_config(&config, Arc::new(llm_client), context);

    // 4. Transport
    match mode.as_str() {
        "serve" => {
            info!("Serving WebSocket clients on 127.0.0.1:{}", config.port);
            if let Err(e) = ws_server::run(config.port, sessions, tools).await {
                error!("WebSocket server error: {}", e);
                return Err(e);
            }
        }
        "repl" => {
            println!(
                "hoopcast: {} ({}-team serpentine). Type /quit to exit.",
                config.league.name, config.league.num_teams
            );
            repl::run(sessions.create(), tools).await?;
        }
        other => bail!("unknown mode `{other}`; expected `serve` or `repl`"),
    }

    info!("hoopcast shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which the REPL uses).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("hoopcast.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hoopcast=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
