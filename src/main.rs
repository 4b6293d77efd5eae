// Draft board entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config
// 3. Open the store, seed default league settings
// 4. Resolve (or generate) the current draft session
// 5. Serve the WebSocket command surface until Ctrl+C

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use draft_board::app::App;
use draft_board::config;
use draft_board::db::Store;
use draft_board::draft::DraftSessionId;
use draft_board::ws_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Draft board starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: port={}, db={}, lookahead={}",
        config.ws_port, config.db_path, config.lookahead
    );

    let store = Store::open(&config.db_path).context("failed to open database")?;
    let settings = store
        .ensure_default_settings()
        .context("failed to initialize league settings")?;
    info!(
        "League settings: {} teams, slots QB={} RB={} WR={} TE={} FLEX={}",
        settings.total_teams,
        settings.qb_slots,
        settings.rb_slots,
        settings.wr_slots,
        settings.te_slots,
        settings.flex_slots
    );

    let session = match store
        .current_session()
        .context("failed to read current session")?
    {
        Some(session) => {
            info!("Resuming draft session {session}");
            session
        }
        None => {
            let session = DraftSessionId::generate();
            store
                .set_current_session(&session)
                .context("failed to store session id")?;
            info!("Started draft session {session}");
            session
        }
    };

    let app = Arc::new(App::new(Arc::new(store), session, config.lookahead));

    let listener = TcpListener::bind(("127.0.0.1", config.ws_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.ws_port))?;

    tokio::select! {
        result = ws_server::run(listener, app) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Draft board shutting down");
            Ok(())
        }
    }
}

/// Initialize tracing to stderr with env-filter support.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("draft_board=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
