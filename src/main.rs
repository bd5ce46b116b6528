use clap::Parser;
use geotag::cli::{Cli, Command, MigrateAction};
use geotag::config::Config;
use geotag::db::{self, CompanyStore, Database, Migrator, SchemaFilter};
use geotag::error::GeoError;
use geotag::router::{GeoState, geo_router};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), GeoError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.redacted_database_url(),
        addr = %cfg.socket_addr(),
        loglevel = %cfg.loglevel,
        excluded_tables = cfg.migration_excluded_tables.len()
    );

    let database = db::connect(&cfg.database_url, cfg.database_max_connections).await?;
    database.ping().await?;
    let filter = SchemaFilter::new(cfg.migration_excluded_tables.iter().cloned());
    let migrator = Migrator::new(&database, filter);

    match cli.command() {
        Command::Serve => {
            let report = migrator.up().await?;
            info!(
                applied = ?report.applied,
                skipped = report.skipped.len(),
                "schema up to date"
            );
            migrator.warn_unmanaged().await;
            serve(&cfg, database).await?;
        }
        Command::Migrate { action } => match action {
            MigrateAction::Up => {
                let report = migrator.up().await?;
                info!(applied = ?report.applied, skipped = ?report.skipped, "migrate up finished");
            }
            MigrateAction::Down { steps } => {
                let reverted = migrator.down(*steps).await?;
                if reverted.is_empty() {
                    warn!("nothing to revert");
                } else {
                    info!(reverted = ?reverted, "migrate down finished");
                }
            }
            MigrateAction::Status => {
                let status = migrator.status().await?;
                for m in &status.applied {
                    info!(version = m.version, description = %m.description, applied_at = %m.applied_at, "applied");
                }
                for m in &status.pending {
                    info!(version = m.version, description = m.description, "pending");
                }
                for table in &status.unmanaged_tables {
                    warn!(table = %table, "unmanaged table");
                }
            }
        },
    }
    Ok(())
}

async fn serve(cfg: &Config, database: Database) -> Result<(), GeoError> {
    let app = geo_router(GeoState::new(database));

    let addr = cfg.socket_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
