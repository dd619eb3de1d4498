use std::sync::Arc;

use quick_notes::{config, repository::Database, router, service::NoteService};

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt::init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {e}");
        panic!("failed to load config: {e}");
    });

    // Database creation and schema setup
    let db = Database::open(&cfg.database_path).unwrap_or_else(|e| {
        tracing::error!("Failed to open database: {e}");
        panic!("failed to open database: {e}");
    });

    db.migrate().unwrap_or_else(|e| {
        tracing::error!("Failed to migrate database: {e}");
        panic!("failed to migrate database: {e}");
    });

    // Service creation
    let service = Arc::new(NoteService::new(Arc::new(db)));

    let listener = tokio::net::TcpListener::bind((cfg.host.as_str(), cfg.port))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind {}:{}: {e}", cfg.host, cfg.port);
            panic!("failed to bind listener: {e}");
        });

    match listener.local_addr() {
        Ok(addr) => tracing::info!("Notes server starting, listening on {addr}"),
        Err(e) => tracing::warn!("Notes server starting, local address unavailable: {e}"),
    }

    if let Err(e) = axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("HTTP server error: {e}");
        panic!("failed to run HTTP server: {e}");
    }

    tracing::info!("Notes server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
