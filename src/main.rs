mod config;
mod error;
mod helpers;
mod middleware;
mod models;
mod routes;
mod schema;
mod services;

use std::sync::Arc;

use tracing::*;

use config::{Settings, StoreKind};
use routes::posts::PostsRouteState;
use services::posts::{PostServiceDb, PostServiceMem};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // initialize tracing
    config::tracing::init();

    let cfg = Settings::load()?;

    let post_svc: PostsRouteState = match cfg.store {
        StoreKind::Mysql => {
            info!(host = %cfg.db.host, db = %cfg.db.db, "Starting DB pool");
            Arc::new(PostServiceDb::connect(&cfg.db)?)
        }
        StoreKind::Memory => {
            warn!("using the in-memory post store, nothing survives a restart");
            Arc::new(PostServiceMem::new())
        }
    };

    let app = routes::app(post_svc, cfg.request_timeout());

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    info!("starting listening at {}", cfg.listen_addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(%e, "failed to listen for ctrl-c");
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
                error!(%e, "failed to listen for SIGTERM");
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
    info!("shutting down");
}
