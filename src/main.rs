//! Score Desk Back binary entrypoint wiring REST, SSE and the configured match store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use score_desk_back::{
    config::{AppConfig, StorageBackend},
    dao::{
        history::{FileHistoryStore, HistoryStore, MemoryHistoryStore},
        match_store::{
            MatchStore,
            memory::{MemoryMatchStore, SeedData},
        },
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    ensure_backend_compiled(config.storage)?;

    let history: Arc<dyn HistoryStore> = match &config.history_dir {
        Some(dir) => Arc::new(
            FileHistoryStore::open(dir.clone())
                .await
                .with_context(|| format!("opening undo history directory {}", dir.display()))?,
        ),
        None => Arc::new(MemoryHistoryStore::new()),
    };

    let memory = match config.storage {
        StorageBackend::Memory => Some(memory_store(&config).await?),
        _ => None,
    };

    let app_state = AppState::new(&config, history);

    let backend = config.storage;
    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        let memory = memory.clone();
        async move { connect_store(backend, memory).await }
    }));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, storage = ?backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

fn ensure_backend_compiled(backend: StorageBackend) -> anyhow::Result<()> {
    let compiled = match backend {
        StorageBackend::Memory => true,
        StorageBackend::Couch => cfg!(feature = "couch-store"),
        StorageBackend::Mongo => cfg!(feature = "mongo-store"),
    };
    if !compiled {
        anyhow::bail!("storage backend {backend:?} is not compiled into this binary");
    }
    Ok(())
}

async fn memory_store(config: &AppConfig) -> anyhow::Result<MemoryMatchStore> {
    let Some(path) = &config.seed_path else {
        return Ok(MemoryMatchStore::default());
    };
    let seed = SeedData::load(path)
        .await
        .with_context(|| format!("loading seed data from {}", path.display()))?;
    info!(
        games = seed.games.len(),
        teams = seed.teams.len(),
        matches = seed.matches.len(),
        "seeded in-memory match store"
    );
    Ok(MemoryMatchStore::from_seed(seed))
}

/// Open a connection to the configured backend. Called again by the
/// supervisor whenever the previous connection is given up.
async fn connect_store(
    backend: StorageBackend,
    memory: Option<MemoryMatchStore>,
) -> Result<Arc<dyn MatchStore>, StorageError> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(memory.unwrap_or_default())),
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            use score_desk_back::dao::match_store::couchdb::{CouchConfig, CouchMatchStore};

            let config = CouchConfig::from_env()?;
            Ok(Arc::new(CouchMatchStore::connect(config).await?))
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            use score_desk_back::dao::match_store::mongodb::{MongoConfig, MongoMatchStore};

            let config = MongoConfig::from_env().await?;
            Ok(Arc::new(MongoMatchStore::connect(config).await?))
        }
        #[allow(unreachable_patterns)]
        _ => Err(StorageError::Offline),
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
