use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use airwatch::{auth, cors_layer, create_router, db, init_pool, run_migrations, AppState, Config};

/// How often stale rate-limit entries and expired sessions are swept.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: DATABASE_URL (default: sqlite://airwatch.db)");
            eprintln!("Optional: LISTEN_ADDR (default: 0.0.0.0:8002)");
            eprintln!("Optional: AIRWATCH_ENVIRONMENT, AIRWATCH_TOKEN_TTL_HOURS, AIRWATCH_CORS_ORIGINS, AIRWATCH_LOGIN_RATE_LIMIT");
            eprintln!("Optional: AIRWATCH_ADMIN_USERNAME with AIRWATCH_ADMIN_PASSWORD and AIRWATCH_ADMIN_EMAIL");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Airwatch server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Listen address: {}", config.listen_addr);
    tracing::info!("Database: {}", config.database_url);

    // Connect to database
    let pool = match init_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Database connection error: {}", e);
            std::process::exit(1);
        }
    };

    // Run migrations
    if let Err(e) = run_migrations(&pool).await {
        eprintln!("Migration error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Database migrations completed");

    if let Some(admin) = &config.admin {
        if let Err(e) = auth::bootstrap_admin(&pool, admin).await {
            eprintln!("Admin bootstrap error: {}", e);
            std::process::exit(1);
        }
    }

    // Create app state
    let state = AppState::new(pool, &config);

    // Periodic cleanup
    let limiter = state.login_limiter.clone();
    let cleanup_pool = state.pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.cleanup();
            match db::sessions::purge_expired(&cleanup_pool, Utc::now()).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Purged {} expired sessions", n),
                Err(e) => tracing::error!("Session cleanup failed: {}", e),
            }
        }
    });

    // Build router
    let app = create_router(state)
        .layer(cors_layer(&config.cors_origins))
        .into_make_service_with_connect_info::<SocketAddr>();

    // Start server
    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server running at http://{}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    tracing::info!("Shutdown signal received");
}
