use api::{build_app, AppState};
use config::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() {
    // Load configuration first to get logging settings
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Application cannot start without provider credentials.");
        std::process::exit(1);
    });

    // Initialize tracing with configuration from config.yaml
    init_tracing(&config.logging);

    let state = AppState::from_config(&config.auth).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to initialize authentication");
        std::process::exit(1);
    });

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    // Periodically sweep expired sessions and abandoned login handshakes
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let sessions = cleanup_state.sessions.cleanup_expired().await;
            let pending = cleanup_state.flow.cleanup_expired().await;
            tracing::debug!(sessions, pending, "Swept expired entries");
        }
    });

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    tracing::info!(address = %bind_address, "Server started successfully");
    tracing::info!("Endpoints:");
    tracing::info!("  - GET / (Home page)");
    tracing::info!("  - GET /login (Redirect to SSO provider)");
    tracing::info!("  - GET /callback (Provider callback)");
    tracing::info!("  - GET /profile (Profile page, requires session)");
    tracing::info!("  - GET /logout (End session)");

    axum::serve(listener, app).await.unwrap();
}

fn init_tracing(logging_config: &LoggingConfig) {
    // Build the filter string from the logging configuration
    let mut filter = logging_config.level.clone();

    for (module, level) in &logging_config.modules {
        filter.push_str(&format!(",{}={}", module, level));
    }

    // Initialize tracing based on the format specified in config
    match logging_config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .init();
        }
    }
}
