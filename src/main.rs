use ask_relay::{build_app, config::AppConfig, run_server, AppState};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    if config.api_key.is_none() {
        warn!("GROQ_API_KEY is not set; POST /ask will answer 500 until it is configured");
    }

    let port = config.port;
    let app = build_app(AppState::from_config(config));

    run_server(app, port).await
}
