use bank_prompt_chain::{api::start_server, AppConfig, ChainDriver};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("See .env.example for setup instructions");
            std::process::exit(1);
        }
    };

    info!("Bank AI Assistant - API Server");
    info!(
        port = config.port,
        strategy = %config.category_strategy,
        reset_on_resolve = config.reset_on_resolve,
        "Configuration loaded"
    );

    let driver = Arc::new(ChainDriver::from_config(&config)?);

    info!("Chain driver initialized");
    start_server(driver, config.port).await?;

    Ok(())
}
