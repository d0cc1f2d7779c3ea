use panelgen::{logger, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let env_loaded = dotenv::dotenv().is_ok();
    let config = Config::from_env();

    if let Err(e) = logger::init_with_config(logger::LoggerConfig::for_debug(config.server.debug)) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if env_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &config);
    if config.gemini.require_api_key().is_err() {
        log::warn!("⚠️  GEMINI_API_KEY is not set; generation requests will fail until it is configured");
    }

    panelgen::server::run(config).await
}
