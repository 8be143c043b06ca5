use std::sync::Arc;

use RustedIntegrals::Utils::config::AppConfig;
use RustedIntegrals::Utils::logger::init_logging;
use RustedIntegrals::server;
use log::error;

/// usage: RustedIntegrals [config.toml]
/// without an argument the path is taken from RUSTED_INTEGRALS_CONFIG, otherwise defaults apply
#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1);
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("failed to start logging: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = server::serve(Arc::new(config)).await {
        error!("server stopped: {}", e);
        std::process::exit(1);
    }
}
