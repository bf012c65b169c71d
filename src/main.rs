use std::net::TcpListener;
use token_gateway::auth::{AuthGateway, RefreshTokenStore};
use token_gateway::configuration::get_configuration;
use token_gateway::startup::run;
use token_gateway::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    // Missing or invalid secrets are fatal at startup
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Configuration error: {}", e),
            ));
        }
    };

    // Refresh tokens live in process memory only
    let gateway = AuthGateway::from_settings(&configuration, RefreshTokenStore::new());
    tracing::info!(
        refresh_enabled = gateway.refresh_enabled(),
        access_token_expiry = configuration.tokens.access_token_expiry,
        "Auth gateway ready"
    );

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, gateway)?.await
}
