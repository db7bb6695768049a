//! Geminal server binary.
//!
//! # Usage
//!
//! ```bash
//! # Generate a host key once
//! ssh-keygen -t ed25519 -N '' -f id_rsa
//!
//! # Start the gateway
//! GEMINI_API_KEY=... geminal-server --bind 0.0.0.0:2222
//!
//! # Connect
//! ssh -p 2222 localhost
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use geminal_inference::{DEFAULT_ENDPOINT, GeminiClient, InferenceConfig};
use geminal_server::{
    DEFAULT_BIND_ADDRESS, DEFAULT_HOST_KEY_PATH, Server, ServerRuntimeConfig, require_api_key,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// SSH gateway to Gemini
#[derive(Parser, Debug)]
#[command(name = "geminal-server")]
#[command(about = "Chat with Gemini over SSH")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = DEFAULT_BIND_ADDRESS)]
    bind: String,

    /// Path to the OpenSSH host private key
    #[arg(short = 'k', long, default_value = DEFAULT_HOST_KEY_PATH)]
    host_key: PathBuf,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini generateContent endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Drop idle connections after this many seconds (0 disables)
    #[arg(long, default_value = "3600")]
    inactivity_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Geminal server starting");

    let api_key = require_api_key(args.api_key)?;
    let inference = InferenceConfig::new(api_key).with_endpoint(args.endpoint);

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        host_key_path: args.host_key,
        inactivity_timeout: (args.inactivity_timeout_secs > 0)
            .then(|| Duration::from_secs(args.inactivity_timeout_secs)),
        inference,
    };

    tracing::info!("Binding to {}", config.bind_address);
    tracing::debug!(?config, "configuration");

    let client = GeminiClient::new(config.inference.clone())?;
    tracing::info!("Inference endpoint: {}", client.endpoint());

    let server = Server::bind(&config, client).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
