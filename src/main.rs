//! Pluggy Gateway - API Server
//!
//! Run modes:
//!   cargo run                    - Show usage
//!   cargo run -- api             - Start REST API
//!   cargo run -- api --port 4000 - Start REST API on another port

use pluggy_gateway::api::{start_server, AppState};
use pluggy_gateway::client::HttpTransport;
use pluggy_gateway::common::{init_from_config, GatewayConfig};
use pluggy_gateway::Result;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "api" => run_api_server(&args[2..]).await,
        _ => {
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Pluggy Gateway - Open-Banking API Proxy");
    println!();
    println!("Usage:");
    println!("  pluggy-gateway api [--port <port>]    Start REST API server (default: 3002)");
    println!("  pluggy-gateway help                   Show this message");
    println!();
    println!("Environment Variables:");
    println!("  PORT                    REST API port (default: 3002)");
    println!("  PLUGGY_BASE_URL         Upstream API (default: https://api.pluggy.ai)");
    println!("  PLUGGY_CLIENT_ID        Upstream client id");
    println!("  PLUGGY_SECRET           Upstream client secret");
    println!("  API_SECRET_KEY          Bearer secret for POST /pix/transfer (optional)");
    println!("  BACKEND_URL             Base URL of the enrichment service (default: http://localhost:3002)");
    println!("  UPSTREAM_TIMEOUT_SECS   Upstream request timeout (default: 30)");
    println!("  LOG_LEVEL               trace|debug|info|warn|error (default: info)");
    println!("  LOG_FORMAT              pretty|json (default: pretty)");
}

/// Start REST API server
async fn run_api_server(args: &[String]) -> Result<()> {
    let mut config = GatewayConfig::from_env()?;

    // Parse arguments
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                match args[i + 1].parse() {
                    Ok(port) => config.port = port,
                    Err(_) => eprintln!(
                        "Warning: invalid --port '{}', using {}",
                        args[i + 1], config.port
                    ),
                }
                i += 2;
            }
            _ => i += 1,
        }
    }

    init_from_config(&config)?;

    if config.missing_credentials() {
        tracing::warn!("PLUGGY_CLIENT_ID or PLUGGY_SECRET is not set; upstream calls will fail");
    }

    config.print_summary();

    let transport = HttpTransport::new(config.upstream_timeout)?;

    let port = config.port;
    let state = AppState::new(config, Arc::new(transport));

    start_server(state, port).await?;
    Ok(())
}
