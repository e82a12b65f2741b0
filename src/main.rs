use anyhow::Result;
use viga::{Agent, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    log::info!("Initializing VIGA v{}", env!("CARGO_PKG_VERSION"));

    // Everything after the program name is the instruction
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Exit status does not depend on whether the command was grounded
    let succeeded = execute(Config::load(), args).await;
    log::debug!("Command finished, success = {}", succeeded);

    Ok(())
}

/// Run one command. Setup failures are logged and reported as `false` like
/// any other pipeline failure.
async fn execute(config: Result<Config>, args: Vec<String>) -> bool {
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {:#}", e);
            println!("CRITICAL ERROR: {:#}", e);
            return false;
        }
    };
    log::info!("Perception snapshot: {}", config.snapshot_path().display());

    let intent = if args.is_empty() {
        config.grounding.default_intent.clone()
    } else {
        args.join(" ")
    };

    let agent = match Agent::from_config(&config) {
        Ok(agent) => agent,
        Err(e) => {
            log::error!("Failed to set up agent: {}", e);
            println!("CRITICAL ERROR: {}", e);
            return false;
        }
    };

    agent.run_command(&intent).await
}
