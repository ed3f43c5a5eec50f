use clap::Parser;
use oasguard::{
    cli::{Cli, Commands},
    commands, telemetry,
};

fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let passed = match cli.command {
        Commands::Routes { openapi } => commands::execute_routes(&openapi)?,
        Commands::Request { message } => commands::execute_request(&message)?,
        Commands::Response { message, status } => commands::execute_response(&message, status)?,
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
