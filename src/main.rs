use anyhow::Error;
use args::{Args, SubCommands};
use clap::{CommandFactory, Parser};
use repos::config::FileConfig;
use tracing::debug;

mod args;
mod clients;
mod commands;
mod error;
mod models;
mod repos;
mod services;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "gptreply=info".to_string())
        )
        .init();
    let args = Args::parse();
    let source = FileConfig::default();
    debug!("Using config file {}", source.path().display());
    match args.subcmd {
        Some(SubCommands::Ask(ask_cmd)) => {
            commands::ask::run(source, &ask_cmd).await?;
        }
        Some(SubCommands::Config(config_cmd)) => {
            commands::config::run(&source, &config_cmd)?;
        }
        None => {
            Args::command().print_help()?;
        }
    };
    Ok(())
}
