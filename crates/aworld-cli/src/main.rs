use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let result = match cli.command {
        Commands::List => commands::list::run(&cli).await,
        Commands::BatchJob { ref config } => commands::batch::run(&cli, config).await,
        Commands::Task { ref agent, ref prompt } => commands::task::run(&cli, agent, prompt).await,
        Commands::Plugin { ref command } => commands::plugin::run(command).await,
        Commands::Skill { ref command } => commands::skill::run(&cli, command).await,
    };

    if let Err(err) = &result {
        eprintln!("error: {err:#}");
    }
    result
}

fn init_tracing(log_level: &str, log_format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter);
    let result = match log_format {
        LogFormat::Json => subscriber.json().try_init(),
        LogFormat::Pretty => subscriber.try_init(),
    };
    result.ok();
}
