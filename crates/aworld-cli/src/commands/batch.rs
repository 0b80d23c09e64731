use crate::cli::Cli;
use anyhow::Result;
use aworld_batch::{digest, BatchConfig};
use std::path::Path;

pub async fn run(cli: &Cli, config_path: &str) -> Result<()> {
    let mut config = BatchConfig::load(Path::new(config_path))?;
    if let Some(backend) = cli.remote_backend.first() {
        config.agent.remote_backend = Some(backend.clone());
    }

    let context = super::context::load(cli).await?;
    let session_id = super::context::session_id(cli);
    let summary = aworld_batch::run(&config, context.registry).await?;

    println!("total: {}", summary.total);
    println!("success: {}", summary.success_count);
    println!("failed: {}", summary.failure_count);
    println!("total_cost: {:.4}", summary.total_cost);
    println!("duration: {:.2}s", summary.duration_secs);
    println!("output: {}", summary.output_path);

    if let Some(aggregation) = &summary.digest {
        println!();
        print!("{}", digest::format_summary(aggregation));
    }

    super::context::record_session(&session_id);
    Ok(())
}
