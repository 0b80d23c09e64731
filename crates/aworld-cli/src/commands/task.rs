use crate::cli::Cli;
use anyhow::{Context, Result};
use aworld_executor::{Executor, LocalExecutor, RemoteExecutor};
use aworld_remote::RemoteClient;

pub async fn run(cli: &Cli, agent_name: &str, prompt: &str) -> Result<()> {
    let context = super::context::load(cli).await?;
    let session_id = super::context::session_id(cli);

    let response = if let Some(backend) = cli.remote_backend.first() {
        let client = RemoteClient::new(backend.clone(), "cli-user", session_id.clone());
        let executor = RemoteExecutor::new(client, agent_name);
        executor.chat(prompt, None).await?
    } else {
        let executor = LocalExecutor::build(&context.registry, agent_name, None, session_id.clone())
            .await
            .with_context(|| format!("failed to build executor for agent '{agent_name}'"))?;
        executor.chat(prompt, None).await?
    };

    println!("{}", response.text);
    if let Some(usage) = &response.usage {
        if usage.cost.is_some() || usage.total_tokens.is_some() {
            println!(
                "tokens: {}  cost: {}",
                usage.total_tokens.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
                usage.cost.map(|c| format!("{c:.4}")).unwrap_or_else(|| "-".to_string())
            );
        }
    }

    super::context::record_session(&session_id);
    Ok(())
}
