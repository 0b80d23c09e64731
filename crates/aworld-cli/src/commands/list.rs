use crate::cli::Cli;
use anyhow::Result;

pub async fn run(cli: &Cli) -> Result<()> {
    let context = super::context::load(cli).await?;

    if context.agents.is_empty() {
        println!("No agents found.");
        return Ok(());
    }

    let name_width = context.agents.iter().map(|a| a.name.len()).max().unwrap_or(4).max(4);
    println!("{:<name_width$}  {:<8}  LOCATION", "NAME", "SOURCE", name_width = name_width);
    for agent in &context.agents {
        println!(
            "{:<name_width$}  {:<8}  {}",
            agent.name,
            agent.source_type.to_string(),
            agent.source_location,
            name_width = name_width
        );

        if let Some(servers) = agent.metadata.get("mcp_servers").and_then(|v| v.as_array()) {
            if !servers.is_empty() {
                let names: Vec<&str> = servers.iter().filter_map(|v| v.as_str()).collect();
                println!("{:name_width$}    mcp_servers: {}", "", names.join(", "), name_width = name_width);
            }
        }
        if let Some(configs) = agent.metadata.get("skill_configs").and_then(|v| v.as_object()) {
            if !configs.is_empty() {
                let names: Vec<&str> = configs.keys().map(String::as_str).collect();
                println!("{:name_width$}    skill_configs: {}", "", names.join(", "), name_width = name_width);
            }
        }
    }

    Ok(())
}
