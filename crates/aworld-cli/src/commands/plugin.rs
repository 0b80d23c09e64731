use crate::cli::PluginCommands;
use anyhow::Result;
use aworld_cache::PluginManager;

pub async fn run(command: &PluginCommands) -> Result<()> {
    let manager = PluginManager::new(aworld_cache::default_plugin_root()?);

    match command {
        PluginCommands::Install { name, source, force } => {
            let entry = manager.install(name, source, *force)?;
            println!("installed '{}' from {} at {}", entry.name, entry.source, entry.installed_at);
        }
        PluginCommands::List => {
            let entries = manager.list()?;
            if entries.is_empty() {
                println!("No plugins installed.");
                return Ok(());
            }
            for entry in entries {
                println!("{}\t{}\t{}", entry.name, entry.source, entry.installed_at);
            }
        }
        PluginCommands::Remove { name } => {
            manager.remove(name)?;
            println!("removed '{name}'");
        }
    }

    Ok(())
}
