use crate::cli::{Cli, SkillCommands};
use anyhow::Result;

pub async fn run(cli: &Cli, command: &SkillCommands) -> Result<()> {
    let context = super::context::load(cli).await?;

    match command {
        SkillCommands::List => {
            let names = context.skills.list_skills();
            if names.is_empty() {
                println!("No skills found.");
                return Ok(());
            }
            for name in names {
                println!("{name}");
            }
        }
        SkillCommands::Search { keyword, fields } => {
            let field_refs: Vec<&str> = fields.iter().map(String::as_str).collect();
            let scoped = if field_refs.is_empty() { None } else { Some(field_refs.as_slice()) };
            let matches = context.skills.search(keyword, scoped);
            if matches.is_empty() {
                println!("No skills matched '{keyword}'.");
                return Ok(());
            }
            for entry in matches {
                println!("{}\t{}", entry.name, entry.description);
            }
        }
    }

    Ok(())
}
