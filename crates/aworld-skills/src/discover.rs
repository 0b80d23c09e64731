use aworld_core::{parse_front_matter, SkillEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Recursively find files literally named `skill.md` or `SKILL.md` under
/// `root`.
pub fn find_skill_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, &mut found);
    found
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, found);
        } else if matches!(path.file_name().and_then(|n| n.to_str()), Some("skill.md") | Some("SKILL.md")) {
            found.push(path);
        }
    }
}

/// Parse one `skill.md`-shaped file into a [`SkillEntry`], through the same
/// front-matter extractor the markdown agent parser uses.
pub fn parse_skill_file(path: &Path) -> Option<SkillEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read skill file");
            return None;
        }
    };

    let fm = parse_front_matter(&content);
    let name = fm.get_str("name")?.to_string();
    let description = fm.get_str("description").or_else(|| fm.get_str("desc")).unwrap_or("").to_string();
    let usage = fm.get_str("usage").unwrap_or("").to_string();
    let skill_type = fm.get_str("type").unwrap_or("tool").to_string();

    let tool_list = fm
        .fields
        .get("tool_list")
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .map(|(server, tools)| {
                    let list = tools
                        .as_array()
                        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                        .unwrap_or_default();
                    (server.clone(), list)
                })
                .collect()
        })
        .unwrap_or_else(HashMap::new);

    Some(SkillEntry {
        name,
        description,
        usage,
        skill_type,
        active: true,
        tool_list,
        source_path: path.to_path_buf(),
    })
}
