//! Parses the handful of ways a git source can be written: a full GitHub
//! URL (optionally carrying `/tree/<branch>/<subdir>`), an `owner/repo`
//! shorthand, or an SSH `git@github.com:owner/repo.git` form.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub subdirectory: Option<String>,
    pub clone_url: String,
}

const DEFAULT_BRANCH: &str = "main";

/// True when `s` is shaped like a git reference this crate knows how to
/// resolve, as opposed to a plain local filesystem path.
pub fn is_git_reference(s: &str) -> bool {
    s.starts_with("git@github.com:")
        || s.starts_with("https://github.com/")
        || s.starts_with("http://github.com/")
}

/// Parse a full GitHub reference: `https://github.com/<owner>/<repo>`,
/// optionally followed by `/tree/<branch>/<subdir...>`, or the SSH form
/// `git@github.com:<owner>/<repo>.git`.
pub fn parse_github_url(s: &str) -> Option<GitRef> {
    if let Some(rest) = s.strip_prefix("git@github.com:") {
        let rest = rest.trim_end_matches(".git");
        let mut parts = rest.splitn(2, '/');
        let owner = parts.next()?.to_string();
        let repo = parts.next()?.to_string();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        return Some(GitRef {
            clone_url: format!("git@github.com:{owner}/{repo}.git"),
            owner,
            repo,
            branch: DEFAULT_BRANCH.to_string(),
            subdirectory: None,
        });
    }

    let rest = s
        .strip_prefix("https://github.com/")
        .or_else(|| s.strip_prefix("http://github.com/"))?;
    let rest = rest.trim_end_matches('/');
    let mut segments = rest.splitn(3, '/');
    let owner = segments.next()?.to_string();
    let repo_raw = segments.next()?.trim_end_matches(".git").to_string();
    if owner.is_empty() || repo_raw.is_empty() {
        return None;
    }

    let tail = segments.next();
    let (branch, subdirectory) = match tail {
        Some(tail) if tail.starts_with("tree/") => {
            let tail = &tail["tree/".len()..];
            match tail.split_once('/') {
                Some((branch, subdir)) if !subdir.is_empty() => {
                    (branch.to_string(), Some(subdir.to_string()))
                }
                _ => (tail.to_string(), None),
            }
        }
        _ => (DEFAULT_BRANCH.to_string(), None),
    };

    Some(GitRef {
        clone_url: format!("https://github.com/{owner}/{repo_raw}.git"),
        owner,
        repo: repo_raw,
        branch,
        subdirectory,
    })
}

/// Parse the `owner/repo[/tree/branch[/subdir]]` shorthand accepted by the
/// plugin installer in addition to full URLs.
pub fn parse_plugin_source(s: &str) -> Option<GitRef> {
    if is_git_reference(s) {
        return parse_github_url(s);
    }
    if s.starts_with("git@github.com:") {
        return parse_github_url(s);
    }

    let mut segments = s.splitn(3, '/');
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.to_string();
    if owner.is_empty() || repo.is_empty() || owner.contains('.') {
        return None;
    }

    let tail = segments.next();
    let (branch, subdirectory) = match tail {
        Some(tail) if tail.starts_with("tree/") => {
            let tail = &tail["tree/".len()..];
            match tail.split_once('/') {
                Some((branch, subdir)) if !subdir.is_empty() => {
                    (branch.to_string(), Some(subdir.to_string()))
                }
                _ => (tail.to_string(), None),
            }
        }
        _ => (DEFAULT_BRANCH.to_string(), None),
    };

    Some(GitRef {
        clone_url: format!("https://github.com/{owner}/{repo}.git"),
        owner,
        repo,
        branch,
        subdirectory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url_defaults_to_main() {
        let r = parse_github_url("https://github.com/acme/skills").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.repo, "skills");
        assert_eq!(r.branch, "main");
        assert_eq!(r.subdirectory, None);
    }

    #[test]
    fn tree_branch_and_subdir() {
        let r = parse_github_url("https://github.com/acme/skills/tree/dev/pkg/weather").unwrap();
        assert_eq!(r.branch, "dev");
        assert_eq!(r.subdirectory.as_deref(), Some("pkg/weather"));
    }

    #[test]
    fn tree_branch_only() {
        let r = parse_github_url("https://github.com/acme/skills/tree/dev").unwrap();
        assert_eq!(r.branch, "dev");
        assert_eq!(r.subdirectory, None);
    }

    #[test]
    fn ssh_form() {
        let r = parse_github_url("git@github.com:acme/skills.git").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.repo, "skills");
        assert_eq!(r.clone_url, "git@github.com:acme/skills.git");
    }

    #[test]
    fn shorthand_owner_repo() {
        let r = parse_plugin_source("acme/skills").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.repo, "skills");
        assert_eq!(r.branch, "main");
    }

    #[test]
    fn not_a_reference_is_none() {
        assert!(parse_github_url("./local/path").is_none());
        assert!(!is_git_reference("./local/path"));
    }
}
