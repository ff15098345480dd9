//! Git repository detection for a working directory.

use std::fs;
use std::path::Path;
use tracing::trace;

/// How many directories (cwd included) are checked for `.git`.
pub const MAX_GIT_SEARCH_DEPTH: usize = 10;

const HEAD_REF_PREFIX: &str = "ref: refs/heads/";

/// Branch named by a `.git/HEAD` file, if it points at a local branch.
pub fn parse_head(content: &str) -> Option<String> {
    content
        .trim()
        .strip_prefix(HEAD_REF_PREFIX)
        .map(|branch| branch.to_string())
}

/// Find the repository enclosing `cwd`.
///
/// Returns the repository directory name and, when HEAD is on a branch, the
/// branch name. A detached HEAD still yields the repository.
pub fn detect_git(cwd: &Path) -> Option<(String, Option<String>)> {
    for dir in cwd.ancestors().take(MAX_GIT_SEARCH_DEPTH) {
        let git_dir = dir.join(".git");
        if !git_dir.exists() {
            continue;
        }

        let repo = dir.file_name()?.to_string_lossy().into_owned();
        let branch = fs::read_to_string(git_dir.join("HEAD"))
            .ok()
            .and_then(|head| parse_head(&head));
        trace!(repo = %repo, branch = ?branch, "git repository found");
        return Some((repo, branch));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_head() {
        assert_eq!(parse_head("ref: refs/heads/main\n").as_deref(), Some("main"));
        assert_eq!(
            parse_head("ref: refs/heads/feature/tree-view").as_deref(),
            Some("feature/tree-view")
        );
        assert_eq!(parse_head("3f4e8a21b7c90d1e2f3a4b5c6d7e8f9a0b1c2d3e\n"), None);
    }

    #[test]
    fn test_detect_from_nested_directory() {
        let tmp = tempdir().unwrap();
        let repo = tmp.path().join("shop-api");
        let nested = repo.join("src/handlers");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::create_dir_all(&nested).unwrap();
        fs::write(repo.join(".git/HEAD"), "ref: refs/heads/release-2\n").unwrap();

        let (name, branch) = detect_git(&nested).unwrap();
        assert_eq!(name, "shop-api");
        assert_eq!(branch.as_deref(), Some("release-2"));
    }

    #[test]
    fn test_detached_head_keeps_repo() {
        let tmp = tempdir().unwrap();
        let repo = tmp.path().join("detached");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::write(repo.join(".git/HEAD"), "3f4e8a21\n").unwrap();

        assert_eq!(detect_git(&repo), Some(("detached".to_string(), None)));
    }

    #[test]
    fn test_worktree_git_file_counts() {
        // Linked worktrees have a `.git` file rather than a directory
        let tmp = tempdir().unwrap();
        let repo = tmp.path().join("wt");
        fs::create_dir_all(&repo).unwrap();
        fs::write(repo.join(".git"), "gitdir: /elsewhere\n").unwrap();

        assert_eq!(detect_git(&repo), Some(("wt".to_string(), None)));
    }

    #[test]
    fn test_search_depth_is_bounded() {
        let tmp = tempdir().unwrap();
        let repo = tmp.path().join("deep");
        fs::create_dir_all(repo.join(".git")).unwrap();

        let mut nested = repo.clone();
        for i in 0..MAX_GIT_SEARCH_DEPTH {
            nested = nested.join(format!("d{i}"));
        }
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(detect_git(&nested), None);
        assert!(detect_git(nested.parent().unwrap()).is_some());
    }
}
