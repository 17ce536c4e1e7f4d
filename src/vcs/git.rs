use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{BranchType, Repository};

use super::{Result, VcsError};

/// Where a branch name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefType {
    /// A local branch.
    Head,
    /// Only a remote-tracking branch exists, under `remote`.
    RemoteHead { remote: String },
}

/// Configured `user.name` / `user.email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

/// Repository handle backed by git2 (libgit2).
pub struct GitRepo {
    pub(super) repo: Repository,
}

impl GitRepo {
    /// Open the repository containing `path`.
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| VcsError::NotARepository)?;
        Ok(GitRepo { repo })
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Validate that a reference doesn't look like a flag.
    fn validate_ref_format(reference: &str) -> Result<()> {
        if reference.trim().starts_with('-') {
            return Err(VcsError::InvalidRef(format!(
                "references cannot start with '-': {}",
                reference
            )));
        }
        Ok(())
    }

    /// Checked-out branch, `None` when HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = self
            .repo
            .head()
            .map_err(|e| VcsError::Other(format!("failed to get HEAD: {}", e)))?;

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            Ok(None)
        }
    }

    /// Branch name, or the short commit id when HEAD is detached.
    pub fn current_ref(&self) -> Result<String> {
        if let Some(branch) = self.current_branch()? {
            return Ok(branch);
        }

        let commit = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| VcsError::Other(format!("failed to resolve HEAD: {}", e)))?;
        let short = commit
            .as_object()
            .short_id()
            .map_err(|e| VcsError::Other(format!("failed to shorten commit id: {}", e)))?;
        short
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| VcsError::Other("short commit id is not valid UTF-8".to_string()))
    }

    /// Remote the current branch tracks, if it has an upstream.
    pub fn current_remote_name(&self) -> Result<Option<String>> {
        let head = self
            .repo
            .head()
            .map_err(|e| VcsError::Other(format!("failed to get HEAD: {}", e)))?;
        if !head.is_branch() {
            return Ok(None);
        }
        let Some(refname) = head.name() else {
            return Ok(None);
        };

        match self.repo.branch_upstream_remote(refname) {
            Ok(buf) => Ok(buf.as_str().map(|s| s.to_string())),
            Err(_) => Ok(None),
        }
    }

    /// Look `name` up as a local branch, then as a remote-tracking branch,
    /// checking the upstream remote first.
    pub fn branch_type(&self, name: &str) -> Result<Option<RefType>> {
        Self::validate_ref_format(name)?;

        if self.repo.find_branch(name, BranchType::Local).is_ok() {
            return Ok(Some(RefType::Head));
        }

        let mut remotes: Vec<String> = self
            .repo
            .remotes()
            .map_err(|e| VcsError::Other(format!("failed to list remotes: {}", e)))?
            .iter()
            .flatten()
            .map(String::from)
            .collect();
        if let Some(upstream) = self.current_remote_name()? {
            remotes.retain(|r| r != &upstream);
            remotes.insert(0, upstream);
        }

        for remote in remotes {
            let qualified = format!("{}/{}", remote, name);
            if self.repo.find_branch(&qualified, BranchType::Remote).is_ok() {
                return Ok(Some(RefType::RemoteHead { remote }));
            }
        }

        Ok(None)
    }

    /// Name to present and check out for `branch` given where it resolved.
    pub fn original_branch_ref(branch: &str, ref_type: &RefType) -> String {
        match ref_type {
            RefType::Head => branch.to_string(),
            RefType::RemoteHead { remote } => format!("{}/{}", remote, branch),
        }
    }

    /// Check out a local branch, or detach at a remote-tracking branch.
    /// Refuses to overwrite local modifications.
    pub fn checkout(&self, branch: &str, ref_type: &RefType) -> Result<()> {
        Self::validate_ref_format(branch)?;

        match ref_type {
            RefType::Head => {
                let refname = format!("refs/heads/{}", branch);
                self.repo
                    .set_head(&refname)
                    .map_err(|_| VcsError::InvalidRef(branch.to_string()))?;
            }
            RefType::RemoteHead { .. } => {
                let name = Self::original_branch_ref(branch, ref_type);
                let commit = self
                    .repo
                    .find_branch(&name, BranchType::Remote)
                    .and_then(|b| b.get().peel_to_commit())
                    .map_err(|_| VcsError::InvalidRef(name.clone()))?;
                self.repo
                    .set_head_detached(commit.id())
                    .map_err(|e| VcsError::Other(format!("failed to detach HEAD: {}", e)))?;
            }
        }

        self.repo
            .checkout_head(Some(CheckoutBuilder::new().safe()))
            .map_err(|e| VcsError::Other(format!("failed to check out {}: {}", branch, e)))
    }

    pub fn user_identity(&self) -> Result<GitIdentity> {
        let config = self
            .repo
            .config()
            .map_err(|e| VcsError::Other(format!("failed to read git config: {}", e)))?;

        Ok(GitIdentity {
            name: config.get_string("user.name").unwrap_or_default(),
            email: config.get_string("user.email").unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::test_utils::RepoGuard;

    #[test]
    fn test_discover_outside_repo_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = GitRepo::discover(temp.path());
        assert!(matches!(result, Err(VcsError::NotARepository)));
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let guard = RepoGuard::new();
        let sub = guard.dir.join("src");
        std::fs::create_dir_all(&sub).unwrap();

        let repo = GitRepo::discover(&sub).expect("should open repo");
        let workdir = repo.workdir().unwrap().canonicalize().unwrap();
        assert_eq!(workdir, guard.dir.canonicalize().unwrap());
    }

    #[test]
    fn test_current_branch_and_ref() {
        let guard = RepoGuard::new();
        let repo = GitRepo::discover(&guard.dir).expect("should open repo");

        let branch = repo.current_branch().expect("should get branch");
        assert!(branch.is_some());
        assert_eq!(repo.current_ref().unwrap(), branch.unwrap());
    }

    #[test]
    fn test_current_ref_when_detached() {
        let guard = RepoGuard::new();
        let head = guard.head_commit_id();
        guard.repo.set_head_detached(head).unwrap();

        let repo = GitRepo::discover(&guard.dir).expect("should open repo");
        assert_eq!(repo.current_branch().unwrap(), None);
        let current = repo.current_ref().unwrap();
        assert!(!current.is_empty());
        assert!(head.to_string().starts_with(&current));
    }

    #[test]
    fn test_branch_type_local_remote_missing() {
        let guard = RepoGuard::new();
        guard.branch("feature");
        guard.remote_branch("origin", "review");

        let repo = GitRepo::discover(&guard.dir).expect("should open repo");
        assert_eq!(repo.branch_type("feature").unwrap(), Some(RefType::Head));
        assert_eq!(
            repo.branch_type("review").unwrap(),
            Some(RefType::RemoteHead {
                remote: "origin".to_string()
            })
        );
        assert_eq!(repo.branch_type("nope").unwrap(), None);
    }

    #[test]
    fn test_branch_starting_with_dash_rejected() {
        let guard = RepoGuard::new();
        let repo = GitRepo::discover(&guard.dir).expect("should open repo");

        let result = repo.branch_type("--upload-pack=evil");
        assert!(matches!(result, Err(VcsError::InvalidRef(_))));
    }

    #[test]
    fn test_original_branch_ref() {
        assert_eq!(GitRepo::original_branch_ref("dev", &RefType::Head), "dev");
        assert_eq!(
            GitRepo::original_branch_ref(
                "dev",
                &RefType::RemoteHead {
                    remote: "upstream".to_string()
                }
            ),
            "upstream/dev"
        );
    }

    #[test]
    fn test_checkout_local_branch() {
        let guard = RepoGuard::new();
        guard.branch("feature");

        let repo = GitRepo::discover(&guard.dir).expect("should open repo");
        repo.checkout("feature", &RefType::Head).expect("should check out");
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("feature"));
    }

    #[test]
    fn test_checkout_remote_branch_detaches() {
        let guard = RepoGuard::new();
        guard.remote_branch("origin", "review");

        let repo = GitRepo::discover(&guard.dir).expect("should open repo");
        let ref_type = RefType::RemoteHead {
            remote: "origin".to_string(),
        };
        repo.checkout("review", &ref_type).expect("should check out");
        assert_eq!(repo.current_branch().unwrap(), None);
    }

    #[test]
    fn test_user_identity() {
        let guard = RepoGuard::new();
        let repo = GitRepo::discover(&guard.dir).expect("should open repo");

        let identity = repo.user_identity().unwrap();
        assert_eq!(identity.name, "Test User");
        assert_eq!(identity.email, "test@example.com");
    }
}
