use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// Throwaway repository with a configured user and an initial commit of
/// `README.md`. Removed on drop.
pub struct RepoGuard {
    _temp: TempDir,
    pub dir: PathBuf,
    pub repo: Repository,
}

impl RepoGuard {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dir = temp.path().to_path_buf();
        let repo = Repository::init(&dir).expect("failed to init repo");
        {
            let mut config = repo.config().expect("failed to open config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        let guard = Self {
            _temp: temp,
            dir,
            repo,
        };
        guard.commit_file("README.md", "hello\n", "init");
        guard
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    /// Write and commit a single file on the current branch.
    pub fn commit_file(&self, relative: &str, contents: &str, message: &str) -> Oid {
        self.write(relative, contents);

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(relative)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    pub fn head_commit_id(&self) -> Oid {
        self.repo.head().unwrap().peel_to_commit().unwrap().id()
    }

    pub fn branch(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo.branch(name, &head, false).unwrap();
    }

    /// Add `remote` and a remote-tracking branch for `name` at HEAD.
    pub fn remote_branch(&self, remote: &str, name: &str) {
        if self.repo.find_remote(remote).is_err() {
            self.repo
                .remote(remote, &format!("https://example.com/{}.git", remote))
                .unwrap();
        }
        self.repo
            .reference(
                &format!("refs/remotes/{}/{}", remote, name),
                self.head_commit_id(),
                true,
                "test remote branch",
            )
            .unwrap();
    }
}
