use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use git2::{Blame, Oid};
use serde::{Deserialize, Serialize};

use super::git::GitRepo;
use super::{Result, VcsError};
use crate::range::DocumentLineRange;

const NOT_COMMITTED: &str = "Not Committed Yet";

/// A commit that last touched some of the blamed lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameCommit {
    pub sha: String,
    pub name: String,
    pub email: String,
    /// Committer time, seconds since the epoch.
    pub timestamp: i64,
    pub commit_message: String,
    /// 1-based line numbers attributed to this commit.
    pub blame_lines: Vec<usize>,
}

impl BlameCommit {
    pub fn is_committed(&self) -> bool {
        !self.sha.bytes().all(|b| b == b'0')
    }
}

impl GitRepo {
    /// Blame the lines of `range` in `relative_path` (relative to the work
    /// tree), grouped by commit in order of first appearance.
    ///
    /// Unsaved work-tree changes are taken into account; lines nobody has
    /// committed yet are attributed to the configured git user.
    pub fn blame_range(
        &self,
        relative_path: &Path,
        range: DocumentLineRange,
    ) -> Result<Vec<BlameCommit>> {
        let committed = self.repo.blame_file(relative_path, None).map_err(|e| {
            VcsError::Other(format!("failed to blame {}: {}", relative_path.display(), e))
        })?;

        let contents = self
            .workdir()
            .and_then(|dir| std::fs::read(dir.join(relative_path)).ok());
        let buffered = match contents {
            Some(contents) => Some(committed.blame_buffer(&contents).map_err(|e| {
                VcsError::Other(format!("failed to blame work tree changes: {}", e))
            })?),
            None => None,
        };

        self.group_lines(buffered.as_ref().unwrap_or(&committed), range)
    }

    fn group_lines(&self, blame: &Blame<'_>, range: DocumentLineRange) -> Result<Vec<BlameCommit>> {
        let mut commits: Vec<BlameCommit> = Vec::new();
        let mut by_oid: HashMap<Oid, usize> = HashMap::new();

        for line in range.from_index.saturating_add(1)..=range.to_index.saturating_add(1) {
            let Some(hunk) = blame.get_line(line) else {
                break;
            };
            let oid = hunk.final_commit_id();

            if let Some(&idx) = by_oid.get(&oid) {
                commits[idx].blame_lines.push(line);
                continue;
            }

            let mut commit = if oid.is_zero() {
                self.uncommitted()?
            } else {
                self.describe_commit(oid)?
            };
            commit.blame_lines.push(line);
            by_oid.insert(oid, commits.len());
            commits.push(commit);
        }

        Ok(commits)
    }

    fn describe_commit(&self, oid: Oid) -> Result<BlameCommit> {
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| VcsError::Other(format!("failed to find commit {}: {}", oid, e)))?;
        let author = commit.author();
        let timestamp = commit.committer().when().seconds();

        Ok(BlameCommit {
            sha: oid.to_string(),
            name: author.name().unwrap_or("").to_string(),
            email: author.email().unwrap_or("").to_string(),
            timestamp,
            commit_message: commit.summary().unwrap_or("").to_string(),
            blame_lines: Vec::new(),
        })
    }

    fn uncommitted(&self) -> Result<BlameCommit> {
        let identity = self.user_identity()?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Ok(BlameCommit {
            sha: Oid::zero().to_string(),
            name: identity.name,
            email: identity.email,
            timestamp,
            commit_message: NOT_COMMITTED.to_string(),
            blame_lines: Vec::new(),
        })
    }
}
