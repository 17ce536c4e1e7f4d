//! Asking the user what to do when a reference was captured on another
//! branch, and remembering the answer for the rest of the session.

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::vcs::GitRepo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchChoice {
    CheckoutOriginal,
    StayOnCurrent,
}

pub trait DifferentBranchUi {
    /// `None` means the prompt was dismissed.
    fn choose_different_branch_action(
        &self,
        current_ref: &str,
        original_branch: &str,
    ) -> impl Future<Output = Option<BranchChoice>> + Send;
}

/// Remembers one decision per `(current ref, original branch)` pair.
/// Dismissed prompts are not remembered.
pub struct MemoisedBranchChooser<U> {
    current_ref: String,
    ui: U,
    stored_choices: HashMap<String, BranchChoice>,
}

impl<U: DifferentBranchUi> MemoisedBranchChooser<U> {
    pub fn new(current_ref: impl Into<String>, ui: U) -> Self {
        Self {
            current_ref: current_ref.into(),
            ui,
            stored_choices: HashMap::new(),
        }
    }

    pub fn branch_pair_key(current_ref: &str, original_branch: &str) -> String {
        format!("{}|{}", current_ref, original_branch)
    }

    pub fn current_ref(&self) -> &str {
        &self.current_ref
    }

    pub async fn choose(&mut self, original_branch: &str) -> Option<BranchChoice> {
        let key = Self::branch_pair_key(&self.current_ref, original_branch);
        if let Some(choice) = self.stored_choices.get(&key) {
            return Some(*choice);
        }

        let choice = self
            .ui
            .choose_different_branch_action(&self.current_ref, original_branch)
            .await?;
        self.stored_choices.insert(key, choice);
        Some(choice)
    }
}

/// Offer to switch to the branch a reference was captured on.
///
/// Returns whether locating should go ahead: `false` only when the user
/// dismissed the prompt. A branch that exists nowhere locally leaves the
/// work tree alone and carries on with the current branch.
pub async fn handle_different_branch<U: DifferentBranchUi>(
    repo: &GitRepo,
    chooser: &mut MemoisedBranchChooser<U>,
    original_branch: &str,
) -> Result<bool> {
    let Some(ref_type) = repo.branch_type(original_branch)? else {
        log::warn!("branch {} not found locally or on any remote", original_branch);
        return Ok(true);
    };

    let branch_ref = GitRepo::original_branch_ref(original_branch, &ref_type);
    match chooser.choose(&branch_ref).await {
        Some(BranchChoice::CheckoutOriginal) => {
            repo.checkout(original_branch, &ref_type)?;
            log::info!("checked out {}", branch_ref);
            Ok(true)
        }
        Some(BranchChoice::StayOnCurrent) => Ok(true),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::test_utils::RepoGuard;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeUi {
        answer: Option<BranchChoice>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeUi {
        fn new(answer: Option<BranchChoice>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    answer,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl DifferentBranchUi for FakeUi {
        async fn choose_different_branch_action(
            &self,
            _current_ref: &str,
            _original_branch: &str,
        ) -> Option<BranchChoice> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    #[test]
    fn test_branch_pair_key() {
        assert_eq!(
            MemoisedBranchChooser::<FakeUi>::branch_pair_key("main", "dev"),
            "main|dev"
        );
    }

    #[tokio::test]
    async fn test_choice_is_memoised() {
        let (ui, calls) = FakeUi::new(Some(BranchChoice::StayOnCurrent));
        let mut chooser = MemoisedBranchChooser::new("main", ui);

        assert_eq!(chooser.choose("dev").await, Some(BranchChoice::StayOnCurrent));
        assert_eq!(chooser.choose("dev").await, Some(BranchChoice::StayOnCurrent));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_branch_asked_separately() {
        let (ui, calls) = FakeUi::new(Some(BranchChoice::CheckoutOriginal));
        let mut chooser = MemoisedBranchChooser::new("main", ui);

        chooser.choose("dev").await;
        chooser.choose("release").await;
        chooser.choose("dev").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dismissed_prompt_not_memoised() {
        let (ui, calls) = FakeUi::new(None);
        let mut chooser = MemoisedBranchChooser::new("main", ui);

        assert_eq!(chooser.choose("dev").await, None);
        assert_eq!(chooser.choose("dev").await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handle_checks_out_original_branch() {
        let guard = RepoGuard::new();
        guard.branch("feature");
        let repo = GitRepo::discover(&guard.dir).unwrap();
        let current = repo.current_ref().unwrap();

        let (ui, _) = FakeUi::new(Some(BranchChoice::CheckoutOriginal));
        let mut chooser = MemoisedBranchChooser::new(current, ui);

        assert!(handle_different_branch(&repo, &mut chooser, "feature").await.unwrap());
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("feature"));
    }

    #[tokio::test]
    async fn test_handle_stay_and_dismiss() {
        let guard = RepoGuard::new();
        guard.branch("feature");
        let repo = GitRepo::discover(&guard.dir).unwrap();
        let current = repo.current_ref().unwrap();

        let (ui, _) = FakeUi::new(Some(BranchChoice::StayOnCurrent));
        let mut chooser = MemoisedBranchChooser::new(current.clone(), ui);
        assert!(handle_different_branch(&repo, &mut chooser, "feature").await.unwrap());
        assert_eq!(repo.current_ref().unwrap(), current);

        let (ui, _) = FakeUi::new(None);
        let mut chooser = MemoisedBranchChooser::new(current, ui);
        assert!(!handle_different_branch(&repo, &mut chooser, "feature").await.unwrap());
    }

    #[tokio::test]
    async fn test_handle_remote_branch_uses_qualified_name() {
        let guard = RepoGuard::new();
        guard.remote_branch("origin", "review");
        let repo = GitRepo::discover(&guard.dir).unwrap();

        let (ui, calls) = FakeUi::new(Some(BranchChoice::StayOnCurrent));
        let mut chooser = MemoisedBranchChooser::new("main", ui);
        assert!(handle_different_branch(&repo, &mut chooser, "review").await.unwrap());

        // the remembered answer is keyed on the qualified name
        assert_eq!(chooser.choose("origin/review").await, Some(BranchChoice::StayOnCurrent));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handle_missing_branch_continues_without_asking() {
        let guard = RepoGuard::new();
        let repo = GitRepo::discover(&guard.dir).unwrap();

        let (ui, calls) = FakeUi::new(Some(BranchChoice::CheckoutOriginal));
        let mut chooser = MemoisedBranchChooser::new("main", ui);
        assert!(handle_different_branch(&repo, &mut chooser, "gone").await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
