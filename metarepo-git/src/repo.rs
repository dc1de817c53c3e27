//! Clone-or-init, attributed commits and push for the mirror repository.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, CertificateCheckStatus, Cred, FetchOptions, IndexAddOption, Oid, PushOptions,
    RemoteCallbacks, Repository,
};
use tracing::{info, trace};

use metarepo_core::CommitGroup;

use crate::error::{GitError, Result};
use crate::signature::{author_signature, Identity};

/// SSH key material for remote authentication. All fields optional; the
/// credential callback falls back to the SSH agent and then to default
/// credentials.
#[derive(Debug, Clone, Default)]
pub struct SshCredentials {
    pub public_key: Option<PathBuf>,
    pub private_key: Option<PathBuf>,
    pub passphrase: Option<String>,
}

/// The mirror repository checked out in the run's working tree.
pub struct MirrorRepo {
    repo: Repository,
    workdir: PathBuf,
    branch: String,
    ssh: SshCredentials,
}

impl MirrorRepo {
    /// Initialize the working tree from the remote: init, add origin, fetch
    /// and check out the branch, bootstrapping it with an initial commit
    /// when the remote does not have it yet.
    pub fn clone_or_init(
        url: &str,
        branch: &str,
        workdir: &Path,
        ssh: SshCredentials,
        committer: &Identity,
    ) -> Result<Self> {
        info!(url, branch, "Cloning remote repository");

        let repo = Repository::init(workdir)?;
        {
            let mut remote = match repo.find_remote("origin") {
                Ok(remote) => remote,
                Err(_) => repo.remote("origin", url)?,
            };
            let mut options = FetchOptions::new();
            options.remote_callbacks(remote_callbacks(&ssh));
            // Empty refspec list fetches the remote's configured refspecs.
            remote.fetch(&[] as &[&str], Some(&mut options), None)?;
        }

        let mirror = Self {
            repo,
            workdir: workdir.to_path_buf(),
            branch: branch.to_string(),
            ssh,
        };

        let remote_ref = format!("origin/{branch}");
        match mirror.repo.find_branch(&remote_ref, BranchType::Remote) {
            Ok(remote_branch) => {
                let commit = remote_branch.get().peel_to_commit()?;
                mirror.repo.branch(branch, &commit, true)?;
                mirror.checkout_branch()?;
            }
            Err(_) => {
                info!(branch, "Branch did not exist on remote, creating");
                mirror.bootstrap_branch(committer)?;
            }
        }

        Ok(mirror)
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Create one attributed commit containing exactly the group's files.
    pub fn commit_group(
        &self,
        group: &CommitGroup,
        committer: &Identity,
        hide_author: bool,
    ) -> Result<Oid> {
        let author = author_signature(group, committer, hide_author)?;
        let committer_signature = committer.signature_now()?;

        let mut index = self.repo.index()?;
        for file in &group.files {
            index.add_path(Path::new(file))?;
        }
        index.write()?;

        let oid = self.commit_index(&author, &committer_signature, &group.message())?;
        trace!(
            %oid,
            files = group.files.len(),
            author = %group.key.author_name,
            "Created commit"
        );
        Ok(oid)
    }

    /// The final sweep: stage everything still untracked or modified (the
    /// watermark file, exempt collections, anything orphaned by grouping)
    /// and commit as the run's own identity at the current real time.
    pub fn commit_all(&self, message: &str, committer: &Identity) -> Result<Oid> {
        let signature = committer.signature_now()?;

        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;

        let oid = self.commit_index(&signature, &signature, message)?;
        trace!(%oid, "Created sweep commit");
        Ok(oid)
    }

    /// Push HEAD to the remote branch.
    pub fn push(&self) -> Result<()> {
        info!(branch = %self.branch, "Pushing to remote repository");

        let mut remote = self.repo.find_remote("origin")?;
        let refspec = format!("HEAD:refs/heads/{}", self.branch);
        let rejection: RefCell<Option<String>> = RefCell::new(None);

        {
            let mut callbacks = remote_callbacks(&self.ssh);
            callbacks.push_update_reference(|_reference, status| {
                if let Some(message) = status {
                    *rejection.borrow_mut() = Some(message.to_string());
                }
                Ok(())
            });
            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote.push(&[refspec.as_str()], Some(&mut options))?;
        }

        if let Some(message) = rejection.into_inner() {
            return Err(GitError::PushRejected(message));
        }

        info!(branch = %self.branch, "Pushed to remote repository");
        Ok(())
    }

    fn commit_index(
        &self,
        author: &git2::Signature<'_>,
        committer: &git2::Signature<'_>,
        message: &str,
    ) -> Result<Oid> {
        let mut index = self.repo.index()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        Ok(self
            .repo
            .commit(Some("HEAD"), author, committer, message, &tree, &parents)?)
    }

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Seed an empty remote: placeholder README, initial commit, branch.
    fn bootstrap_branch(&self, committer: &Identity) -> Result<()> {
        fs::write(
            self.workdir.join("README.md"),
            "## Metadata mirror repository\n",
        )?;

        let signature = committer.signature_now()?;
        let mut index = self.repo.index()?;
        index.add_path(Path::new("README.md"))?;
        index.write()?;

        let oid = self.commit_index(&signature, &signature, "Initial commit")?;

        let head_branch = self.repo.head().ok();
        let already_on_branch = head_branch
            .as_ref()
            .and_then(|head| head.shorthand())
            .map(|name| name == self.branch)
            .unwrap_or(false);

        if !already_on_branch {
            let commit = self.repo.find_commit(oid)?;
            self.repo.branch(&self.branch, &commit, true)?;
            self.checkout_branch()?;
        }

        Ok(())
    }

    fn checkout_branch(&self) -> Result<()> {
        self.repo
            .set_head(&format!("refs/heads/{}", self.branch))?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(())
    }
}

/// Callbacks shared by fetch and push: configured SSH key first, then the
/// agent, then whatever default credentials apply. Certificate checks are
/// accepted, matching the trust model of a dedicated mirror job.
fn remote_callbacks(ssh: &SshCredentials) -> RemoteCallbacks<'static> {
    let ssh = ssh.clone();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, allowed| {
        let user = username_from_url.unwrap_or("git");
        if allowed.is_ssh_key() {
            if let Some(private_key) = &ssh.private_key {
                return Cred::ssh_key(
                    user,
                    ssh.public_key.as_deref(),
                    private_key,
                    ssh.passphrase.as_deref(),
                );
            }
            if let Ok(cred) = Cred::ssh_key_from_agent(user) {
                return Ok(cred);
            }
        }
        Cred::default()
    });
    callbacks.certificate_check(|_certificate, _host| Ok(CertificateCheckStatus::CertificateOk));
    callbacks
}
