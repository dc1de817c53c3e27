//! Commit signature derivation for reconstructed history.

use chrono::{DateTime, Utc};
use git2::{Signature, Time};
use metarepo_core::CommitGroup;

use crate::error::Result;

/// A name/email pair used for git signatures; the run's configured
/// committer is one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Signature at the current real time; used for committers and for the
    /// sweep commit.
    pub fn signature_now(&self) -> Result<Signature<'static>> {
        Ok(Signature::now(&self.name, &self.email)?)
    }

    fn signature_at(&self, when: DateTime<Utc>) -> Result<Signature<'static>> {
        Ok(Signature::new(
            &self.name,
            &self.email,
            &Time::new(when.timestamp(), 0),
        )?)
    }
}

/// Author signature for a commit group: the synthetic identity backdated to
/// the group's day. With `hide_author` the identity is replaced by the
/// committer's while the synthetic date is kept, hiding *who* but not
/// *when*.
pub fn author_signature(
    group: &CommitGroup,
    committer: &Identity,
    hide_author: bool,
) -> Result<Signature<'static>> {
    let when = group.author_date();
    if hide_author {
        committer.signature_at(when)
    } else {
        Identity::new(&group.key.author_name, group.key.author_email()).signature_at(when)
    }
}
