//! # metarepo-git
//!
//! The version-control side of metarepo: clone-or-init with branch
//! bootstrap, per-group attributed commits, the final sweep commit and the
//! push back to the remote mirror.

pub mod error;
pub mod repo;
pub mod signature;

pub use error::{GitError, Result};
pub use repo::{MirrorRepo, SshCredentials};
pub use signature::{author_signature, Identity};
