//! # metarepo-core
//!
//! Core library for metarepo - mirroring the metadata of a remote
//! configuration-management server into a version-controlled file tree.
//!
//! This crate provides the change-record model, the deterministic file
//! layout, the per-run change ledger, the persisted watermark and the
//! commit-group construction used to reconstruct an attributed history.

pub mod error;
pub mod history;
pub mod layout;
pub mod ledger;
pub mod models;
pub mod tree;
pub mod watermark;

pub use error::{Error, Result};
pub use history::build_commit_groups;
pub use ledger::ChangeLedger;
pub use models::{ChangeRecord, CommitGroup, GroupKey, UserRef};
pub use tree::WorkingTree;
pub use watermark::Watermark;
