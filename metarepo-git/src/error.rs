use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitError>;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("You need to specify a remote git repository")]
    MissingRemoteRepository,

    #[error("Push rejected by remote: {0}")]
    PushRejected(String),
}
