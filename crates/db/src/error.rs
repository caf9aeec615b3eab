use bugtracker_core::error::CoreError;

/// Error type for repository operations that enforce domain rules.
///
/// Plain reads return `sqlx::Error`; operations that validate tenant
/// membership, project-manager eligibility or row versions return this so
/// the caller can tell a rule violation from a storage failure.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
